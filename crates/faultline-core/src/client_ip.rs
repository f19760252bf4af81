use std::net::IpAddr;

use http::HeaderMap;

/// Derive the caller's IP address
///
/// Takes the first entry of `X-Forwarded-For` when present and non-empty,
/// otherwise the transport peer address. Never fails; returns `None` when
/// neither source is available.
pub fn extract(headers: &HeaderMap, remote_addr: Option<IpAddr>) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
        && !first.trim().is_empty()
    {
        return Some(first.trim().to_owned());
    }

    remote_addr.map(|addr| addr.to_string())
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn headers(forwarded: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("x-forwarded-for", HeaderValue::from_str(forwarded).unwrap());
        map
    }

    #[test]
    fn first_forwarded_address_wins() {
        let ip = extract(&headers("198.51.100.7, 10.0.0.1"), Some(IpAddr::from([127, 0, 0, 1])));
        assert_eq!(ip.as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn falls_back_to_remote_addr() {
        let ip = extract(&HeaderMap::new(), Some(IpAddr::from([192, 0, 2, 4])));
        assert_eq!(ip.as_deref(), Some("192.0.2.4"));
    }

    #[test]
    fn blank_forwarded_header_falls_back() {
        let ip = extract(&headers(" , 10.0.0.1"), Some(IpAddr::from([192, 0, 2, 4])));
        assert_eq!(ip.as_deref(), Some("192.0.2.4"));
    }

    #[test]
    fn nothing_known_yields_none() {
        assert_eq!(extract(&HeaderMap::new(), None), None);
    }
}
