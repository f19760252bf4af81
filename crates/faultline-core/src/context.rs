use std::net::IpAddr;

use http::HeaderMap;

use crate::client_ip;

/// Ambient request data the pipeline formats and logs
///
/// Built once per request by the transport layer
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request path, without query string
    pub path: Option<String>,
    /// HTTP method
    pub method: Option<String>,
    /// Raw request headers
    pub headers: HeaderMap,
    /// Transport-level peer address
    pub remote_addr: Option<IpAddr>,
    /// Authenticated caller, if any
    pub caller: Option<CallerIdentity>,
}

impl RequestContext {
    /// Context with nothing known about the request
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a context from HTTP request parts
    pub fn from_parts(parts: &http::request::Parts, remote_addr: Option<IpAddr>) -> Self {
        Self {
            path: Some(parts.uri.path().to_owned()),
            method: Some(parts.method.as_str().to_owned()),
            headers: parts.headers.clone(),
            remote_addr,
            caller: parts.extensions.get::<CallerIdentity>().cloned(),
        }
    }

    /// Client IP, preferring the forwarded-for chain
    pub fn client_ip(&self) -> Option<String> {
        client_ip::extract(&self.headers, self.remote_addr)
    }
}

/// Authenticated caller placed in request extensions by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Stable caller identifier (user ID, API key ID)
    pub id: String,
    /// Human-readable name for logs
    pub display_name: Option<String>,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    /// Label used in log records
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Handler that was serving the request when it failed
///
/// Used for log enrichment only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewContext {
    /// Handler or resource name (e.g. `posts`)
    pub name: Option<String>,
    /// Action within the handler (e.g. `create`, `retrieve`)
    pub action: Option<String>,
}

impl ViewContext {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            action: Some(action.into()),
        }
    }

    /// `name.action`, or whichever half is known
    pub fn qualified(&self) -> Option<String> {
        match (&self.name, &self.action) {
            (Some(name), Some(action)) => Some(format!("{name}.{action}")),
            (Some(name), None) => Some(name.clone()),
            (None, Some(action)) => Some(action.clone()),
            (None, None) => None,
        }
    }
}
