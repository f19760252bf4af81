use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use faultline_core::{RequestContext, ViewContext};

/// Build a `RequestContext` from request parts and the peer address
pub fn context_for(request: &Request) -> RequestContext {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    RequestContext {
        path: Some(request.uri().path().to_owned()),
        method: Some(request.method().as_str().to_owned()),
        headers: request.headers().clone(),
        remote_addr,
        caller: request.extensions().get().cloned(),
    }
}

/// Middleware that captures the request context just before handlers run
///
/// Runs innermost, so identity placed in extensions by outer auth layers
/// is visible. The context is inserted into the request for handlers and
/// copied onto the response for the envelope middleware.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let context = context_for(&request);
    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(context);
    response
}

/// Route middleware naming the view that serves a route
///
/// ```ignore
/// Router::new().route(
///     "/posts",
///     post(create_post).route_layer(from_fn_with_state(ViewContext::new("posts", "create"), record_view)),
/// )
/// ```
pub async fn record_view(State(view): State<ViewContext>, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(view.clone());

    let mut response = next.run(request).await;
    if response.extensions().get::<ViewContext>().is_none() {
        response.extensions_mut().insert(view);
    }
    response
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use faultline_core::CallerIdentity;

    use super::*;

    #[test]
    fn context_reads_peer_and_caller() {
        let mut request = Request::builder()
            .method("PUT")
            .uri("/api/posts/7/?draft=1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 5555))));
        request.extensions_mut().insert(CallerIdentity::new("usr_2"));

        let context = context_for(&request);
        assert_eq!(context.path.as_deref(), Some("/api/posts/7/"));
        assert_eq!(context.method.as_deref(), Some("PUT"));
        assert_eq!(context.client_ip().as_deref(), Some("192.0.2.4"));
        assert_eq!(context.caller.map(|c| c.id), Some("usr_2".to_owned()));
    }

    #[test]
    fn context_without_peer_has_no_ip() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(context_for(&request).client_ip().is_none());
    }
}
