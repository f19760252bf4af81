//! Demo blog API whose handlers raise every kind of failure

use axum::extract::{Path, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use faultline_core::{CallerIdentity, FailureTag, RaisedFailure, ViewContext};
use faultline_server::{Failure, record_view};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Routes exercised by the integration tests
pub fn routes() -> Router {
    Router::new()
        .route(
            "/api/posts",
            post(create_post).route_layer(from_fn_with_state(ViewContext::new("posts", "create"), record_view)),
        )
        .route(
            "/api/posts/{id}",
            get(get_post)
                .delete(delete_post)
                .route_layer(from_fn_with_state(ViewContext::new("posts", "detail"), record_view)),
        )
        .route("/api/posts/{id}/publish", post(publish_post))
        .route("/api/comments", post(create_comment))
        .route("/api/me", get(me))
        .route("/api/login", post(login))
        .route("/api/search", get(search))
        .route("/api/feed", get(feed))
        .route("/api/stats", get(stats))
        .route("/api/crash", get(crash))
        .route("/api/upload", post(upload))
        .route("/api/legacy", get(legacy))
        .route("/api/drafts", get(drafts))
}

async fn create_post(Json(post): Json<NewPost>) -> Result<(StatusCode, Json<Value>), Failure> {
    if post.title.trim().is_empty() {
        return Err(RaisedFailure::validation(json!({"title": ["This field may not be blank."]})).into());
    }
    if post.slug.as_deref() == Some("hello-world") {
        return Err(RaisedFailure::integrity(
            "duplicate key value violates unique constraint \"blog_post_slug_key\"",
        )
        .into());
    }
    Ok((StatusCode::CREATED, Json(json!({"id": 2, "title": post.title}))))
}

async fn get_post(Path(id): Path<u64>) -> Result<Json<Value>, Failure> {
    if id == 1 {
        return Ok(Json(json!({"id": 1, "title": "Hello"})));
    }
    Err(RaisedFailure::not_found().with_detail("Post not found").into())
}

async fn delete_post(Path(_id): Path<u64>) -> Result<StatusCode, Failure> {
    Err(RaisedFailure::permission_denied().into())
}

async fn publish_post(Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    let failure = RaisedFailure::business_rule(format!("Post {id} is already published"))
        .with_code("already_published")
        .with_status(409);
    Err(Failure::from(failure).in_view(ViewContext::new("posts", "publish")))
}

async fn create_comment() -> Result<StatusCode, Failure> {
    Err(RaisedFailure::integrity("insert on table \"blog_comment\" violates constraint")
        .with_sqlstate("23503")
        .into())
}

async fn me() -> Result<Json<Value>, Failure> {
    Err(RaisedFailure::not_authenticated().into())
}

async fn login() -> Result<Json<Value>, Failure> {
    Err(RaisedFailure::authentication_failed().into())
}

async fn search() -> Result<Json<Value>, Failure> {
    Err(RaisedFailure::throttled(Some(30)).into())
}

async fn feed() -> Result<Json<Value>, Failure> {
    Err(RaisedFailure::throttled(None).into())
}

async fn stats() -> Result<Json<Value>, Failure> {
    Err(RaisedFailure::unrecognized("ZeroDivisionError", "division by zero in stats aggregation").into())
}

async fn crash() -> Json<Value> {
    panic!("stats cache poisoned")
}

/// Framework-style answer that bypasses the failure type
async fn upload() -> impl IntoResponse {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
}

/// Upstream limiter answering on its own
async fn legacy() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("retry-after", HeaderValue::from_static("7"));
    (StatusCode::TOO_MANY_REQUESTS, headers, "slow down")
}

/// Domain denial that is also a business rule
async fn drafts() -> Result<Json<Value>, Failure> {
    let failure = RaisedFailure::new("DraftAccessError", FailureTag::BusinessRule)
        .also(FailureTag::PermissionDenied)
        .with_detail("Drafts are visible to their author only");
    Err(failure.into())
}

/// Authenticates callers presenting `x-user-id`
pub async fn header_auth(mut request: Request, next: Next) -> Response {
    let caller = request
        .headers()
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(CallerIdentity::new);

    if let Some(caller) = caller {
        request.extensions_mut().insert(caller);
    }
    next.run(request).await
}
