// Public endpoints: read approved comments for a post, submit a new one.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::comments::CommentSubmission;
use crate::http::app_state::AppState;
use crate::http::response::ApiError;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/comments", get(list_comments).post(post_comment))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    post: Option<String>,
}

/// GET /comments?post=<slug> - approved comments for a post, oldest first.
/// The client rebuilds the reply tree from the flat parent_id references.
async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let post_slug = params
        .post
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing post parameter"))?;

    // The blog still renders when the store isn't provisioned; this path
    // degrades to an empty list with a note instead of failing the page.
    let service = match &state.comments {
        Some(service) => service,
        None => {
            return Ok(Json(json!({
                "comments": [],
                "message": "Comment storage is not configured yet. Comments will appear once it is set up."
            })))
        }
    };

    let comments = service.comments_for_post(post_slug).await?;
    Ok(Json(json!({ "comments": comments })))
}

/// POST /comments - accept a reader submission.
async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<CommentSubmission>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let service = state.comment_service()?;

    let client_ip = client_ip(&headers);
    let id = service.submit(submission, &client_ip).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Comment posted successfully",
            "commentId": id
        })),
    ))
}

/// Best-effort requester address for rate limiting: the CDN header when
/// present, else the first forwarded hop, else a fixed placeholder.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(first) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_the_cdn_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", "203.0.113.7".parse().unwrap());
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn client_ip_falls_back_to_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.1");
    }

    #[test]
    fn client_ip_defaults_when_nothing_is_present() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
