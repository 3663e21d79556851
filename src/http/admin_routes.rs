// Admin moderation endpoints, gated by the identity allow-list.
//
// Every route here goes through the authenticate middleware: bearer token
// -> identity provider -> allow-list. The verified username rides along in
// request extensions so actions can be attributed in the logs.

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::core::auth::AuthError;
use crate::http::app_state::AppState;
use crate::http::response::ApiError;

/// The verified provider username attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct Moderator(pub String);

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/comments", get(list_all_comments))
        .route("/admin/comments/{id}/approve", post(approve_comment))
        .route("/admin/comments/{id}", delete(delete_comment))
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}

/// Resolve the bearer credential once per request.
async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&req)?;
    let username = state.auth.authorize(&token).await?;

    req.extensions_mut().insert(Moderator(username));
    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Result<String, AuthError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err(AuthError::MissingCredential),
    };

    let value = header
        .to_str()
        .map_err(|_| AuthError::MissingCredential)?
        .split_whitespace()
        .collect::<Vec<_>>();

    if value.len() != 2 || value[0] != "Bearer" {
        return Err(AuthError::MissingCredential);
    }

    Ok(value[1].to_string())
}

/// GET /admin/comments - everything, newest first, pending included.
async fn list_all_comments(
    State(state): State<AppState>,
    Extension(moderator): Extension<Moderator>,
) -> Result<Json<Value>, ApiError> {
    let service = state.comment_service()?;
    let comments = service.moderation_queue().await?;

    tracing::debug!("moderation list requested by {}", moderator.0);
    Ok(Json(json!({ "success": true, "comments": comments })))
}

/// POST /admin/comments/{id}/approve
async fn approve_comment(
    State(state): State<AppState>,
    Extension(moderator): Extension<Moderator>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_comment_id(&id)?;
    let service = state.comment_service()?;
    service.approve(id).await?;

    tracing::info!("comment {} approved by {}", id, moderator.0);
    Ok(Json(json!({
        "success": true,
        "message": "Comment approved successfully"
    })))
}

/// DELETE /admin/comments/{id} - hard delete, replies are left in place.
async fn delete_comment(
    State(state): State<AppState>,
    Extension(moderator): Extension<Moderator>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_comment_id(&id)?;
    let service = state.comment_service()?;
    service.delete(id).await?;

    tracing::info!("comment {} deleted by {}", id, moderator.0);
    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}

/// Route ids must be positive integers.
fn parse_comment_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid comment ID")),
    }
}
