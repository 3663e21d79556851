// This is the entry point of the blog comments backend.
//
// **Architecture Overview:**
// - `core/` = Business logic (domain types, validation, ports)
// - `infra/` = Implementations of core traits (SQLite store, identity API)
// - `http/` = HTTP adapters (axum routes, error mapping)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Assemble the router
// 4. Serve

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::auth::AuthService;
use crate::core::comments::{CommentConfig, CommentService};
use crate::http::{admin_routes, public_routes, AppState};
use crate::infra::auth::GithubIdentityClient;
use crate::infra::comments::SqliteCommentStore;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

fn comment_config_from_env() -> CommentConfig {
    let mut config = CommentConfig::default();

    if let Some(auto_approve) = std::env::var("AUTO_APPROVE_COMMENTS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.auto_approve = auto_approve;
    }
    if let Some(max) = std::env::var("COMMENT_RATE_LIMIT_MAX")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.max_comments_per_window = max;
    }
    if let Some(window) = std::env::var("COMMENT_RATE_LIMIT_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.rate_limit_window_secs = window;
    }

    config
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Keep the runtime database in a dedicated folder so the repo root stays tidy.
    let db_path = std::env::var("COMMENTS_DB").unwrap_or_else(|_| "data/comments.db".to_string());

    // A store that fails to come up leaves the API serving explicit 503s
    // instead of taking the process down with it.
    let comments = match SqliteCommentStore::new(&db_path).await {
        Ok(store) => Some(Arc::new(CommentService::new(
            store,
            comment_config_from_env(),
        ))),
        Err(e) => {
            tracing::error!("Comment store unavailable at {}: {:#}", db_path, e);
            None
        }
    };

    // Moderator allow-list, handed to the auth service as an explicit value.
    let allowed_users: Vec<String> = std::env::var("ADMIN_ALLOWED_USERS")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    if allowed_users.is_empty() {
        tracing::warn!("ADMIN_ALLOWED_USERS is empty - any verified identity may moderate");
    }

    let github_api_url =
        std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string());
    let identity_client =
        GithubIdentityClient::new(github_api_url).expect("Failed to create identity client");
    let auth = Arc::new(AuthService::new(identity_client, allowed_users));

    let state = AppState { comments, auth };

    // The blog frontend lives on a different origin; every response,
    // errors and preflights included, carries permissive CORS headers.
    let app = axum::Router::new()
        .merge(public_routes())
        .merge(admin_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a number");

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind listener");

    tracing::info!("Listening on {port}");
    axum::serve(listener, app).await.expect("Server error");
}
