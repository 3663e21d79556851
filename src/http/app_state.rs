// Shared state handed to every handler. Cheap to clone; axum clones it
// per request.

use std::sync::Arc;

use crate::core::auth::AuthService;
use crate::core::comments::CommentService;
use crate::http::response::ApiError;
use crate::infra::auth::GithubIdentityClient;
use crate::infra::comments::SqliteCommentStore;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the store failed to come up. Handlers degrade to an
    /// explicit 503 payload (or an empty public listing) instead of
    /// taking the process down.
    pub comments: Option<Arc<CommentService<SqliteCommentStore>>>,
    pub auth: Arc<AuthService<GithubIdentityClient>>,
}

impl AppState {
    pub fn comment_service(
        &self,
    ) -> Result<&Arc<CommentService<SqliteCommentStore>>, ApiError> {
        self.comments.as_ref().ok_or_else(ApiError::store_unavailable)
    }
}
