// Comment service - core business logic for the commenting system.
//
// This service handles:
// - Intake of reader submissions (validate -> rate limit -> thread check -> insert)
// - The public read path (approved comments for one post)
// - Moderation (list everything, approve, delete)
//
// NO HTTP or SQL dependencies here - just pure domain logic over a store port.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::comment_input::{hash_ip, validate_and_sanitize};
use super::comment_models::{Comment, CommentConfig, CommentSubmission, PublicComment, SanitizedComment};

/// The moderation view is bounded to the most recent rows.
pub const MODERATION_QUEUE_LIMIT: u32 = 500;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} too long (max {max} characters)")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Parent comment not found")]
    ParentNotFound,

    #[error("Too many comments. Please wait a moment before posting again.")]
    RateLimited,

    #[error("Comment not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting comments.
///
/// Every statement is individually atomic; there are no multi-statement
/// transactions. The rate-limit check-then-insert sequence is therefore a
/// soft limit under concurrent bursts, which is tolerated.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Insert a new comment row. Returns the generated id.
    async fn insert(
        &self,
        record: &SanitizedComment,
        ip_hash: &str,
        approved: bool,
        created_at: DateTime<Utc>,
    ) -> Result<i64, CommentError>;

    /// Whether a comment with this id exists under the given post.
    async fn parent_exists(&self, parent_id: i64, post_slug: &str) -> Result<bool, CommentError>;

    /// How many comments this source stored after `since`.
    async fn count_recent_from(
        &self,
        ip_hash: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, CommentError>;

    /// Approved comments for one post, oldest first.
    async fn list_approved(&self, post_slug: &str) -> Result<Vec<PublicComment>, CommentError>;

    /// All comments regardless of approval, newest first, bounded.
    async fn list_all(&self, limit: u32) -> Result<Vec<Comment>, CommentError>;

    /// Mark one comment approved. `NotFound` if the id does not exist.
    async fn approve(&self, id: i64) -> Result<(), CommentError>;

    /// Hard-delete one comment. `NotFound` if the id does not exist.
    /// Children are not cascaded; orphaned replies stay addressable.
    async fn delete(&self, id: i64) -> Result<(), CommentError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Comment service wiring validation, rate limiting and threading rules
/// around a [`CommentStore`].
pub struct CommentService<S: CommentStore> {
    store: S,
    config: CommentConfig,
}

impl<S: CommentStore> CommentService<S> {
    pub fn new(store: S, config: CommentConfig) -> Self {
        Self { store, config }
    }

    /// Accept a reader submission.
    ///
    /// Validation short-circuits before any storage access. The rate limit
    /// and the parent check are both re-derived from the store on every
    /// call - no in-process state survives between requests.
    pub async fn submit(
        &self,
        submission: CommentSubmission,
        client_ip: &str,
    ) -> Result<i64, CommentError> {
        let record = validate_and_sanitize(&submission)?;

        let ip_hash = hash_ip(client_ip);
        let window_start =
            Utc::now() - Duration::seconds(self.config.rate_limit_window_secs as i64);
        let recent = self.store.count_recent_from(&ip_hash, window_start).await?;
        if recent >= self.config.max_comments_per_window {
            return Err(CommentError::RateLimited);
        }

        // Replies must point at an existing comment under the same post.
        if let Some(parent_id) = record.parent_id {
            if !self.store.parent_exists(parent_id, &record.post_slug).await? {
                return Err(CommentError::ParentNotFound);
            }
        }

        self.store
            .insert(&record, &ip_hash, self.config.auto_approve, Utc::now())
            .await
    }

    /// Approved comments for one post, oldest first. The caller rebuilds
    /// the reply tree from the flat `(id, parent_id)` pairs.
    pub async fn comments_for_post(
        &self,
        post_slug: &str,
    ) -> Result<Vec<PublicComment>, CommentError> {
        self.store.list_approved(post_slug).await
    }

    /// Everything, newest first, for the moderation view.
    pub async fn moderation_queue(&self) -> Result<Vec<Comment>, CommentError> {
        self.store.list_all(MODERATION_QUEUE_LIMIT).await
    }

    pub async fn approve(&self, id: i64) -> Result<(), CommentError> {
        self.store.approve(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), CommentError> {
        self.store.delete(id).await
    }
}
