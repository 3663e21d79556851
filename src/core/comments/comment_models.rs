// Comment domain models - data structures for the commenting system.
//
// These are pure domain types with no HTTP or SQL dependencies.
// The http layer serializes them straight into response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored comment, as seen by moderators.
///
/// Includes everything the row carries: the optional email and the
/// anonymized ip_hash are only ever exposed on the admin path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_slug: String,
    pub parent_id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
    pub ip_hash: String,
}

/// The public projection of a comment.
///
/// No email, no ip_hash, no approved flag - readers only ever see rows
/// that are already approved. Replies reference their parent by id; a
/// deleted parent leaves the reference dangling and the renderer copes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicComment {
    pub id: i64,
    pub post_slug: String,
    pub parent_id: Option<i64>,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A raw reader submission, exactly as it arrives on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentSubmission {
    pub post: String,
    pub name: String,
    pub email: Option<String>,
    pub content: String,
    pub parent_id: Option<i64>,
}

/// A submission that passed validation and had its strings escaped.
/// Only this type ever reaches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedComment {
    pub post_slug: String,
    pub name: String,
    pub email: Option<String>,
    pub content: String,
    pub parent_id: Option<i64>,
}

/// Configuration for comment intake behavior.
#[derive(Debug, Clone)]
pub struct CommentConfig {
    /// Whether new comments go live immediately or wait for a moderator.
    pub auto_approve: bool,
    /// Maximum comments allowed per source in the rate limit window.
    pub max_comments_per_window: u32,
    /// Rate limit window in seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            auto_approve: true,           // current policy: publish on arrival
            max_comments_per_window: 3,   // 3 comments...
            rate_limit_window_secs: 60,   // ...per minute per source
        }
    }
}
