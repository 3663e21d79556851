// SQLite-backed comment store.
//
// Single table:
// - comments: one row per comment; `approved` gates public visibility and
//   `ip_hash` only exists for the rate-limit window query.
//
// The table layout is the durable on-disk contract shared with the blog's
// deployment tooling - keep it stable.

use crate::core::comments::{
    Comment, CommentError, CommentStore, PublicComment, SanitizedComment,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteCommentStore {
    pool: Pool<Sqlite>,
}

impl SqliteCommentStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_slug TEXT NOT NULL,
                parent_id INTEGER,
                name TEXT NOT NULL,
                email TEXT,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                approved INTEGER NOT NULL DEFAULT 1,
                ip_hash TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_comments_post_approved
                ON comments(post_slug, approved, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_comments_ip_hash
                ON comments(ip_hash, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn parse_created_at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_comment(row: &SqliteRow) -> Comment {
        let created_at_str: String = row.get("created_at");
        Comment {
            id: row.get("id"),
            post_slug: row.get("post_slug"),
            parent_id: row.get("parent_id"),
            name: row.get("name"),
            email: row.get("email"),
            content: row.get("content"),
            created_at: Self::parse_created_at(&created_at_str),
            approved: row.get("approved"),
            ip_hash: row.get("ip_hash"),
        }
    }
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn insert(
        &self,
        record: &SanitizedComment,
        ip_hash: &str,
        approved: bool,
        created_at: DateTime<Utc>,
    ) -> Result<i64, CommentError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_slug, parent_id, name, email, content, created_at, approved, ip_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.post_slug)
        .bind(record.parent_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.content)
        .bind(created_at.to_rfc3339())
        .bind(approved)
        .bind(ip_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| CommentError::Storage(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn parent_exists(&self, parent_id: i64, post_slug: &str) -> Result<bool, CommentError> {
        let row = sqlx::query("SELECT id FROM comments WHERE id = ? AND post_slug = ?")
            .bind(parent_id)
            .bind(post_slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CommentError::Storage(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn count_recent_from(
        &self,
        ip_hash: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, CommentError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM comments WHERE ip_hash = ? AND created_at > ?",
        )
        .bind(ip_hash)
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CommentError::Storage(e.to_string()))?;

        let count: i64 = row.get("count");
        Ok(count as u32)
    }

    async fn list_approved(&self, post_slug: &str) -> Result<Vec<PublicComment>, CommentError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_slug, parent_id, name, content, created_at
            FROM comments
            WHERE post_slug = ? AND approved = 1
            ORDER BY created_at ASC
            "#,
        )
        .bind(post_slug)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CommentError::Storage(e.to_string()))?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at_str: String = row.get("created_at");
            comments.push(PublicComment {
                id: row.get("id"),
                post_slug: row.get("post_slug"),
                parent_id: row.get("parent_id"),
                name: row.get("name"),
                content: row.get("content"),
                created_at: Self::parse_created_at(&created_at_str),
            });
        }
        Ok(comments)
    }

    async fn list_all(&self, limit: u32) -> Result<Vec<Comment>, CommentError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_slug, parent_id, name, email, content, created_at, approved, ip_hash
            FROM comments
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CommentError::Storage(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_comment).collect())
    }

    async fn approve(&self, id: i64) -> Result<(), CommentError> {
        let result = sqlx::query("UPDATE comments SET approved = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CommentError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CommentError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CommentError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CommentError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CommentError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn temp_store() -> (tempfile::TempDir, SqliteCommentStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.db");
        let store = SqliteCommentStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    fn record(post: &str, content: &str) -> SanitizedComment {
        SanitizedComment {
            post_slug: post.to_string(),
            name: "Ann".to_string(),
            email: None,
            content: content.to_string(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();

        let first = store
            .insert(&record("slug", "one"), "aaaa", true, now)
            .await
            .unwrap();
        let second = store
            .insert(&record("slug", "two"), "aaaa", true, now)
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn list_approved_is_scoped_filtered_and_oldest_first() {
        let (_dir, store) = temp_store().await;
        let base = Utc::now();

        store
            .insert(&record("slug", "newest"), "aaaa", true, base)
            .await
            .unwrap();
        store
            .insert(
                &record("slug", "oldest"),
                "aaaa",
                true,
                base - Duration::seconds(120),
            )
            .await
            .unwrap();
        store
            .insert(
                &record("slug", "hidden"),
                "aaaa",
                false,
                base - Duration::seconds(60),
            )
            .await
            .unwrap();
        store
            .insert(&record("other-post", "elsewhere"), "aaaa", true, base)
            .await
            .unwrap();

        let listed = store.list_approved("slug").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "oldest");
        assert_eq!(listed[1].content, "newest");
    }

    #[tokio::test]
    async fn list_all_is_newest_first_and_bounded() {
        let (_dir, store) = temp_store().await;
        let base = Utc::now();

        for i in 0..5i64 {
            store
                .insert(
                    &record("slug", &format!("comment {i}")),
                    "aaaa",
                    i % 2 == 0,
                    base + Duration::seconds(i),
                )
                .await
                .unwrap();
        }

        let all = store.list_all(3).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "comment 4");
        assert_eq!(all[1].content, "comment 3");
        // Hidden rows are part of the moderation view.
        assert!(!all[1].approved);
    }

    #[tokio::test]
    async fn parent_exists_requires_matching_post() {
        let (_dir, store) = temp_store().await;

        let id = store
            .insert(&record("post-a", "root"), "aaaa", true, Utc::now())
            .await
            .unwrap();

        assert!(store.parent_exists(id, "post-a").await.unwrap());
        assert!(!store.parent_exists(id, "post-b").await.unwrap());
        assert!(!store.parent_exists(id + 1, "post-a").await.unwrap());
    }

    #[tokio::test]
    async fn count_recent_respects_the_window() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();

        store
            .insert(&record("slug", "fresh"), "aaaa", true, now)
            .await
            .unwrap();
        store
            .insert(
                &record("slug", "stale"),
                "aaaa",
                true,
                now - Duration::seconds(120),
            )
            .await
            .unwrap();
        store
            .insert(&record("slug", "other source"), "bbbb", true, now)
            .await
            .unwrap();

        let count = store
            .count_recent_from("aaaa", now - Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn approve_flips_visibility_and_reports_not_found() {
        let (_dir, store) = temp_store().await;

        assert!(matches!(
            store.approve(999).await.unwrap_err(),
            CommentError::NotFound
        ));

        let id = store
            .insert(&record("slug", "pending"), "aaaa", false, Utc::now())
            .await
            .unwrap();
        assert!(store.list_approved("slug").await.unwrap().is_empty());

        store.approve(id).await.unwrap();
        assert_eq!(store.list_approved("slug").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_permanent_and_keeps_children() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();

        let parent = store
            .insert(&record("slug", "parent"), "aaaa", true, now)
            .await
            .unwrap();
        let mut reply = record("slug", "reply");
        reply.parent_id = Some(parent);
        store
            .insert(&reply, "bbbb", true, now + Duration::seconds(1))
            .await
            .unwrap();

        store.delete(parent).await.unwrap();
        assert!(matches!(
            store.delete(parent).await.unwrap_err(),
            CommentError::NotFound
        ));

        // The orphaned reply survives, parent reference dangling.
        let remaining = store.list_approved("slug").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].parent_id, Some(parent));
        assert!(store.list_all(10).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn optional_columns_round_trip() {
        let (_dir, store) = temp_store().await;

        let mut with_email = record("slug", "hello");
        with_email.email = Some("a@b.c".to_string());
        store
            .insert(&with_email, "aaaa", true, Utc::now())
            .await
            .unwrap();

        let all = store.list_all(10).await.unwrap();
        assert_eq!(all[0].email.as_deref(), Some("a@b.c"));
        assert_eq!(all[0].parent_id, None);
        assert_eq!(all[0].ip_hash, "aaaa");
    }

    #[tokio::test]
    async fn reopening_the_same_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("comments.db");
        let url = path.to_str().unwrap().to_string();

        let store = SqliteCommentStore::new(&url).await.unwrap();
        store
            .insert(&record("slug", "durable"), "aaaa", true, Utc::now())
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteCommentStore::new(&url).await.unwrap();
        let listed = reopened.list_approved("slug").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "durable");
    }
}
