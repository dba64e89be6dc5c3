use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Comment, CommentRepository, DomainResult, NewComment};
use sqlx::sqlite::SqlitePool;

use super::db_err;

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    name: String,
    email: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            name: row.name,
            email: row.email,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

pub struct SqliteCommentRepo {
    pool: SqlitePool,
}

impl SqliteCommentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepo {
    async fn create(&self, comment: NewComment) -> DomainResult<Comment> {
        sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (post_id, name, email, content, created_at) VALUES (?, ?, ?, ?, ?) \
             RETURNING id, post_id, name, email, content, created_at",
        )
        .bind(comment.post_id)
        .bind(comment.name)
        .bind(comment.email)
        .bind(comment.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map(Comment::from)
        .map_err(db_err)
    }

    async fn for_post(&self, post_id: i64) -> DomainResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, name, email, content, created_at FROM comments \
             WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
