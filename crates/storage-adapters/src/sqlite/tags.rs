use async_trait::async_trait;
use domains::{DomainResult, Tag, TagRepository};
use sqlx::sqlite::SqlitePool;

use super::db_err;

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    title: String,
    slug: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            title: row.title,
            slug: row.slug,
        }
    }
}

pub struct SqliteTagRepo {
    pool: SqlitePool,
}

impl SqliteTagRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for SqliteTagRepo {
    async fn find_by_slug(&self, slug: &str) -> DomainResult<Option<Tag>> {
        sqlx::query_as::<_, TagRow>("SELECT id, title, slug FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Tag::from))
            .map_err(db_err)
    }

    /// Tags of one post, in the order they were first created.
    async fn for_post(&self, post_id: i64) -> DomainResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT t.id, t.title, t.slug FROM tags t \
             JOIN post_tags pt ON pt.tag_id = t.id \
             WHERE pt.post_id = ? ORDER BY t.id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, title, slug FROM tags ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }
}
