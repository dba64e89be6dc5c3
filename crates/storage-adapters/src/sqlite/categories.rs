use async_trait::async_trait;
use domains::{Category, CategoryRepository, DomainResult};
use sqlx::sqlite::SqlitePool;

use super::db_err;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    title: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            title: row.title,
            slug: row.slug,
        }
    }
}

pub struct SqliteCategoryRepo {
    pool: SqlitePool,
}

impl SqliteCategoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepo {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Category>> {
        sqlx::query_as::<_, CategoryRow>("SELECT id, title, slug FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Category::from))
            .map_err(db_err)
    }

    async fn list(&self) -> DomainResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, title, slug FROM categories ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_or_create(&self, title: &str, slug: &str) -> DomainResult<Category> {
        sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (title, slug) VALUES (?, ?) \
             ON CONFLICT (slug) DO UPDATE SET slug = excluded.slug \
             RETURNING id, title, slug",
        )
        .bind(title)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map(Category::from)
        .map_err(db_err)
    }
}
