use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    slugify, DomainError, DomainResult, NewUser, Page, PageRequest, ProfileChanges, User,
    UserProfile, UserRepository,
};
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;

use super::db_err;

const PROFILE_COLUMNS: &str = "SELECT p.id, p.user_id, u.username, p.slug, p.full_name, p.bio \
     FROM user_profiles p JOIN users u ON u.id = p.user_id";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    user_id: i64,
    username: String,
    slug: String,
    full_name: String,
    bio: String,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            slug: row.slug,
            full_name: row.full_name,
            bio: row.bio,
        }
    }
}

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn profile_where(&self, clause: &str, key: ProfileKey<'_>) -> DomainResult<Option<UserProfile>> {
        let sql = format!("{PROFILE_COLUMNS} WHERE {clause}");
        let query = sqlx::query_as::<_, ProfileRow>(&sql);
        let query = match key {
            ProfileKey::Id(id) => query.bind(id),
            ProfileKey::Slug(slug) => query.bind(slug),
        };
        query
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(UserProfile::from))
            .map_err(db_err)
    }
}

enum ProfileKey<'a> {
    Id(i64),
    Slug(&'a str),
}

/// Picks a free profile slug: the slugified username, or a suffixed variant.
async fn free_profile_slug(conn: &mut SqliteConnection, username: &str, user_id: i64) -> Result<String, sqlx::Error> {
    let base = slugify(username);
    if base.is_empty() {
        return Ok(format!("user-{user_id}"));
    }
    let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_profiles WHERE slug = ?)")
        .bind(&base)
        .fetch_one(&mut *conn)
        .await?;
    Ok(if taken { format!("{base}-{user_id}") } else { base })
}

#[async_trait]
impl UserRepository for SqliteUserRepo {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let slug = free_profile_slug(&mut *tx, &row.username, row.id)
            .await
            .map_err(db_err)?;
        sqlx::query("INSERT INTO user_profiles (user_id, slug) VALUES (?, ?)")
            .bind(row.id)
            .bind(&slug)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(db_err)
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(db_err)
    }

    async fn profile_for_user(&self, user_id: i64) -> DomainResult<Option<UserProfile>> {
        self.profile_where("p.user_id = ?", ProfileKey::Id(user_id)).await
    }

    async fn profile_by_slug(&self, slug: &str) -> DomainResult<Option<UserProfile>> {
        self.profile_where("p.slug = ?", ProfileKey::Slug(slug)).await
    }

    async fn update_profile(&self, profile_id: i64, changes: ProfileChanges) -> DomainResult<UserProfile> {
        let result = sqlx::query("UPDATE user_profiles SET full_name = ?, bio = ? WHERE id = ?")
            .bind(&changes.full_name)
            .bind(&changes.bio)
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("profile", profile_id));
        }
        self.profile_where("p.id = ?", ProfileKey::Id(profile_id))
            .await?
            .ok_or_else(|| DomainError::not_found("profile", profile_id))
    }

    async fn list_profiles(&self, page: PageRequest) -> DomainResult<Page<UserProfile>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let total = u64::try_from(total).unwrap_or_default();
        let page = page.clamp(total);

        let rows = sqlx::query_as::<_, ProfileRow>(&format!("{PROFILE_COLUMNS} ORDER BY p.id LIMIT ? OFFSET ?"))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page {
            items: rows.into_iter().map(UserProfile::from).collect(),
            number: page.number,
            per_page: page.per_page,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::memory_pool;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_also_creates_a_profile() {
        let repo = SqliteUserRepo::new(memory_pool().await);
        let user = repo.create(new_user("Ayşe Y")).await.unwrap_or_else(|e| panic!("{e}"));

        let profile = repo.profile_for_user(user.id).await.unwrap().unwrap();
        assert_eq!(profile.slug, "ayse-y");
        assert_eq!(profile.username, "Ayşe Y");
        assert_eq!(repo.profile_by_slug("ayse-y").await.unwrap().unwrap().id, profile.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let repo = SqliteUserRepo::new(memory_pool().await);
        repo.create(new_user("ayse")).await.unwrap();
        let result = repo.create(new_user("ayse")).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn colliding_profile_slugs_get_a_suffix() {
        let repo = SqliteUserRepo::new(memory_pool().await);
        repo.create(new_user("ayse")).await.unwrap();
        let second = repo.create(new_user("Ayse")).await.unwrap();
        let symbols = repo.create(new_user("___")).await.unwrap();

        let profile = repo.profile_for_user(second.id).await.unwrap().unwrap();
        assert_eq!(profile.slug, format!("ayse-{}", second.id));
        let profile = repo.profile_for_user(symbols.id).await.unwrap().unwrap();
        assert_eq!(profile.slug, format!("user-{}", symbols.id));
    }

    #[tokio::test]
    async fn update_and_list_profiles() {
        let repo = SqliteUserRepo::new(memory_pool().await);
        for name in ["a1", "a2", "a3", "a4", "a5", "a6"] {
            repo.create(new_user(name)).await.unwrap();
        }
        let profile = repo.profile_by_slug("a2").await.unwrap().unwrap();
        let updated = repo
            .update_profile(
                profile.id,
                ProfileChanges {
                    full_name: "Second".into(),
                    bio: "Bio".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Second");

        let page = repo.list_profiles(PageRequest::new(2)).await.unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].slug, "a6");
    }

    #[tokio::test]
    async fn lookups_by_username_are_exact() {
        let repo = SqliteUserRepo::new(memory_pool().await);
        let user = repo.create(new_user("ayse")).await.unwrap();
        assert_eq!(repo.find_by_username("ayse").await.unwrap().unwrap().id, user.id);
        assert!(repo.find_by_username("AYSE").await.unwrap().is_none());
        assert_eq!(repo.find_by_id(user.id).await.unwrap().unwrap().username, "ayse");
    }
}
