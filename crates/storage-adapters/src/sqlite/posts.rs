use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, DomainResult, NewPost, Neighbours, Page, PageRequest, Post, PostChanges,
    PostFilter, PostLink, PostRepository, SortOrder, TagLabel,
};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{db_err, like_pattern};

const POST_COLUMNS: &str = "SELECT p.id, p.title, p.slug, p.content, p.image, p.category_id, \
     c.title AS category_title, p.user_id, u.username AS author, p.hit, p.slider_post, \
     p.created_at, p.updated_at \
     FROM posts p \
     JOIN categories c ON c.id = p.category_id \
     JOIN users u ON u.id = p.user_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    slug: String,
    content: String,
    image: Option<String>,
    category_id: i64,
    category_title: String,
    user_id: i64,
    author: String,
    hit: i64,
    slider_post: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            image: row.image,
            category_id: row.category_id,
            category_title: row.category_title,
            user_id: row.user_id,
            author: row.author,
            hit: row.hit,
            slider_post: row.slider_post,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    title: String,
    slug: String,
}

impl From<LinkRow> for PostLink {
    fn from(row: LinkRow) -> Self {
        PostLink {
            id: row.id,
            title: row.title,
            slug: row.slug,
        }
    }
}

pub struct SqlitePostRepo {
    pool: SqlitePool,
}

impl SqlitePostRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Marks or unmarks a post for the home page slider.
    pub async fn set_slider(&self, id: i64, on: bool) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE posts SET slider_post = ? WHERE id = ?")
            .bind(on)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch(&self, id: i64) -> DomainResult<Option<Post>> {
        sqlx::query_as::<_, PostRow>(&format!("{POST_COLUMNS} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Post::from))
            .map_err(db_err)
    }
}

/// Upserts every label and links the resulting tags to `post_id`.
///
/// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on conflict,
/// so get-or-create is one statement and concurrent saves cannot duplicate a slug.
async fn link_tags(conn: &mut SqliteConnection, post_id: i64, labels: &[TagLabel]) -> Result<(), sqlx::Error> {
    for label in labels {
        let tag_id: i64 = sqlx::query_scalar(
            "INSERT INTO tags (title, slug) VALUES (?, ?) \
             ON CONFLICT (slug) DO UPDATE SET slug = excluded.slug \
             RETURNING id",
        )
        .bind(&label.title)
        .bind(&label.slug)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Category(id) => {
            builder.push(" WHERE p.category_id = ").push_bind(*id);
        }
        PostFilter::Author(id) => {
            builder.push(" WHERE p.user_id = ").push_bind(*id);
        }
        PostFilter::Tag(id) => {
            builder
                .push(" WHERE EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ")
                .push_bind(*id)
                .push(")");
        }
        PostFilter::Search(query) => {
            let pattern = like_pattern(query);
            builder
                .push(" WHERE p.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR p.content LIKE ")
                .push_bind(pattern.clone())
                .push(
                    " ESCAPE '\\' OR EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                     WHERE pt.post_id = p.id AND t.title LIKE ",
                )
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepo {
    async fn create(&self, post: NewPost, tags: Vec<TagLabel>) -> DomainResult<Post> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, slug, content, image, category_id, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.image)
        .bind(post.category_id)
        .bind(post.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        link_tags(&mut *tx, id, &tags).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn update(&self, id: i64, changes: PostChanges, tags: Vec<TagLabel>) -> DomainResult<Post> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = sqlx::query(
            "UPDATE posts SET title = ?, slug = ?, content = ?, image = COALESCE(?, image), \
             category_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.slug)
        .bind(&changes.content)
        .bind(&changes.image)
        .bind(changes.category_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("post", id));
        }

        // Full replace: links go, tag records stay.
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        link_tags(&mut *tx, id, &tags).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Post>> {
        self.fetch(id).await
    }

    async fn increment_hit(&self, id: i64) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE posts SET hit = hit + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn neighbours(&self, id: i64) -> DomainResult<Neighbours> {
        let previous = sqlx::query_as::<_, LinkRow>(
            "SELECT id, title, slug FROM posts WHERE id < ? ORDER BY id DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let next = sqlx::query_as::<_, LinkRow>(
            "SELECT id, title, slug FROM posts WHERE id > ? ORDER BY id ASC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Neighbours {
            previous: previous.map(PostLink::from),
            next: next.map(PostLink::from),
        })
    }

    async fn list(&self, filter: PostFilter, order: SortOrder, page: PageRequest) -> DomainResult<Page<Post>> {
        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM posts p JOIN categories c ON c.id = p.category_id JOIN users u ON u.id = p.user_id",
        );
        push_filter(&mut count, &filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let total = u64::try_from(total).unwrap_or_default();
        let page = page.clamp(total);

        let mut select = QueryBuilder::<Sqlite>::new(POST_COLUMNS);
        push_filter(&mut select, &filter);
        select.push(match order {
            SortOrder::NewestFirst => " ORDER BY p.id DESC",
            SortOrder::OldestFirst => " ORDER BY p.id ASC",
        });
        select
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Post::from)
            .collect();

        Ok(Page {
            items,
            number: page.number,
            per_page: page.per_page,
            total,
        })
    }

    async fn slider_posts(&self) -> DomainResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!("{POST_COLUMNS} WHERE p.slider_post = 1 ORDER BY p.id DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{insert_category, insert_user, memory_pool};
    use crate::sqlite::SqliteTagRepo;
    use domains::TagRepository;

    fn label(title: &str) -> TagLabel {
        TagLabel {
            title: title.to_owned(),
            slug: domains::slugify(title),
        }
    }

    fn new_post(title: &str, category_id: i64, user_id: i64) -> NewPost {
        NewPost {
            title: title.to_owned(),
            slug: domains::slugify(title),
            content: format!("Content of {title}"),
            image: None,
            category_id,
            user_id,
        }
    }

    async fn setup() -> (SqlitePool, SqlitePostRepo, i64, i64) {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "ayse").await;
        let category = insert_category(&pool, "General").await;
        (pool.clone(), SqlitePostRepo::new(pool), user, category)
    }

    async fn tag_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_joins_author_and_category() {
        let (_, repo, user, category) = setup().await;
        let post = repo.create(new_post("Hello World", category, user), vec![]).await.unwrap();
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.author, "ayse");
        assert_eq!(post.category_title, "General");
        assert_eq!(post.hit, 0);
        assert!(!post.slider_post);
    }

    #[tokio::test]
    async fn tags_are_reused_across_posts() {
        let (pool, repo, user, category) = setup().await;
        let tags = SqliteTagRepo::new(pool.clone());

        let first = repo
            .create(new_post("One", category, user), vec![label("Rust"), label("Web")])
            .await
            .unwrap();
        let second = repo
            .create(new_post("Two", category, user), vec![label("rust"), label("Axum")])
            .await
            .unwrap();

        assert_eq!(tag_count(&pool).await, 3);
        let first_tags = tags.for_post(first.id).await.unwrap();
        let second_tags = tags.for_post(second.id).await.unwrap();
        let shared = |list: &[domains::Tag]| list.iter().find(|t| t.slug == "rust").map(|t| t.id);
        assert_eq!(shared(&first_tags), shared(&second_tags));
        // The first spelling of a tag is the one that is kept.
        assert_eq!(tags.find_by_slug("rust").await.unwrap().unwrap().title, "Rust");
    }

    #[tokio::test]
    async fn update_replaces_links_but_keeps_tags() {
        let (pool, repo, user, category) = setup().await;
        let tags = SqliteTagRepo::new(pool.clone());
        let post = repo
            .create(new_post("One", category, user), vec![label("Rust"), label("Web")])
            .await
            .unwrap();

        let changes = PostChanges {
            title: "One, revised".into(),
            slug: "one-revised".into(),
            content: "New content".into(),
            image: None,
            category_id: category,
        };
        let updated = repo.update(post.id, changes, vec![label("Axum")]).await.unwrap();

        assert_eq!(updated.title, "One, revised");
        let slugs: Vec<_> = tags
            .for_post(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.slug)
            .collect();
        assert_eq!(slugs, ["axum"]);
        assert_eq!(tag_count(&pool).await, 3);
    }

    #[tokio::test]
    async fn update_without_image_keeps_the_old_one() {
        let (_, repo, user, category) = setup().await;
        let mut with_image = new_post("Pic", category, user);
        with_image.image = Some("abc123".into());
        let post = repo.create(with_image, vec![]).await.unwrap();

        let changes = PostChanges {
            title: "Pic".into(),
            slug: "pic".into(),
            content: "changed".into(),
            image: None,
            category_id: category,
        };
        let updated = repo.update(post.id, changes, vec![]).await.unwrap();
        assert_eq!(updated.image.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn neighbours_skip_gaps() {
        let (_, repo, user, category) = setup().await;
        let mut ids = Vec::new();
        for title in ["a", "b", "c", "d", "e", "f", "g"] {
            ids.push(repo.create(new_post(title, category, user), vec![]).await.unwrap().id);
        }
        // Keep the 1st, 3rd and 7th post only.
        for id in [ids[1], ids[3], ids[4], ids[5]] {
            repo.delete(id).await.unwrap();
        }
        let (one, three, seven) = (ids[0], ids[2], ids[6]);

        let middle = repo.neighbours(three).await.unwrap();
        assert_eq!(middle.previous.map(|p| p.id), Some(one));
        assert_eq!(middle.next.map(|p| p.id), Some(seven));

        let first = repo.neighbours(one).await.unwrap();
        assert!(first.previous.is_none());
        assert_eq!(first.next.map(|p| p.id), Some(three));

        let last = repo.neighbours(seven).await.unwrap();
        assert!(last.next.is_none());
    }

    #[tokio::test]
    async fn increment_hit_reports_missing_posts() {
        let (_, repo, user, category) = setup().await;
        let post = repo.create(new_post("Counted", category, user), vec![]).await.unwrap();

        assert!(repo.increment_hit(post.id).await.unwrap());
        assert!(repo.increment_hit(post.id).await.unwrap());
        assert!(!repo.increment_hit(post.id + 100).await.unwrap());
        assert_eq!(repo.find_by_id(post.id).await.unwrap().unwrap().hit, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_hits_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("hits.db").display());
        let pool = crate::sqlite::connect(&url, 8).await.unwrap();
        let user = insert_user(&pool, "ayse").await;
        let category = insert_category(&pool, "General").await;
        let repo = std::sync::Arc::new(SqlitePostRepo::new(pool));
        let id = repo.create(new_post("Popular", category, user), vec![]).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move { repo.increment_hit(id).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().hit, 50);
    }

    #[tokio::test]
    async fn search_matches_title_content_and_tags_once() {
        let (_, repo, user, category) = setup().await;
        let a = repo
            .create(new_post("Learning Rust", category, user), vec![label("rustacean")])
            .await
            .unwrap();
        let b = repo
            .create(new_post("Gardening", category, user), vec![label("Rust Belt")])
            .await
            .unwrap();
        repo.create(new_post("Cooking", category, user), vec![label("food")])
            .await
            .unwrap();

        let page = repo
            .list(PostFilter::Search("RUST".into()), SortOrder::OldestFirst, PageRequest::new(1))
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, [a.id, b.id]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let (_, repo, user, category) = setup().await;
        repo.create(new_post("100% done", category, user), vec![]).await.unwrap();
        repo.create(new_post("1000 things", category, user), vec![]).await.unwrap();

        let page = repo
            .list(PostFilter::Search("0%".into()), SortOrder::OldestFirst, PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "100% done");
    }

    #[tokio::test]
    async fn listing_paginates_and_clamps() {
        let (_, repo, user, category) = setup().await;
        for i in 0..7 {
            repo.create(new_post(&format!("Post {i}"), category, user), vec![]).await.unwrap();
        }

        let first = repo
            .list(PostFilter::All, SortOrder::NewestFirst, PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 5);
        assert_eq!(first.items[0].title, "Post 6");
        assert!(first.has_next());

        let beyond = repo
            .list(PostFilter::All, SortOrder::NewestFirst, PageRequest::new(9))
            .await
            .unwrap();
        assert_eq!(beyond.number, 2);
        assert_eq!(beyond.items.len(), 2);
    }

    #[tokio::test]
    async fn filters_by_tag_category_and_author() {
        let (pool, repo, user, category) = setup().await;
        let other_user = insert_user(&pool, "mehmet").await;
        let other_category = insert_category(&pool, "Travel").await;
        let tagged = repo
            .create(new_post("Tagged", category, user), vec![label("rust")])
            .await
            .unwrap();
        let travel = repo
            .create(new_post("Trip", other_category, other_user), vec![])
            .await
            .unwrap();

        let tag_id = SqliteTagRepo::new(pool.clone())
            .find_by_slug("rust")
            .await
            .unwrap()
            .unwrap()
            .id;
        let by_tag = repo
            .list(PostFilter::Tag(tag_id), SortOrder::OldestFirst, PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(by_tag.items.iter().map(|p| p.id).collect::<Vec<_>>(), [tagged.id]);

        let by_category = repo
            .list(PostFilter::Category(other_category), SortOrder::NewestFirst, PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(by_category.items.iter().map(|p| p.id).collect::<Vec<_>>(), [travel.id]);

        let by_author = repo
            .list(PostFilter::Author(other_user), SortOrder::NewestFirst, PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(by_author.total, 1);
    }

    #[tokio::test]
    async fn slider_flag_selects_posts() {
        let (_, repo, user, category) = setup().await;
        let post = repo.create(new_post("Featured", category, user), vec![]).await.unwrap();
        repo.create(new_post("Plain", category, user), vec![]).await.unwrap();

        assert!(repo.set_slider(post.id, true).await.unwrap());
        let slider = repo.slider_posts().await.unwrap();
        assert_eq!(slider.len(), 1);
        assert_eq!(slider[0].id, post.id);
    }

    #[tokio::test]
    async fn delete_cascades_links_not_tags() {
        let (pool, repo, user, category) = setup().await;
        let post = repo
            .create(new_post("Doomed", category, user), vec![label("keep")])
            .await
            .unwrap();
        repo.delete(post.id).await.unwrap();

        assert!(repo.find_by_id(post.id).await.unwrap().is_none());
        assert_eq!(tag_count(&pool).await, 1);
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }
}
