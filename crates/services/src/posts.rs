//! Post use cases: listings, detail view with hit counting, search, and the
//! owner-guarded create/update/delete flow with tag reconciliation.

use std::sync::Arc;

use domains::{
    slugify, Category, CategoryRepository, Comment, CommentRepository, DomainError, DomainResult,
    FieldErrors, Identity, MediaStore, Neighbours, NewPost, Page, PageRequest, Post, PostChanges,
    PostFilter, PostRepository, SortOrder, Tag, TagRepository, Upload,
};
use tracing::{info, warn};

use crate::forms::{check, PostInput, REQUIRED};
use crate::tags::parse_tag_labels;

/// Everything the detail page shows about one post.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub neighbours: Neighbours,
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub posts: Page<Post>,
    pub slider: Vec<Post>,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    categories: Arc<dyn CategoryRepository>,
    comments: Arc<dyn CommentRepository>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        tags: Arc<dyn TagRepository>,
        categories: Arc<dyn CategoryRepository>,
        comments: Arc<dyn CommentRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            posts,
            tags,
            categories,
            comments,
            media,
        }
    }

    pub async fn home(&self, page: PageRequest) -> DomainResult<HomePage> {
        let posts = self.posts.list(PostFilter::All, SortOrder::NewestFirst, page).await?;
        let slider = self.posts.slider_posts().await?;
        Ok(HomePage { posts, slider })
    }

    /// Counts a view, then loads the detail page.
    pub async fn view(&self, id: i64) -> DomainResult<PostDetail> {
        if !self.posts.increment_hit(id).await? {
            return Err(DomainError::not_found("post", id));
        }
        self.detail(id).await
    }

    /// Loads the detail page without counting a view.
    pub async fn detail(&self, id: i64) -> DomainResult<PostDetail> {
        let post = self.get(id).await?;
        let tags = self.tags.for_post(id).await?;
        let comments = self.comments.for_post(id).await?;
        let neighbours = self.posts.neighbours(id).await?;
        Ok(PostDetail {
            post,
            tags,
            comments,
            neighbours,
        })
    }

    pub async fn by_category(&self, category_id: i64, page: PageRequest) -> DomainResult<(Category, Page<Post>)> {
        let category = self
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", category_id))?;
        let posts = self
            .posts
            .list(PostFilter::Category(category.id), SortOrder::NewestFirst, page)
            .await?;
        Ok((category, posts))
    }

    pub async fn by_tag(&self, slug: &str, page: PageRequest) -> DomainResult<(Tag, Page<Post>)> {
        let tag = self
            .tags
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("tag", slug))?;
        let posts = self
            .posts
            .list(PostFilter::Tag(tag.id), SortOrder::OldestFirst, page)
            .await?;
        Ok((tag, posts))
    }

    /// An empty query lists every post in the same order as a search.
    pub async fn search(&self, query: &str, page: PageRequest) -> DomainResult<Page<Post>> {
        let query = query.trim();
        let filter = if query.is_empty() {
            PostFilter::All
        } else {
            PostFilter::Search(query.to_owned())
        };
        self.posts.list(filter, SortOrder::OldestFirst, page).await
    }

    pub async fn by_author(&self, user_id: i64, page: PageRequest) -> DomainResult<Page<Post>> {
        self.posts
            .list(PostFilter::Author(user_id), SortOrder::NewestFirst, page)
            .await
    }

    pub async fn categories(&self) -> DomainResult<Vec<Category>> {
        self.categories.list().await
    }

    pub async fn create(&self, author: &Identity, input: PostInput) -> DomainResult<Post> {
        let input = input.trimmed();
        let category_id = self.validate(&input).await?;
        let labels = parse_tag_labels(&input.tag);
        let image = self.store_image(input.image).await?;

        let post = self
            .posts
            .create(
                NewPost {
                    slug: slugify(&input.title),
                    title: input.title,
                    content: input.content,
                    image,
                    category_id,
                    user_id: author.user_id,
                },
                labels,
            )
            .await?;

        info!(post_id = post.id, user_id = author.user_id, "post created");
        Ok(post)
    }

    /// Loads a post for its edit form, together with its current tags.
    pub async fn editable(&self, id: i64, requester: &Identity) -> DomainResult<(Post, Vec<Tag>)> {
        let post = self.owned(id, requester).await?;
        let tags = self.tags.for_post(id).await?;
        Ok((post, tags))
    }

    /// Replaces the post's fields and its whole tag set.
    pub async fn update(&self, id: i64, requester: &Identity, input: PostInput) -> DomainResult<Post> {
        self.owned(id, requester).await?;
        let input = input.trimmed();
        let category_id = self.validate(&input).await?;
        let labels = parse_tag_labels(&input.tag);
        let image = self.store_image(input.image).await?;

        let post = self
            .posts
            .update(
                id,
                PostChanges {
                    slug: slugify(&input.title),
                    title: input.title,
                    content: input.content,
                    image,
                    category_id,
                },
                labels,
            )
            .await?;

        info!(post_id = id, user_id = requester.user_id, "post updated");
        Ok(post)
    }

    /// Loads a post for its delete confirmation page.
    pub async fn deletable(&self, id: i64, requester: &Identity) -> DomainResult<Post> {
        self.owned(id, requester).await
    }

    pub async fn delete(&self, id: i64, requester: &Identity) -> DomainResult<()> {
        self.owned(id, requester).await?;
        self.posts.delete(id).await?;
        info!(post_id = id, user_id = requester.user_id, "post deleted");
        Ok(())
    }

    async fn get(&self, id: i64) -> DomainResult<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    /// Ownership guard: a missing post is `NotFound`, someone else's is `Forbidden`.
    async fn owned(&self, id: i64, requester: &Identity) -> DomainResult<Post> {
        let post = self.get(id).await?;
        if !post.is_owned_by(requester) {
            warn!(post_id = id, owner_id = post.user_id, requester_id = requester.user_id, "post ownership check failed");
            return Err(DomainError::Forbidden(format!("post {id} belongs to another user")));
        }
        Ok(post)
    }

    /// Returns the resolved category id, or every field error at once.
    async fn validate(&self, input: &PostInput) -> DomainResult<i64> {
        let mut errors = check(input);

        let category_id = match input.category.parse::<i64>() {
            Ok(id) => self.categories.find_by_id(id).await?.map(|c| c.id),
            Err(_) => None,
        };
        if input.category.is_empty() {
            errors.add("category", REQUIRED);
        } else if category_id.is_none() {
            errors.add(
                "category",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }

        if let Some(upload) = &input.image {
            errors.merge(check_image(upload));
        }

        errors.into_result()?;
        category_id.ok_or_else(|| DomainError::internal("category resolved without errors"))
    }

    async fn store_image(&self, upload: Option<Upload>) -> DomainResult<Option<String>> {
        match upload {
            Some(upload) => Ok(Some(self.media.save_upload(upload).await?)),
            None => Ok(None),
        }
    }
}

fn check_image(upload: &Upload) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let is_image = upload
        .content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false);
    if !is_image || upload.data.is_empty() {
        errors.add(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        );
    }
    errors
}
