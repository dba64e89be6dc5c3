//! # Ports
//!
//! Every adapter must implement these traits to be wired into the binary.
//! Services only ever see `Arc<dyn Trait>`.

use async_trait::async_trait;

use crate::errors::DomainResult;
use crate::models::{
    Category, Comment, Identity, NewComment, NewPost, NewUser, Neighbours, Page, PageRequest, Post,
    PostChanges, PostFilter, ProfileChanges, SortOrder, Tag, TagLabel, Upload, User, UserProfile,
};

/// Persistence contract for posts and their tag links.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts the post, upserts every label and links them, atomically.
    async fn create(&self, post: NewPost, tags: Vec<TagLabel>) -> DomainResult<Post>;

    /// Applies `changes`, then replaces the whole tag set with `tags`, atomically.
    async fn update(&self, id: i64, changes: PostChanges, tags: Vec<TagLabel>) -> DomainResult<Post>;

    async fn delete(&self, id: i64) -> DomainResult<()>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Post>>;

    /// Atomically adds one to the hit counter; returns `false` when no post has `id`.
    async fn increment_hit(&self, id: i64) -> DomainResult<bool>;

    async fn neighbours(&self, id: i64) -> DomainResult<Neighbours>;

    async fn list(&self, filter: PostFilter, order: SortOrder, page: PageRequest) -> DomainResult<Page<Post>>;

    async fn slider_posts(&self) -> DomainResult<Vec<Post>>;
}

/// Read access to tags. Writes happen through [`PostRepository`].
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> DomainResult<Option<Tag>>;
    async fn for_post(&self, post_id: i64) -> DomainResult<Vec<Tag>>;
    async fn list(&self) -> DomainResult<Vec<Tag>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Category>>;
    async fn list(&self) -> DomainResult<Vec<Category>>;
    /// Returns the existing category when the slug is already taken.
    async fn get_or_create(&self, title: &str, slug: &str) -> DomainResult<Category>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> DomainResult<Comment>;
    /// Oldest first.
    async fn for_post(&self, post_id: i64) -> DomainResult<Vec<Comment>>;
}

/// Accounts and their profiles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the user and its profile together. A taken username is a `Conflict`.
    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn profile_for_user(&self, user_id: i64) -> DomainResult<Option<UserProfile>>;
    async fn profile_by_slug(&self, slug: &str) -> DomainResult<Option<UserProfile>>;
    async fn update_profile(&self, profile_id: i64, changes: ProfileChanges) -> DomainResult<UserProfile>;
    async fn list_profiles(&self, page: PageRequest) -> DomainResult<Page<UserProfile>>;
}

/// Media storage contract for post images and their thumbnails.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id for the Post model.
    async fn save_upload(&self, upload: Upload) -> DomainResult<String>;
    /// Public URL of the original media.
    fn url(&self, media_id: &str) -> String;
    /// Public URL of the thumbnail.
    fn thumbnail_url(&self, media_id: &str) -> String;
}

/// One-way password hashing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> DomainResult<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Issues and verifies the signed session token carried by the browser.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> DomainResult<String>;
    /// An invalid or expired token is `Unauthorized`.
    fn verify(&self, token: &str) -> DomainResult<Identity>;
}

/// Anti-automation challenge verification for anonymous submissions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, response: &str, remote_ip: Option<String>) -> DomainResult<bool>;
}
