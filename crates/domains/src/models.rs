//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Blog.
//! Ids are store-assigned, strictly increasing integers; navigation between
//! posts relies on that ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated account. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// One-to-one extension of [`User`], addressed by its slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub slug: String,
    pub full_name: String,
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: String,
    pub bio: String,
}

/// The requester as seen by the services once the session has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

/// A label grouping posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A free-form label; the slug is unique across all tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A normalised tag label awaiting reconciliation against stored tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLabel {
    pub title: String,
    pub slug: String,
}

/// A post as read back from the store, joined with its author and category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Media id handled by the MediaStore
    pub image: Option<String>,
    pub category_id: i64,
    pub category_title: String,
    pub user_id: i64,
    pub author: String,
    pub hit: i64,
    pub slider_post: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.user_id == identity.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub user_id: i64,
}

/// Replacement values for an existing post. `image: None` keeps the stored image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
}

/// Minimal reference used for previous/next links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLink {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// The posts adjacent to a given id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub previous: Option<PostLink>,
    pub next: Option<PostLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub content: String,
}

/// Which posts a listing selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Category(i64),
    Tag(i64),
    Author(i64),
    /// Case-insensitive substring over title, content and tag titles.
    Search(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

/// A raw uploaded file, before it is handed to the MediaStore.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: bytes::Bytes,
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 5;

    pub fn new(number: u32) -> Self {
        Self {
            number: number.max(1),
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Clamps the page number into the range that exists for `total` items.
    pub fn clamp(self, total: u64) -> Self {
        let last = num_pages(total, self.per_page);
        Self {
            number: self.number.clamp(1, last),
            ..self
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

fn num_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One page of a listing plus what is needed to render pagination links.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            per_page: request.per_page,
            total: 0,
        }
    }

    pub fn num_pages(&self) -> u32 {
        num_pages(self.total, self.per_page)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> u32 {
        self.number.saturating_add(1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total: self.total,
        }
    }
}
