//! Render-ready shapes handed to the templates.

use domains::{Category, Identity, MediaStore, Page, PageRequest, Post, PostLink};

/// Shared by every page: who is logged in and a pending flash message.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<Identity>,
    pub flash: Option<String>,
}

impl PageContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(current_user: Option<Identity>) -> Self {
        Self {
            current_user,
            flash: None,
        }
    }

    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash;
        self
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current_user.as_ref().map(|u| u.user_id)
    }
}

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: i64,
    pub category_title: String,
    pub user_id: i64,
    pub author: String,
    pub hit: i64,
    pub created: String,
    pub updated: String,
}

impl PostView {
    pub fn new(post: Post, media: &dyn MediaStore) -> Self {
        let excerpt = excerpt(&post.content);
        Self {
            image_url: post.image.as_deref().map(|id| media.url(id)),
            thumbnail_url: post.image.as_deref().map(|id| media.thumbnail_url(id)),
            created: post.created_at.format("%B %-d, %Y").to_string(),
            updated: post.updated_at.format("%B %-d, %Y %H:%M").to_string(),
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt,
            category_id: post.category_id,
            category_title: post.category_title,
            user_id: post.user_id,
            author: post.author,
            hit: post.hit,
        }
    }

    pub fn url(&self) -> String {
        post_url(self.id, &self.slug)
    }

    pub fn list(posts: Vec<Post>, media: &dyn MediaStore) -> Vec<Self> {
        posts.into_iter().map(|p| Self::new(p, media)).collect()
    }
}

/// Canonical detail URL. An empty slug still yields a routable path.
pub fn post_url(id: i64, slug: &str) -> String {
    if slug.is_empty() {
        format!("/post/{id}/-")
    } else {
        format!("/post/{id}/{slug}")
    }
}

/// A previous/next link on the detail page.
#[derive(Debug, Clone)]
pub struct LinkView {
    pub url: String,
    pub title: String,
}

impl From<PostLink> for LinkView {
    fn from(link: PostLink) -> Self {
        Self {
            url: post_url(link.id, &link.slug),
            title: link.title,
        }
    }
}

fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// Previous/next links for a listing. `query` is kept on search pages.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub number: u32,
    pub num_pages: u32,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub query: Option<String>,
}

impl Pagination {
    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages(),
            previous: page.has_previous().then(|| page.previous_number()),
            next: page.has_next().then(|| page.next_number()),
            query: None,
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_owned());
        self
    }

    pub fn is_needed(&self) -> bool {
        self.num_pages > 1
    }
}

/// Parses `?page=`; anything that is not a positive number means page 1.
pub fn page_request(raw: Option<&str>) -> PageRequest {
    let number = raw.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(1);
    PageRequest::new(number)
}

#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: Vec<Category>, selected: &str) -> Vec<Self> {
        categories
            .into_iter()
            .map(|c| Self {
                selected: c.id.to_string() == selected,
                id: c.id,
                title: c.title,
            })
            .collect()
    }
}
