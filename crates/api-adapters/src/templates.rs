//! Askama page templates. Every page extends `base.html` and carries a [`PageContext`].

use askama::Template;
use domains::{Category, Comment, FieldErrors, Tag, UserProfile};
use services::{CommentInput, ProfileInput, RegisterInput};

use crate::views::{CategoryOption, LinkView, PageContext, Pagination, PostView};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub ctx: PageContext,
    pub slider: Vec<PostView>,
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub ctx: PageContext,
    pub post: PostView,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub previous: Option<LinkView>,
    pub next: Option<LinkView>,
    pub is_owner: bool,
    pub form: CommentInput,
    pub errors: FieldErrors,
    pub captcha_site_key: String,
}

/// Shared by create and update.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub ctx: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub title: String,
    pub content: String,
    pub tag: String,
    pub categories: Vec<CategoryOption>,
    pub current_image: Option<String>,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "post_delete.html")]
pub struct PostDeleteTemplate {
    pub ctx: PageContext,
    pub post: PostView,
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub ctx: PageContext,
    pub category: Category,
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "tag.html")]
pub struct TagTemplate {
    pub ctx: PageContext,
    pub tag: Tag,
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub posts: Vec<PostView>,
    pub total: u64,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub form: RegisterInput,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub next: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub profile: UserProfile,
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "profile_update.html")]
pub struct ProfileUpdateTemplate {
    pub ctx: PageContext,
    pub profile: UserProfile,
    pub form: ProfileInput,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "user_posts.html")]
pub struct UserPostsTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "user_list.html")]
pub struct UserListTemplate {
    pub ctx: PageContext,
    pub profiles: Vec<UserProfile>,
    pub pagination: Pagination,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
}

#[derive(Template)]
#[template(path = "server_error.html")]
pub struct ServerErrorTemplate {
    pub ctx: PageContext,
}
