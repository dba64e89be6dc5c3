use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use domains::{DomainError, FieldErrors, Identity, Post};
use serde::Deserialize;
use services::{join_tag_titles, CommentInput, PostDetail, PostInput};

use super::PageQuery;
use crate::error::{render, ApiResult};
use crate::multipart::read_post_form;
use crate::session::{ClientIp, MaybeUser, RequireUser};
use crate::state::AppState;
use crate::templates::{
    CategoryTemplate, IndexTemplate, PostDeleteTemplate, PostDetailTemplate, PostFormTemplate, SearchTemplate,
    TagTemplate,
};
use crate::views::{page_request, post_url, CategoryOption, LinkView, PageContext, Pagination, PostView};

pub async fn index(State(state): State<AppState>, MaybeUser(user): MaybeUser, Query(q): Query<PageQuery>) -> ApiResult {
    let home = state.posts.home(page_request(q.page.as_deref())).await?;
    let media = state.media.as_ref();
    render(&IndexTemplate {
        ctx: PageContext::for_user(user),
        slider: PostView::list(home.slider, media),
        pagination: Pagination::of(&home.posts),
        posts: PostView::list(home.posts.items, media),
    })
}

/// Shows a post and counts the view. The slug segment is not checked.
pub async fn detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((id, _slug)): Path<(i64, String)>,
) -> ApiResult {
    let detail = state.posts.view(id).await?;
    state.metrics.post_views.inc();
    detail_page(&state, user, detail, CommentInput::default(), FieldErrors::new())
}

pub async fn comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ClientIp(ip): ClientIp,
    Path((id, _slug)): Path<(i64, String)>,
    Form(input): Form<CommentInput>,
) -> ApiResult {
    match state.comments.add(id, input.clone(), ip).await {
        Ok(_) => {
            state.metrics.comments_created.inc();
            let post = state.posts.detail(id).await?.post;
            Ok(Redirect::to(&post_url(post.id, &post.slug)).into_response())
        }
        Err(DomainError::Validation(errors)) => {
            let detail = state.posts.detail(id).await?;
            detail_page(&state, user, detail, input, errors)
        }
        Err(err) => Err(err.into()),
    }
}

fn detail_page(
    state: &AppState,
    user: Option<Identity>,
    detail: PostDetail,
    form: CommentInput,
    errors: FieldErrors,
) -> ApiResult {
    let is_owner = user.as_ref().is_some_and(|u| detail.post.is_owned_by(u));
    render(&PostDetailTemplate {
        ctx: PageContext::for_user(user),
        post: PostView::new(detail.post, state.media.as_ref()),
        tags: detail.tags,
        comments: detail.comments,
        previous: detail.neighbours.previous.map(LinkView::from),
        next: detail.neighbours.next.map(LinkView::from),
        is_owner,
        form,
        errors,
        captcha_site_key: state.web.captcha_site_key.clone(),
    })
}

pub async fn category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> ApiResult {
    let (category, page) = state.posts.by_category(id, page_request(q.page.as_deref())).await?;
    render(&CategoryTemplate {
        ctx: PageContext::for_user(user),
        category,
        pagination: Pagination::of(&page),
        posts: PostView::list(page.items, state.media.as_ref()),
    })
}

pub async fn tag(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> ApiResult {
    let (tag, page) = state.posts.by_tag(&slug, page_request(q.page.as_deref())).await?;
    render(&TagTemplate {
        ctx: PageContext::for_user(user),
        tag,
        pagination: Pagination::of(&page),
        posts: PostView::list(page.items, state.media.as_ref()),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(q): Query<SearchQuery>,
) -> ApiResult {
    let query = q.q.trim().to_owned();
    let page = state.posts.search(&query, page_request(q.page.as_deref())).await?;
    render(&SearchTemplate {
        ctx: PageContext::for_user(user),
        pagination: Pagination::of(&page).with_query(&query),
        total: page.total,
        posts: PostView::list(page.items, state.media.as_ref()),
        query,
    })
}

pub async fn create_form(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult {
    form_page(&state, user, "Create post", "/post/create".into(), PostInput::default(), None, FieldErrors::new()).await
}

pub async fn create(State(state): State<AppState>, RequireUser(user): RequireUser, multipart: Multipart) -> ApiResult {
    let input = read_post_form(multipart).await?;
    match state.posts.create(&user, input.clone()).await {
        Ok(post) => {
            state.metrics.posts_created.inc();
            Ok(Redirect::to(&post_url(post.id, &post.slug)).into_response())
        }
        Err(DomainError::Validation(errors)) => {
            form_page(&state, user, "Create post", "/post/create".into(), input, None, errors).await
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn update_form(State(state): State<AppState>, RequireUser(user): RequireUser, Path(id): Path<i64>) -> ApiResult {
    let (post, tags) = state.posts.editable(id, &user).await?;
    let input = PostInput {
        title: post.title.clone(),
        category: post.category_id.to_string(),
        content: post.content.clone(),
        tag: join_tag_titles(&tags),
        image: None,
    };
    form_page(&state, user, "Update post", update_action(id), input, Some(&post), FieldErrors::new()).await
}

pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult {
    let input = read_post_form(multipart).await?;
    match state.posts.update(id, &user, input.clone()).await {
        Ok(post) => Ok(Redirect::to(&post_url(post.id, &post.slug)).into_response()),
        Err(DomainError::Validation(errors)) => {
            let (post, _) = state.posts.editable(id, &user).await?;
            form_page(&state, user, "Update post", update_action(id), input, Some(&post), errors).await
        }
        Err(err) => Err(err.into()),
    }
}

fn update_action(id: i64) -> String {
    format!("/post/{id}/update")
}

async fn form_page(
    state: &AppState,
    user: Identity,
    heading: &'static str,
    action: String,
    input: PostInput,
    existing: Option<&Post>,
    errors: FieldErrors,
) -> ApiResult {
    let categories = state.posts.categories().await?;
    render(&PostFormTemplate {
        ctx: PageContext::for_user(Some(user)),
        heading,
        action,
        categories: CategoryOption::list(categories, &input.category),
        current_image: existing.and_then(|p| p.image.as_deref()).map(|id| state.media.thumbnail_url(id)),
        title: input.title,
        content: input.content,
        tag: input.tag,
        errors,
    })
}

pub async fn delete_form(State(state): State<AppState>, RequireUser(user): RequireUser, Path(id): Path<i64>) -> ApiResult {
    let post = state.posts.deletable(id, &user).await?;
    render(&PostDeleteTemplate {
        ctx: PageContext::for_user(Some(user)),
        post: PostView::new(post, state.media.as_ref()),
    })
}

pub async fn delete(State(state): State<AppState>, RequireUser(user): RequireUser, Path(id): Path<i64>) -> ApiResult {
    state.posts.delete(id, &user).await?;
    Ok(Redirect::to("/").into_response())
}
