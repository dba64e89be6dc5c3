use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use domains::{DomainError, FieldErrors, Identity, UserProfile};
use serde::Deserialize;
use services::{LoginInput, ProfileInput, RegisterInput};

use super::PageQuery;
use crate::error::{render, ApiResult};
use crate::session::{
    clear_flash, clear_session, flash_cookie, read_cookie, safe_next, session_cookie, with_cookie, MaybeUser,
    RequireUser, FLASH_COOKIE,
};
use crate::state::AppState;
use crate::templates::{
    LoginTemplate, ProfileTemplate, ProfileUpdateTemplate, RegisterTemplate, UserListTemplate, UserPostsTemplate,
};
use crate::views::{page_request, PageContext, Pagination, PostView};

const PROFILE_UPDATED: &str = "Your profile has been updated.";

pub async fn register_form(MaybeUser(user): MaybeUser) -> ApiResult {
    render(&RegisterTemplate {
        ctx: PageContext::for_user(user),
        form: RegisterInput::default(),
        errors: FieldErrors::new(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(input): Form<RegisterInput>,
) -> ApiResult {
    match state.users.register(input.clone()).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(DomainError::Validation(errors)) => render(&RegisterTemplate {
            ctx: PageContext::for_user(user),
            form: RegisterInput {
                password1: String::new(),
                password2: String::new(),
                ..input
            },
            errors,
        }),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

pub async fn login_form(MaybeUser(user): MaybeUser, Query(q): Query<NextQuery>) -> ApiResult {
    render(&LoginTemplate {
        ctx: PageContext::for_user(user),
        username: String::new(),
        next: q.next,
        errors: FieldErrors::new(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> ApiResult {
    let input = LoginInput {
        username: form.username.clone(),
        password: form.password,
    };
    match state.users.authenticate(input).await {
        Ok(user) => {
            state.metrics.login(true);
            let token = state.tokens.issue(&user)?;
            let redirect = Redirect::to(safe_next(&form.next)).into_response();
            Ok(with_cookie(redirect, session_cookie(token, &state.web)))
        }
        Err(DomainError::Validation(errors)) => {
            state.metrics.login(false);
            render(&LoginTemplate {
                ctx: PageContext::anonymous(),
                username: form.username,
                next: form.next,
                errors,
            })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> ApiResult {
    if let Some(user) = user {
        tracing::info!(user_id = user.user_id, "user logged out");
    }
    Ok(with_cookie(Redirect::to("/").into_response(), clear_session(&state.web)))
}

/// The logged-in user's own profile and posts.
pub async fn profile(State(state): State<AppState>, RequireUser(user): RequireUser, Query(q): Query<PageQuery>) -> ApiResult {
    let profile = state.users.profile_of(&user).await?;
    let page = state.posts.by_author(user.user_id, page_request(q.page.as_deref())).await?;
    render(&ProfileTemplate {
        ctx: PageContext::for_user(Some(user)),
        profile,
        pagination: Pagination::of(&page),
        posts: PostView::list(page.items, state.media.as_ref()),
    })
}

pub async fn profile_update_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult {
    let profile = state.users.editable_profile(&slug, &user).await?;
    let flash = read_cookie(&headers, FLASH_COOKIE);
    let form = ProfileInput {
        full_name: profile.full_name.clone(),
        bio: profile.bio.clone(),
    };
    let consumed = flash.is_some();
    let page = profile_update_page(user, profile, form, FieldErrors::new(), flash)?;
    Ok(if consumed {
        with_cookie(page, clear_flash(&state.web))
    } else {
        page
    })
}

pub async fn profile_update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
    Form(input): Form<ProfileInput>,
) -> ApiResult {
    match state.users.update_profile(&slug, &user, input.clone()).await {
        Ok(profile) => {
            let back = Redirect::to(&format!("/users/profile/{}/update", profile.slug)).into_response();
            Ok(with_cookie(back, flash_cookie(PROFILE_UPDATED, &state.web)))
        }
        Err(DomainError::Validation(errors)) => {
            let profile = state.users.editable_profile(&slug, &user).await?;
            profile_update_page(user, profile, input, errors, None)
        }
        Err(err) => Err(err.into()),
    }
}

fn profile_update_page(
    user: Identity,
    profile: UserProfile,
    form: ProfileInput,
    errors: FieldErrors,
    flash: Option<String>,
) -> ApiResult {
    render(&ProfileUpdateTemplate {
        ctx: PageContext::for_user(Some(user)).with_flash(flash),
        profile,
        form,
        errors,
    })
}

pub async fn user_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> ApiResult {
    let author = state.users.user(id).await?;
    let page = state.posts.by_author(author.id, page_request(q.page.as_deref())).await?;
    render(&UserPostsTemplate {
        ctx: PageContext::for_user(user),
        username: author.username,
        pagination: Pagination::of(&page),
        posts: PostView::list(page.items, state.media.as_ref()),
    })
}

pub async fn user_list(State(state): State<AppState>, MaybeUser(user): MaybeUser, Query(q): Query<PageQuery>) -> ApiResult {
    let page = state.users.list(page_request(q.page.as_deref())).await?;
    render(&UserListTemplate {
        ctx: PageContext::for_user(user),
        pagination: Pagination::of(&page),
        profiles: page.items,
    })
}
