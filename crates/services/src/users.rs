//! Registration, credential checks and owner-guarded profiles.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, FieldErrors, Identity, NewUser, Page, PageRequest, PasswordHasher,
    ProfileChanges, User, UserProfile, UserRepository, NON_FIELD,
};
use tracing::{info, warn};

use crate::forms::{check, LoginInput, ProfileInput, RegisterInput, REQUIRED};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Creates the account and its profile.
    pub async fn register(&self, input: RegisterInput) -> DomainResult<User> {
        let input = input.trimmed();
        let mut errors = check(&input);
        if !is_valid_username(&input.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if input.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if input.password1 != input.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        if errors.is_empty() && self.users.find_by_username(&input.username).await?.is_some() {
            errors.add("username", "A user with that username already exists.");
        }
        errors.into_result()?;

        let password_hash = self.hasher.hash(&input.password1)?;
        let user = self
            .users
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                DomainError::Conflict(_) => {
                    let mut errors = FieldErrors::new();
                    errors.add("username", "A user with that username already exists.");
                    DomainError::Validation(errors)
                }
                other => other,
            })?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Checks a username/password pair. Failures never reveal which part was wrong.
    pub async fn authenticate(&self, input: LoginInput) -> DomainResult<User> {
        let username = input.username.trim();
        let mut errors = FieldErrors::new();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if input.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()?;

        match self.users.find_by_username(username).await? {
            Some(user) if self.hasher.verify(&input.password, &user.password_hash) => {
                info!(user_id = user.id, "user logged in");
                Ok(user)
            }
            _ => {
                warn!(username, "failed login attempt");
                let mut errors = FieldErrors::new();
                errors.add(NON_FIELD, BAD_CREDENTIALS);
                Err(DomainError::Validation(errors))
            }
        }
    }

    pub async fn user(&self, user_id: i64) -> DomainResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    pub async fn profile_of(&self, identity: &Identity) -> DomainResult<UserProfile> {
        self.users
            .profile_for_user(identity.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", identity.user_id))
    }

    /// Loads a profile for its edit form; only the owner may open it.
    pub async fn editable_profile(&self, slug: &str, requester: &Identity) -> DomainResult<UserProfile> {
        let profile = self
            .users
            .profile_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", slug))?;
        if profile.user_id != requester.user_id {
            warn!(profile_id = profile.id, requester_id = requester.user_id, "profile ownership check failed");
            return Err(DomainError::Forbidden(format!("profile {slug} belongs to another user")));
        }
        Ok(profile)
    }

    pub async fn update_profile(&self, slug: &str, requester: &Identity, input: ProfileInput) -> DomainResult<UserProfile> {
        let profile = self.editable_profile(slug, requester).await?;
        check(&input).into_result()?;

        let updated = self
            .users
            .update_profile(
                profile.id,
                ProfileChanges {
                    full_name: input.full_name.trim().to_owned(),
                    bio: input.bio.trim().to_owned(),
                },
            )
            .await?;
        info!(profile_id = updated.id, "profile updated");
        Ok(updated)
    }

    pub async fn list(&self, page: PageRequest) -> DomainResult<Page<UserProfile>> {
        self.users.list_profiles(page).await
    }
}

/// Letters, digits and `@.+-_`, like the usual account-name rule.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}
