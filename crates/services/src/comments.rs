//! Anonymous comments on posts, gated by the anti-automation challenge.

use std::sync::Arc;

use domains::{
    CaptchaVerifier, Comment, CommentRepository, DomainError, DomainResult, NewComment,
    PostRepository,
};
use tracing::{info, warn};

use crate::forms::{check, CommentInput, REQUIRED};

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    captcha: Arc<dyn CaptchaVerifier>,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        Self {
            posts,
            comments,
            captcha,
        }
    }

    /// Validates the form, verifies the challenge and stores the comment.
    pub async fn add(&self, post_id: i64, input: CommentInput, remote_ip: Option<String>) -> DomainResult<Comment> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("post", post_id));
        }

        let input = input.trimmed();
        let mut errors = check(&input);
        if input.captcha.is_empty() {
            errors.add("captcha", REQUIRED);
        } else if !self.captcha.verify(&input.captcha, remote_ip).await? {
            warn!(post_id, "comment captcha rejected");
            errors.add("captcha", "Error verifying reCAPTCHA, please try again.");
        }
        errors.into_result()?;

        let comment = self
            .comments
            .create(NewComment {
                post_id,
                name: input.name,
                email: input.email,
                content: input.content,
            })
            .await?;
        info!(post_id, comment_id = comment.id, "comment added");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{MockCaptchaVerifier, MockCommentRepository, MockPostRepository, Post};
    use tokio_test::assert_ok;

    fn post(id: i64) -> Post {
        let now = Utc::now();
        Post {
            id,
            title: "Hello".into(),
            slug: "hello".into(),
            content: "Body".into(),
            image: None,
            category_id: 1,
            category_title: "General".into(),
            user_id: 1,
            author: "ayse".into(),
            hit: 0,
            slider_post: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn valid_input() -> CommentInput {
        CommentInput {
            name: " Zeynep ".into(),
            email: "zeynep@example.com".into(),
            content: "Nice post!".into(),
            captcha: "token".into(),
        }
    }

    fn service(
        posts: MockPostRepository,
        comments: MockCommentRepository,
        captcha: MockCaptchaVerifier,
    ) -> CommentService {
        CommentService::new(Arc::new(posts), Arc::new(comments), Arc::new(captcha))
    }

    #[tokio::test]
    async fn stores_a_verified_comment() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|id| Ok(Some(post(id))));
        let mut captcha = MockCaptchaVerifier::new();
        captcha
            .expect_verify()
            .withf(|token, ip| token == "token" && ip.as_deref() == Some("10.0.0.1"))
            .returning(|_, _| Ok(true));
        let mut comments = MockCommentRepository::new();
        comments
            .expect_create()
            .withf(|c| c.post_id == 7 && c.name == "Zeynep")
            .times(1)
            .returning(|c| {
                Ok(Comment {
                    id: 1,
                    post_id: c.post_id,
                    name: c.name,
                    email: c.email,
                    content: c.content,
                    created_at: Utc::now(),
                })
            });

        let comment = assert_ok!(
            service(posts, comments, captcha)
                .add(7, valid_input(), Some("10.0.0.1".into()))
                .await
        );
        assert_eq!(comment.post_id, 7);
    }

    #[tokio::test]
    async fn failed_challenge_is_a_field_error() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|id| Ok(Some(post(id))));
        let mut captcha = MockCaptchaVerifier::new();
        captcha.expect_verify().returning(|_, _| Ok(false));
        let mut comments = MockCommentRepository::new();
        comments.expect_create().never();

        match service(posts, comments, captcha).add(7, valid_input(), None).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("captcha")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_challenge_skips_verification() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|id| Ok(Some(post(id))));
        let mut captcha = MockCaptchaVerifier::new();
        captcha.expect_verify().never();
        let comments = MockCommentRepository::new();

        let input = CommentInput {
            captcha: String::new(),
            ..valid_input()
        };
        match service(posts, comments, captcha).add(7, input, None).await {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.get("captcha"), [REQUIRED]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|_| Ok(None));

        let result = service(posts, MockCommentRepository::new(), MockCaptchaVerifier::new())
            .add(7, valid_input(), None)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
