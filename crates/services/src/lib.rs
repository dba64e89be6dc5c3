//! # services
//!
//! Use cases of Rusty-Blog. Each service owns `Arc<dyn Port>` handles and
//! holds no other state, so one instance is shared by every request.

pub mod comments;
pub mod forms;
pub mod posts;
pub mod tags;
pub mod users;

pub use comments::CommentService;
pub use forms::{CommentInput, LoginInput, PostInput, ProfileInput, RegisterInput};
pub use posts::{HomePage, PostDetail, PostService};
pub use tags::{join_tag_titles, parse_tag_labels};
pub use users::UserService;
