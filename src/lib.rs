//! Forum Admin - client library for the forum and events admin backend.
//!
//! The centre of the crate is [`comment_tree`], which turns the backend's flat
//! comment list into a threaded forest. The remaining modules wrap the REST
//! backend, session state and form validation used by the CLI.

pub mod api;
pub mod comment_tree;
pub mod config;
pub mod error;
pub mod forms;
pub mod render;
pub mod schema;
pub mod session;
pub mod thread;

pub use comment_tree::{build_tree, walk, Comment, CommentNode, Placement};
pub use error::{ApiError, FormError};
