//! Loading a forum's comment thread.
//!
//! A [`CommentSource`] supplies the flat snapshot; [`load_thread`] fetches it
//! and builds the forest. Callers reload after every mutation.

use crate::comment_tree::{build_tree_owned, find, walk, Comment, CommentNode, Walk};
use crate::error::ApiError;
use tracing::info;

/// Anything that can list the comments of a forum post.
#[async_trait::async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_comments(&self, forum_id: &str) -> Result<Vec<Comment>, ApiError>;
}

/// A built thread for one forum post.
#[derive(Debug, Clone)]
pub struct Thread {
    pub forum_id: String,
    pub roots: Vec<CommentNode>,
    total: usize,
}

impl Thread {
    pub fn new(forum_id: impl Into<String>, comments: Vec<Comment>) -> Self {
        let total = comments.len();
        Self {
            forum_id: forum_id.into(),
            roots: build_tree_owned(comments),
            total,
        }
    }

    /// Number of comments in the snapshot.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn walk(&self) -> Walk<'_> {
        walk(&self.roots)
    }

    pub fn find(&self, comment_id: &str) -> Option<&CommentNode> {
        find(&self.roots, comment_id)
    }
}

/// Fetch the current snapshot and build its tree.
pub async fn load_thread<S>(source: &S, forum_id: &str) -> Result<Thread, ApiError>
where
    S: CommentSource + ?Sized,
{
    let comments = source.fetch_comments(forum_id).await?;
    let thread = Thread::new(forum_id, comments);
    info!(
        "Loaded thread for forum {}: {} comments, {} top-level",
        forum_id,
        thread.len(),
        thread.roots.len()
    );
    Ok(thread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a mutable snapshot, like a backend between mutations.
    struct FakeSource {
        comments: Mutex<Vec<Comment>>,
    }

    #[async_trait::async_trait]
    impl CommentSource for FakeSource {
        async fn fetch_comments(&self, _forum_id: &str) -> Result<Vec<Comment>, ApiError> {
            Ok(self.comments.lock().unwrap().clone())
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl CommentSource for FailingSource {
        async fn fetch_comments(&self, _forum_id: &str) -> Result<Vec<Comment>, ApiError> {
            Err(ApiError::InvalidResponse("Invalid response format".to_string()))
        }
    }

    #[tokio::test]
    async fn test_reload_after_mutation_rebuilds() {
        let source = FakeSource {
            comments: Mutex::new(vec![Comment::new("1", "root")]),
        };

        let thread = load_thread(&source, "f1").await.unwrap();
        assert_eq!(thread.len(), 1);
        assert!(thread.roots[0].replies.is_empty());

        source
            .comments
            .lock()
            .unwrap()
            .push(Comment::new("2", "reply").reply_to("1"));

        let thread = load_thread(&source, "f1").await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread.roots.len(), 1);
        assert_eq!(thread.find("2").unwrap().comment.content, "reply");
        assert_eq!(thread.walk().map(|v| v.depth).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_dyn_source() {
        let source: Box<dyn CommentSource> = Box::new(FakeSource {
            comments: Mutex::new(Vec::new()),
        });
        let thread = load_thread(source.as_ref(), "f1").await.unwrap();
        assert!(thread.is_empty());
        assert_eq!(thread.forum_id, "f1");
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let err = load_thread(&FailingSource, "f1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid response format");
    }
}
