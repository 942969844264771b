//! Threaded comment reconstruction.
//!
//! The backend returns comments as a flat list where replies point at their
//! parent through `parent_ref`. [`build_tree`] links them into a forest of
//! root comments with nested replies, and [`walk`] yields that forest in
//! display order (depth-first, pre-order).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A single comment as delivered by the backend, already translated into
/// client terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Id of the comment this one replies to. `None` for top-level comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Comment {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_ref: None,
            content: content.into(),
            author_ref: None,
            timestamp: None,
        }
    }

    pub fn reply_to(mut self, parent: impl Into<String>) -> Self {
        self.parent_ref = Some(parent.into());
        self
    }
}

/// Why a node sits where it does in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// No parent reference.
    Root,
    /// Nested under the comment named by `parent_ref`.
    Reply,
    /// `parent_ref` names a comment that is not in the snapshot; shown as a root.
    Orphaned,
    /// `parent_ref` closes a reply cycle; the link was dropped and the comment
    /// is shown as a root.
    CycleBroken,
}

impl Placement {
    /// True for roots that carry a parent reference the builder could not honour.
    pub fn is_detached(self) -> bool {
        matches!(self, Placement::Orphaned | Placement::CycleBroken)
    }
}

/// A comment plus its nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub placement: Placement,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> &str {
        &self.comment.id
    }

    /// Number of comments below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        walk(&self.replies).count()
    }
}

// Frees the subtree with an explicit stack so deep reply chains cannot
// overflow the call stack.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Build the comment forest from a flat snapshot.
///
/// Roots keep their input order, and so do replies sharing a parent. A reply
/// may appear before its parent in the input. When ids repeat, every record
/// is kept and replies attach to the last record carrying that id.
pub fn build_tree(comments: &[Comment]) -> Vec<CommentNode> {
    build_tree_owned(comments.to_vec())
}

/// Same as [`build_tree`], consuming the snapshot instead of cloning it.
pub fn build_tree_owned(comments: Vec<Comment>) -> Vec<CommentNode> {
    let n = comments.len();

    // First pass: every id must be known before any reply is linked.
    let mut parent: Vec<Option<usize>> = {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
        for (i, comment) in comments.iter().enumerate() {
            index.insert(comment.id.as_str(), i);
        }
        comments
            .iter()
            .map(|c| c.parent_ref.as_deref().and_then(|p| index.get(p).copied()))
            .collect()
    };

    let mut placement: Vec<Placement> = comments
        .iter()
        .zip(&parent)
        .map(|(c, p)| match (p, &c.parent_ref) {
            (Some(_), _) => Placement::Reply,
            (None, Some(_)) => Placement::Orphaned,
            (None, None) => Placement::Root,
        })
        .collect();

    let broken = break_cycles(&mut parent);
    for &i in &broken {
        placement[i] = Placement::CycleBroken;
    }

    // Second pass, input order.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let orphans = placement
        .iter()
        .filter(|p| **p == Placement::Orphaned)
        .count();
    debug!(
        "Built comment tree: {} comments, {} roots, {} orphaned, {} cycles broken",
        n,
        roots.len(),
        orphans,
        broken.len()
    );

    // Pre-order over indices; children always come after their parent, so
    // assembling in reverse finishes every reply before it is moved.
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }

    let mut slots: Vec<Option<CommentNode>> = comments
        .into_iter()
        .zip(placement)
        .map(|(comment, placement)| {
            Some(CommentNode {
                comment,
                placement,
                replies: Vec::new(),
            })
        })
        .collect();

    for &i in order.iter().rev() {
        let replies: Vec<CommentNode> = children[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(node) = slots[i].as_mut() {
            node.replies = replies;
        }
    }

    roots.iter().filter_map(|&i| slots[i].take()).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    OnPath(usize),
    Done,
}

/// Cut every parent cycle at its earliest input member. Returns the indices
/// whose parent link was dropped.
fn break_cycles(parent: &mut [Option<usize>]) -> Vec<usize> {
    let mut mark = vec![Mark::Unseen; parent.len()];
    let mut path: Vec<usize> = Vec::new();
    let mut broken = Vec::new();

    for start in 0..parent.len() {
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            match mark[i] {
                Mark::Done => break,
                Mark::OnPath(pos) => {
                    let cut = path[pos..].iter().copied().min().unwrap_or(i);
                    parent[cut] = None;
                    broken.push(cut);
                    break;
                }
                Mark::Unseen => {
                    mark[i] = Mark::OnPath(path.len());
                    path.push(i);
                    cursor = parent[i];
                }
            }
        }
        for i in path.drain(..) {
            mark[i] = Mark::Done;
        }
    }

    broken.sort_unstable();
    broken
}

// ============================================================================
// Traversal
// ============================================================================

/// One step of a [`walk`]: the node and how deep it is nested (roots are 0).
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub depth: usize,
    pub node: &'a CommentNode,
}

/// Depth-first, pre-order iterator over a comment forest.
pub struct Walk<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        self.stack.extend(visit.node.replies.iter().rev().map(|node| Visit {
            depth: visit.depth + 1,
            node,
        }));
        Some(visit)
    }
}

/// Visit every node in display order: a comment, then all of its replies
/// (recursively), before its next sibling.
pub fn walk(roots: &[CommentNode]) -> Walk<'_> {
    Walk {
        stack: roots
            .iter()
            .rev()
            .map(|node| Visit { depth: 0, node })
            .collect(),
    }
}

/// Find a node anywhere in the forest.
pub fn find<'a>(roots: &'a [CommentNode], id: &str) -> Option<&'a CommentNode> {
    walk(roots).map(|v| v.node).find(|node| node.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ids(nodes: &[CommentNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id()).collect()
    }

    fn preorder(roots: &[CommentNode]) -> Vec<(usize, String)> {
        walk(roots)
            .map(|v| (v.depth, v.node.id().to_string()))
            .collect()
    }

    #[test]
    fn test_single_root() {
        let tree = build_tree(&[Comment::new("1", "root")]);
        assert_eq!(ids(&tree), vec!["1"]);
        assert!(tree[0].replies.is_empty());
        assert_eq!(tree[0].placement, Placement::Root);
    }

    #[test]
    fn test_reply_nested_under_parent() {
        let tree = build_tree(&[
            Comment::new("1", "root"),
            Comment::new("2", "reply").reply_to("1"),
        ]);
        assert_eq!(ids(&tree), vec!["1"]);
        assert_eq!(ids(&tree[0].replies), vec!["2"]);
        assert_eq!(tree[0].replies[0].placement, Placement::Reply);
        assert!(tree[0].replies[0].replies.is_empty());
    }

    #[test]
    fn test_reply_before_parent_links_the_same() {
        let in_order = build_tree(&[
            Comment::new("1", "root"),
            Comment::new("2", "reply").reply_to("1"),
        ]);
        let out_of_order = build_tree(&[
            Comment::new("2", "reply").reply_to("1"),
            Comment::new("1", "root"),
        ]);
        assert_eq!(in_order, out_of_order);
    }

    #[test]
    fn test_missing_parent_becomes_orphaned_root() {
        let tree = build_tree(&[Comment::new("2", "orphan").reply_to("99")]);
        assert_eq!(ids(&tree), vec!["2"]);
        assert!(tree[0].replies.is_empty());
        assert_eq!(tree[0].placement, Placement::Orphaned);
        assert!(tree[0].placement.is_detached());
        assert_eq!(tree[0].comment.parent_ref.as_deref(), Some("99"));
    }

    #[test]
    fn test_multi_level() {
        let tree = build_tree(&[
            Comment::new("1", ""),
            Comment::new("2", "").reply_to("1"),
            Comment::new("3", "").reply_to("2"),
        ]);
        assert_eq!(ids(&tree), vec!["1"]);
        assert_eq!(ids(&tree[0].replies), vec!["2"]);
        assert_eq!(ids(&tree[0].replies[0].replies), vec!["3"]);
        assert!(tree[0].replies[0].replies[0].replies.is_empty());
        assert_eq!(tree[0].descendant_count(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree(&[]).is_empty());
        assert_eq!(walk(&[]).count(), 0);
    }

    #[test]
    fn test_sibling_replies_keep_input_order() {
        let tree = build_tree(&[
            Comment::new("c", "").reply_to("a"),
            Comment::new("a", ""),
            Comment::new("b", "").reply_to("a"),
            Comment::new("x", ""),
            Comment::new("d", "").reply_to("a"),
        ]);
        assert_eq!(ids(&tree), vec!["a", "x"]);
        assert_eq!(ids(&tree[0].replies), vec!["c", "b", "d"]);
    }

    #[test]
    fn test_passthrough_fields_survive() {
        let mut comment = Comment::new("1", "hello");
        comment.author_ref = Some("Ana".to_string());
        comment.timestamp = Some("2025-06-26T10:00:00Z".to_string());
        let tree = build_tree(&[comment.clone()]);
        assert_eq!(tree[0].comment, comment);
    }

    #[test]
    fn test_two_cycle_is_broken_at_first_member() {
        let tree = build_tree(&[
            Comment::new("a", "").reply_to("b"),
            Comment::new("b", "").reply_to("a"),
        ]);
        assert_eq!(ids(&tree), vec!["a"]);
        assert_eq!(tree[0].placement, Placement::CycleBroken);
        assert_eq!(ids(&tree[0].replies), vec!["b"]);
        assert_eq!(tree[0].replies[0].placement, Placement::Reply);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let tree = build_tree(&[Comment::new("a", "").reply_to("a")]);
        assert_eq!(ids(&tree), vec!["a"]);
        assert_eq!(tree[0].placement, Placement::CycleBroken);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn test_cycle_with_tail_keeps_every_comment() {
        // t -> b -> c -> d -> b
        let tree = build_tree(&[
            Comment::new("t", "").reply_to("b"),
            Comment::new("c", "").reply_to("b"),
            Comment::new("d", "").reply_to("c"),
            Comment::new("b", "").reply_to("d"),
            Comment::new("r", ""),
        ]);
        assert_eq!(walk(&tree).count(), 5);
        assert_eq!(ids(&tree), vec!["c", "r"]);
        assert_eq!(
            preorder(&tree),
            vec![
                (0, "c".to_string()),
                (1, "d".to_string()),
                (2, "b".to_string()),
                (3, "t".to_string()),
                (0, "r".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_are_all_kept() {
        let tree = build_tree(&[
            Comment::new("1", "first"),
            Comment::new("1", "second"),
            Comment::new("2", "").reply_to("1"),
        ]);
        assert_eq!(walk(&tree).count(), 3);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.content, "first");
        assert!(tree[0].replies.is_empty());
        assert_eq!(tree[1].comment.content, "second");
        assert_eq!(ids(&tree[1].replies), vec!["2"]);
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let tree = build_tree(&[
            Comment::new("1", ""),
            Comment::new("2", ""),
            Comment::new("1a", "").reply_to("1"),
            Comment::new("1a1", "").reply_to("1a"),
            Comment::new("1b", "").reply_to("1"),
            Comment::new("2a", "").reply_to("2"),
        ]);
        assert_eq!(
            preorder(&tree),
            vec![
                (0, "1".to_string()),
                (1, "1a".to_string()),
                (2, "1a1".to_string()),
                (1, "1b".to_string()),
                (0, "2".to_string()),
                (1, "2a".to_string()),
            ]
        );
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let depth = 50_000;
        let comments: Vec<Comment> = (0..depth)
            .map(|i| {
                let c = Comment::new(i.to_string(), "");
                if i == 0 {
                    c
                } else {
                    c.reply_to((i - 1).to_string())
                }
            })
            .collect();
        let tree = build_tree_owned(comments);
        assert_eq!(walk(&tree).count(), depth);
        let last = walk(&tree).last().unwrap();
        assert_eq!(last.depth, depth - 1);
        assert_eq!(last.node.id(), (depth - 1).to_string());
        drop(tree);
    }

    #[test]
    fn test_deep_thread_dropped_with_its_owner() {
        let depth = 50_000;
        let mut comments = vec![Comment::new("r", "")];
        comments.extend((0..depth).map(|i| {
            let parent = if i == 0 { "r".to_string() } else { (i - 1).to_string() };
            Comment::new(i.to_string(), "").reply_to(parent)
        }));
        let mut root = build_tree_owned(comments).remove(0);
        assert_eq!(root.descendant_count(), depth);
        root.replies.clear();
        assert_eq!(root.descendant_count(), 0);
    }

    #[test]
    fn test_find() {
        let tree = build_tree(&[
            Comment::new("1", "root"),
            Comment::new("2", "nested").reply_to("1"),
        ]);
        assert_eq!(find(&tree, "2").map(|n| n.comment.content.as_str()), Some("nested"));
        assert!(find(&tree, "3").is_none());
    }

    #[test]
    fn test_node_serializes_flat() {
        let tree = build_tree(&[Comment::new("1", "root")]);
        let json = serde_json::to_value(&tree[0]).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["content"], "root");
        assert_eq!(json["placement"], "root");
        assert_eq!(json["replies"], serde_json::json!([]));
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Threads without cycles, shuffled so replies often precede parents.
    /// A parent pick at or past the comment's own position becomes a dangling id.
    fn acyclic_thread() -> impl Strategy<Value = Vec<Comment>> {
        prop::collection::vec(prop::option::of(0usize..48), 0..40)
            .prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let c = Comment::new(format!("c{i}"), format!("body {i}"));
                        match p {
                            Some(p) if p < i => c.reply_to(format!("c{p}")),
                            Some(p) => c.reply_to(format!("missing{p}")),
                            None => c,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    }

    /// Arbitrary parent pointers, cycles and self-references included.
    fn any_thread() -> impl Strategy<Value = Vec<Comment>> {
        prop::collection::vec(prop::option::of(0usize..32), 0..32).prop_map(|parents| {
            parents
                .into_iter()
                .enumerate()
                .map(|(i, p)| {
                    let c = Comment::new(format!("c{i}"), "");
                    match p {
                        Some(p) => c.reply_to(format!("c{p}")),
                        None => c,
                    }
                })
                .collect()
        })
    }

    /// (child id, tree parent id) for every node in the forest.
    fn tree_parents(roots: &[CommentNode]) -> Vec<(String, Option<String>)> {
        let mut out: Vec<(String, Option<String>)> =
            roots.iter().map(|r| (r.id().to_string(), None)).collect();
        for visit in walk(roots) {
            for reply in &visit.node.replies {
                out.push((reply.id().to_string(), Some(visit.node.id().to_string())));
            }
        }
        out
    }

    proptest! {
        #[test]
        fn prop_conservation(comments in any_thread()) {
            let tree = build_tree(&comments);
            let seen: Vec<&str> = walk(&tree).map(|v| v.node.id()).collect();
            prop_assert_eq!(seen.len(), comments.len());
            let unique: HashSet<&str> = seen.iter().copied().collect();
            prop_assert_eq!(unique.len(), comments.len());
        }

        #[test]
        fn prop_replies_match_parent_ref(comments in any_thread()) {
            let tree = build_tree(&comments);
            for visit in walk(&tree) {
                for reply in &visit.node.replies {
                    prop_assert_eq!(reply.comment.parent_ref.as_deref(), Some(visit.node.id()));
                }
            }
        }

        #[test]
        fn prop_parent_fidelity_and_orphans(comments in acyclic_thread()) {
            let tree = build_tree(&comments);
            let present: HashSet<&str> = comments.iter().map(|c| c.id.as_str()).collect();
            let placed: std::collections::HashMap<String, Option<String>> =
                tree_parents(&tree).into_iter().collect();
            prop_assert_eq!(placed.len(), comments.len());
            for c in &comments {
                let expected = c.parent_ref.clone().filter(|p| present.contains(p.as_str()));
                prop_assert_eq!(placed.get(&c.id), Some(&expected));
            }
        }

        #[test]
        fn prop_order_preserved(comments in acyclic_thread()) {
            let tree = build_tree(&comments);
            let position: std::collections::HashMap<&str, usize> =
                comments.iter().enumerate().map(|(i, c)| (c.id.as_str(), i)).collect();
            let is_sorted = |nodes: &[CommentNode]| {
                nodes.windows(2).all(|w| position[w[0].id()] < position[w[1].id()])
            };
            prop_assert!(is_sorted(&tree[..]));
            for visit in walk(&tree) {
                prop_assert!(is_sorted(&visit.node.replies[..]));
            }
        }

        #[test]
        fn prop_idempotent(comments in any_thread()) {
            prop_assert_eq!(build_tree(&comments), build_tree(&comments));
        }
    }
}
