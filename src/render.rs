//! Plain-text rendering of a comment thread.

use crate::comment_tree::{walk, CommentNode, Placement};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Render the forest in display order, one block per comment, nested
/// replies indented one level deeper than their parent.
pub fn render_thread(roots: &[CommentNode]) -> String {
    let mut out = String::new();
    for visit in walk(roots) {
        let pad = INDENT.repeat(visit.depth);
        let comment = &visit.node.comment;
        let author = comment.author_ref.as_deref().unwrap_or("Anonymous");
        let when = comment.timestamp.as_deref().unwrap_or("Unknown");

        let _ = write!(out, "{pad}{author} · {when}  [{}]", comment.id);
        match visit.node.placement {
            Placement::Orphaned => out.push_str("  (reply to a missing comment)"),
            Placement::CycleBroken => out.push_str("  (reply cycle broken here)"),
            Placement::Root | Placement::Reply => {}
        }
        out.push('\n');

        for line in comment.content.lines() {
            let _ = writeln!(out, "{pad}  {line}");
        }
    }
    out
}

/// First `max` characters of `content`, with `...` appended when cut.
pub fn preview(content: &str, max: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
