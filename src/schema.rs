//! Backend payload types.
//!
//! Field names follow the backend's JSON (`_id`, camelCase). Response
//! envelopes are kept private to the API client; records are public.

use crate::comment_tree::Comment;
use serde::{Deserialize, Serialize};

/// A reference to a user that the backend sends either as a bare id or as a
/// populated profile object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    Profile {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl UserRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            UserRef::Id(id) => Some(id.as_str()),
            UserRef::Profile { id, .. } => id.as_deref(),
        }
    }

    /// Name when populated, otherwise the raw id.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            UserRef::Id(id) => Some(id.as_str()),
            UserRef::Profile { name: Some(name), .. } => Some(name.as_str()),
            UserRef::Profile { id, .. } => id.as_deref(),
        }
    }
}

/// The signed-in administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Forum
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ForumPost {
    /// Only the creator may edit or delete a post.
    pub fn is_created_by(&self, admin_id: &str) -> bool {
        self.created_by
            .as_ref()
            .and_then(UserRef::id)
            .is_some_and(|id| !id.is_empty() && id == admin_id)
    }
}

/// Body for creating or updating a forum post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForumPayload {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// A comment row as listed by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserRef>,
    #[serde(default)]
    pub added_time: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            parent_ref: row.reply_to.filter(|r| !r.is_empty()),
            content: row.content.unwrap_or_default(),
            author_ref: row
                .user_id
                .as_ref()
                .and_then(UserRef::display_name)
                .map(str::to_owned),
            timestamp: row.added_time,
        }
    }
}

/// Body for adding a comment or a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub forum_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// A ticket tier offered for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots_available: Option<u32>,
}

/// A group discount: `percentage_discount` off once `total_members_needed` join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountOption {
    pub name: String,
    pub total_members_needed: u32,
    pub percentage_discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub event_name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub event_time: Option<EventTime>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub max_attendees: Option<u32>,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image as supplied at creation (data URL or remote URL), passed through.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub pricing: Vec<PricingTier>,
    #[serde(default)]
    pub discount_options: Vec<DiscountOption>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for creating an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub event_name: String,
    pub date: String,
    pub event_time: EventTime,
    pub place: String,
    pub organizer: String,
    pub description: String,
    pub duration: String,
    pub max_attendees: u32,
    pub available_slots: u32,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub pricing: Vec<PricingTier>,
    pub discount_options: Vec<DiscountOption>,
}
