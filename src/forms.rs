//! Form state and validation for the forum and event editors.
//!
//! Drafts hold raw user input; `validate`/`into_*` turn them into request
//! payloads or a [`FormError`].

use crate::error::FormError;
use crate::schema::{
    DiscountOption, EventTime, ForumPayload, ForumPost, NewComment, NewEvent, PricingTier,
};
use serde::{Deserialize, Deserializer};

/// Split comma separated tags, trimming and dropping empty entries.
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Ordered, duplicate-free tag list edited one tag at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagList {
    tags: Vec<String>,
}

impl TagList {
    pub fn new(tags: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self::default();
        for tag in tags {
            list.add(&tag);
        }
        list
    }

    /// Returns false when the tag is blank or already present.
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }
}

// ============================================================================
// Forum
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ForumDraft {
    pub title: String,
    pub body: String,
    pub tags: TagList,
}

impl ForumDraft {
    /// Pre-fill the editor from an existing post.
    pub fn from_post(post: &ForumPost) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            tags: TagList::new(post.tags.iter().cloned()),
        }
    }

    pub fn validate(&self) -> Result<ForumPayload, FormError> {
        let title = self.title.trim();
        let body = self.body.trim();
        if title.is_empty() || body.is_empty() {
            return Err(FormError::TitleAndBodyRequired);
        }
        Ok(ForumPayload {
            title: title.to_string(),
            body: body.to_string(),
            tags: self.tags.as_slice().to_vec(),
        })
    }
}

/// Text of a new comment, or of a reply when `reply_to` is given.
#[derive(Debug, Clone, Default)]
pub struct ReplyDraft {
    pub content: String,
}

impl ReplyDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn into_comment(
        self,
        forum_id: &str,
        user_id: &str,
        reply_to: Option<&str>,
    ) -> Result<NewComment, FormError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(FormError::ReplyRequired);
        }
        Ok(NewComment {
            forum_id: forum_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            reply_to: reply_to.map(str::to_owned),
        })
    }
}

// ============================================================================
// Events
// ============================================================================

/// Raw pricing tier input; numbers are still text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingInput {
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "text_or_number")]
    pub price: String,
    pub tags: String,
    #[serde(deserialize_with = "text_or_number")]
    pub slots_available: String,
}

impl PricingInput {
    pub fn to_tier(&self) -> Result<PricingTier, FormError> {
        if self.name.trim().is_empty() || self.price.trim().is_empty() {
            return Err(FormError::PricingIncomplete);
        }
        Ok(PricingTier {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            price: parse_number("price", &self.price)?,
            tags: split_tags(&self.tags),
            slots_available: parse_optional("slotsAvailable", &self.slots_available)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscountInput {
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub total_members_needed: String,
    #[serde(deserialize_with = "text_or_number")]
    pub percentage_discount: String,
}

impl DiscountInput {
    pub fn to_option(&self) -> Result<DiscountOption, FormError> {
        if self.name.trim().is_empty() || self.percentage_discount.trim().is_empty() {
            return Err(FormError::DiscountIncomplete);
        }
        Ok(DiscountOption {
            name: self.name.trim().to_string(),
            total_members_needed: parse_optional("totalMembersNeeded", &self.total_members_needed)?
                .unwrap_or(1),
            percentage_discount: parse_number("percentageDiscount", &self.percentage_discount)?,
        })
    }
}

/// The event creation form, as read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub event_name: String,
    pub date: String,
    pub event_time: EventTime,
    pub place: String,
    pub organizer: String,
    pub description: String,
    pub duration: String,
    #[serde(deserialize_with = "text_or_number")]
    pub max_attendees: String,
    #[serde(deserialize_with = "text_or_number")]
    pub available_slots: String,
    pub tags: String,
    pub image: Option<String>,
    pub pricing: Vec<PricingInput>,
    pub discount_options: Vec<DiscountInput>,
}

impl EventDraft {
    pub fn into_payload(self) -> Result<NewEvent, FormError> {
        let required = [
            ("eventName", &self.event_name),
            ("date", &self.date),
            ("eventTime.from", &self.event_time.from),
            ("eventTime.to", &self.event_time.to),
            ("place", &self.place),
            ("organizer", &self.organizer),
            ("description", &self.description),
            ("duration", &self.duration),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(FormError::FieldRequired { field: *field });
        }

        let pricing = self
            .pricing
            .iter()
            .map(PricingInput::to_tier)
            .collect::<Result<Vec<_>, _>>()?;
        let discount_options = self
            .discount_options
            .iter()
            .map(DiscountInput::to_option)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewEvent {
            max_attendees: parse_count("maxAttendees", &self.max_attendees)?,
            available_slots: parse_count("availableSlots", &self.available_slots)?,
            tags: split_tags(&self.tags),
            image: self.image.filter(|i| !i.is_empty()),
            event_name: self.event_name,
            date: self.date,
            event_time: self.event_time,
            place: self.place,
            organizer: self.organizer,
            description: self.description,
            duration: self.duration,
            pricing,
            discount_options,
        })
    }
}

/// Numeric form fields arrive as text from an editor, or as numbers when the
/// form file was written by hand.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, FormError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

fn parse_optional(field: &'static str, raw: &str) -> Result<Option<u32>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| FormError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Required count of at least one.
fn parse_count(field: &'static str, raw: &str) -> Result<u32, FormError> {
    match parse_optional(field, raw)? {
        None => Err(FormError::FieldRequired { field }),
        Some(0) => Err(FormError::InvalidNumber {
            field,
            value: raw.trim().to_string(),
        }),
        Some(n) => Ok(n),
    }
}
