//! # Prompts
//!
//! Wire-level data structures shared by the API client and the store:
//!
//! - [`Prompt`] - a stored prompt exactly as the service returns it
//! - [`PromptDraft`] - the `{title, content, tags}` payload of create and update
//! - [`PromptPage`] / [`Pagination`] - one page of search results and its bookkeeping
//!
//! The client never assigns identifiers or timestamps; those always come from the service.

use crate::error::{Result, VaultError};
use crate::query::DEFAULT_PAGE_SIZE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Maximum number of tag suggestions offered while typing a tag.
pub const MAX_TAG_SUGGESTIONS: usize = 5;

/// Opaque identifier assigned by the service.
///
/// The service currently hands out integers, but nothing on this side relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromptId(String);

impl PromptId {
    pub fn new(id: impl Into<String>) -> Self {
        PromptId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PromptId {
    fn from(id: &str) -> Self {
        PromptId(id.to_string())
    }
}

impl From<String> for PromptId {
    fn from(id: String) -> Self {
        PromptId(id)
    }
}

impl From<i64> for PromptId {
    fn from(id: i64) -> Self {
        PromptId(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPromptId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for PromptId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawPromptId::deserialize(deserializer)? {
            RawPromptId::Number(n) => PromptId(n.to_string()),
            RawPromptId::Text(s) => PromptId(s),
        })
    }
}

impl Serialize for PromptId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Only canonical integers go out as numbers; "007" stays "007".
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Whether the service has touched this prompt since it was created.
    pub fn was_edited(&self) -> bool {
        self.updated_at != self.created_at
    }

    /// Starts an edit form pre-filled with this prompt's fields.
    pub fn to_draft(&self) -> PromptDraft {
        PromptDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Normalizes a tag the same way the service does: trimmed and lowercased.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// The body of a create or update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl PromptDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> PromptDraft {
        PromptDraft {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> PromptDraft
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.add_tag(tag.as_ref());
        }
        self
    }

    /// Adds a tag after normalizing it.
    ///
    /// # Returns
    ///
    /// * `true` - If the tag was added.
    /// * `false` - If the tag was blank or already present after normalization.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    /// Rejects drafts that the form would not let the user submit.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If both title and content have non-whitespace text.
    /// * `VaultError::Validation` - Naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(VaultError::validation("title", "Title is required"));
        }
        if self.content.trim().is_empty() {
            return Err(VaultError::validation("content", "Content is required"));
        }
        Ok(())
    }

    /// Copy of this draft with every tag normalized and duplicates dropped, keeping
    /// first-seen order.
    pub fn normalized(&self) -> PromptDraft {
        PromptDraft::new(self.title.clone(), self.content.clone()).with_tags(&self.tags)
    }

    /// Vocabulary tags worth offering while the user types `partial`.
    pub fn suggest_tags<'a, I>(&self, vocabulary: I, partial: &str) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let needle = partial.to_lowercase();
        vocabulary
            .into_iter()
            .filter(|tag| !self.tags.contains(tag) && tag.to_lowercase().contains(&needle))
            .map(String::as_str)
            .take(MAX_TAG_SUGGESTIONS)
            .collect()
    }
}

/// Paging bookkeeping echoed from the last search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            total: 0,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            has_more: false,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPage {
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub has_more: bool,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PromptPage {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    /// RFC 3339 first; a naive timestamp is taken to be UTC.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
