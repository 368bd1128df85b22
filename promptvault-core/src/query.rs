//! Search input: what the user typed and which tags are selected, plus the paging and
//! sorting knobs sent along with it.

use crate::prompt::normalize_tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Shown when a search with an active query or filter comes back empty.
pub const NO_MATCHES_MESSAGE: &str = "No prompts found matching your search criteria.";

/// Shown when the vault is simply empty.
pub const NO_PROMPTS_MESSAGE: &str = "No prompts yet. Create your first prompt to get started!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "updated_at" => Ok(SortField::UpdatedAt),
            "title" => Ok(SortField::Title),
            other => Err(format!(
                "unknown sort field '{}', expected created_at, updated_at or title",
                other
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free text plus the selected tag filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub tags: BTreeSet<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> SearchQuery {
        SearchQuery {
            text: text.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> SearchQuery
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(|t| normalize_tag(t.as_ref()))
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || !self.tags.is_empty()
    }

    /// Selects the tag if it is not selected yet, deselects it otherwise.
    /// Returns whether the tag is selected afterwards.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        toggle(&mut self.tags, tag)
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn empty_state_message(&self) -> &'static str {
        empty_state_message(self.is_active())
    }
}

pub(crate) fn toggle(tags: &mut BTreeSet<String>, tag: &str) -> bool {
    let tag = normalize_tag(tag);
    if tag.is_empty() {
        return false;
    }
    if tags.remove(&tag) {
        false
    } else {
        tags.insert(tag);
        true
    }
}

pub fn empty_state_message(filter_active: bool) -> &'static str {
    if filter_active {
        NO_MATCHES_MESSAGE
    } else {
        NO_PROMPTS_MESSAGE
    }
}

/// Which slice of the result set to ask for, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    pub fn with_limit(mut self, limit: u32) -> PageRequest {
        self.limit = limit;
        self
    }
}

/// Everything one `GET /api/prompts` call carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: SearchQuery,
    pub page: PageRequest,
}

impl SearchParams {
    pub fn new(query: SearchQuery, page: PageRequest) -> SearchParams {
        SearchParams { query, page }
    }

    /// Query-string pairs in the form the service expects. Tags repeat the `tags` key
    /// once per tag; a blank query text is left out entirely.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5 + self.query.tags.len());
        let text = self.query.text.trim();
        if !text.is_empty() {
            pairs.push(("query", text.to_string()));
        }
        for tag in &self.query.tags {
            pairs.push(("tags", tag.clone()));
        }
        pairs.push(("limit", self.page.limit.to_string()));
        pairs.push(("offset", self.page.offset.to_string()));
        pairs.push(("sort_by", self.page.sort_by.to_string()));
        pairs.push(("sort_order", self.page.sort_order.to_string()));
        pairs
    }
}
