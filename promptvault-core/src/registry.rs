//! # Prompt Registry
//!
//! This module defines the seam between the store and whatever serves prompts.
//!
//! - [`PromptApi`] trait - the six operations the remote service exposes
//!
//! [`crate::client::HttpPromptApi`] talks to the real service; tests plug in an
//! in-memory implementation.

use crate::error::Result;
use crate::prompt::{Prompt, PromptDraft, PromptId, PromptPage};
use crate::query::SearchParams;
use async_trait::async_trait;

#[async_trait]
pub trait PromptApi: Send + Sync {
    /// Full-text and tag search with paging.
    async fn search(&self, params: &SearchParams) -> Result<PromptPage>;

    /// Fails with `VaultError::NotFound` when no prompt has this id.
    async fn get_by_id(&self, id: &PromptId) -> Result<Prompt>;

    async fn create(&self, draft: &PromptDraft) -> Result<Prompt>;

    async fn update(&self, id: &PromptId, draft: &PromptDraft) -> Result<Prompt>;

    /// Fails with `VaultError::NotFound` when the prompt is already gone.
    async fn delete(&self, id: &PromptId) -> Result<()>;

    /// Every distinct tag currently in use, as the service sees it.
    async fn list_tags(&self) -> Result<Vec<String>>;
}
