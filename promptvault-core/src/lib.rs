//! # Prompt Vault Core
//!
//! This crate provides the client-side core of Prompt Vault, a personal library of LLM
//! prompts kept by a remote REST service.
//!
//! The vault stores short text records with a title, content and tags. This crate keeps a
//! local view of them in sync with the service while the user searches, filters, creates,
//! edits and deletes.
//!
//! # Modules
//!
//! - [`client`] - HTTP implementation of the service API
//! - [`debounce`] - Settles a rapidly changing value before it is acted upon
//! - [`error`] - Error taxonomy shared by every operation
//! - [`prompt`] - Core prompt data structures
//! - [`query`] - Search text, tag filters, paging and sorting
//! - [`registry`] - The [`registry::PromptApi`] trait
//! - [`session`] - Debounced search that drives the store
//! - [`store`] - Local cache of prompts and tags with change notifications
//!
//! # Examples
//!
//! ```rust,no_run
//! use promptvault_core::client::HttpPromptApi;
//! use promptvault_core::prompt::PromptDraft;
//! use promptvault_core::query::{PageRequest, SearchQuery};
//! use promptvault_core::store::PromptStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), promptvault_core::error::VaultError> {
//! let api = HttpPromptApi::new("http://localhost:8000")?;
//! let store = PromptStore::new(api);
//!
//! let draft = PromptDraft::new("Summarize", "Summarize the following text:").with_tags(["Writing"]);
//! store.create(&draft).await?;
//!
//! store.refresh(&SearchQuery::new("summarize"), PageRequest::default()).await;
//! for prompt in store.prompts() {
//!     println!("{} {:?}", prompt.title, prompt.tags);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod debounce;
pub mod error;
pub mod prompt;
pub mod query;
pub mod registry;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;
