//! # Prompt Store
//!
//! [`PromptStore`] is the client-side cache of the service's state: the current page of
//! prompts, the tag vocabulary, a loading flag, the last search error and pagination.
//! It is the only thing that mutates that state, and it only does so after the service
//! has confirmed the change.
//!
//! Subscribers learn about changes through [`PromptStore::subscribe`] and read the
//! current state with [`PromptStore::snapshot`].
//!
//! Reconciliation is the same for every write: the prompt the service returned is
//! spliced into the local list (head-insert on create, in-place replacement on update,
//! removal on delete) and the tag vocabulary is refetched. A failed write leaves the
//! local state exactly as it was.
//!
//! Searches are sequenced. Each [`PromptStore::refresh`] takes a ticket, and a response
//! that comes back after a newer search was started is dropped instead of overwriting
//! fresher results.

use crate::error::{ErrorDescriptor, Result};
use crate::prompt::{Pagination, Prompt, PromptDraft, PromptId};
use crate::query::{PageRequest, SearchParams, SearchQuery};
use crate::registry::PromptApi;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Everything a view needs to render the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub prompts: Vec<Prompt>,
    pub tags: BTreeSet<String>,
    pub loading: bool,
    pub error: Option<ErrorDescriptor>,
    pub pagination: Pagination,
    in_flight: usize,
    latest_ticket: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    LoadingChanged(bool),
    PromptsReplaced,
    PromptCreated(PromptId),
    PromptUpdated(PromptId),
    PromptDeleted(PromptId),
    TagsReplaced,
    ErrorChanged(Option<ErrorDescriptor>),
}

/// How a call to [`PromptStore::refresh`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Results replaced the prompt list.
    Applied,
    /// The search failed; the error is in the state and the list is empty.
    Failed,
    /// A newer search was started while this one was in flight; its response was dropped.
    Stale,
}

pub struct PromptStore<A> {
    api: A,
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl<A> PromptStore<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.lock().prompts.clone()
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.lock().tags.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<ErrorDescriptor> {
        self.lock().error.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // State is plain data; a panic elsewhere cannot leave it half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_error(&self, error: Option<ErrorDescriptor>) {
        let changed = {
            let mut state = self.lock();
            if state.error == error {
                false
            } else {
                state.error = error.clone();
                true
            }
        };
        if changed {
            self.emit(StoreEvent::ErrorChanged(error));
        }
    }
}

impl<A: PromptApi> PromptStore<A> {
    /// Runs a search and replaces the prompt list and pagination with its results.
    ///
    /// On failure the error is recorded in the state and the list is emptied; the error
    /// is not returned. The loading flag is raised for the duration of the call and
    /// released exactly once however the call ends.
    pub async fn refresh(&self, query: &SearchQuery, page: PageRequest) -> RefreshOutcome {
        let ticket = {
            let mut state = self.lock();
            state.latest_ticket += 1;
            state.latest_ticket
        };
        let _loading = LoadingGuard::acquire(self);
        self.set_error(None);

        let params = SearchParams::new(query.clone(), page);
        let result = self.api.search(&params).await;

        let mut state = self.lock();
        if state.latest_ticket != ticket {
            tracing::debug!(ticket, latest = state.latest_ticket, "Discarding stale search response");
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(page) => {
                tracing::debug!(count = page.prompts.len(), total = page.total, "Search returned prompts");
                state.pagination = page.pagination();
                state.prompts = page.prompts;
                drop(state);
                self.emit(StoreEvent::PromptsReplaced);
                RefreshOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "Search failed");
                let descriptor = ErrorDescriptor::from(&err);
                state.prompts.clear();
                state.error = Some(descriptor.clone());
                drop(state);
                self.emit(StoreEvent::ErrorChanged(Some(descriptor)));
                self.emit(StoreEvent::PromptsReplaced);
                RefreshOutcome::Failed
            }
        }
    }

    /// Refetches the tag vocabulary. Best effort: a failure is logged and leaves an
    /// empty vocabulary behind, it never becomes a user-facing error.
    pub async fn refresh_tags(&self) {
        if let Err(err) = self.list_tags().await {
            tracing::warn!(error = %err, "Failed to fetch tags");
            self.replace_tags(BTreeSet::new());
        }
    }

    /// Fetches the tag vocabulary, stores it and returns it. Unlike
    /// [`PromptStore::refresh_tags`] a failure is returned and the stored tags are left alone.
    pub async fn list_tags(&self) -> Result<BTreeSet<String>> {
        let tags: BTreeSet<String> = self
            .api
            .list_tags()
            .await?
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        self.replace_tags(tags.clone());
        Ok(tags)
    }

    fn replace_tags(&self, tags: BTreeSet<String>) {
        self.lock().tags = tags;
        self.emit(StoreEvent::TagsReplaced);
    }

    pub async fn get(&self, id: &PromptId) -> Result<Prompt> {
        self.api.get_by_id(id).await
    }

    /// Creates a prompt and puts it at the head of the local list.
    ///
    /// # Returns
    ///
    /// * `Ok(Prompt)` - The prompt as stored by the service.
    /// * `VaultError::Validation` - If title or content is blank; nothing is sent.
    /// * Any error from the service, with the local list untouched.
    pub async fn create(&self, draft: &PromptDraft) -> Result<Prompt> {
        let draft = draft.normalized();
        draft.validate()?;

        let prompt = self.api.create(&draft).await?;
        self.lock().prompts.insert(0, prompt.clone());
        self.emit(StoreEvent::PromptCreated(prompt.id.clone()));

        self.refresh_tags().await;
        Ok(prompt)
    }

    /// Updates a prompt and replaces the local entry with the same id, keeping its position.
    pub async fn update(&self, id: &PromptId, draft: &PromptDraft) -> Result<Prompt> {
        let draft = draft.normalized();
        draft.validate()?;

        let prompt = self.api.update(id, &draft).await?;
        let replaced = {
            let mut state = self.lock();
            match state.prompts.iter_mut().find(|p| p.id == *id) {
                Some(slot) => {
                    *slot = prompt.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.emit(StoreEvent::PromptUpdated(id.clone()));
        } else {
            tracing::debug!(id = %id, "Updated prompt is not in the current page");
        }

        self.refresh_tags().await;
        Ok(prompt)
    }

    /// Deletes a prompt and removes the one local entry with that id.
    pub async fn delete(&self, id: &PromptId) -> Result<()> {
        self.api.delete(id).await?;
        let removed = {
            let mut state = self.lock();
            match state.prompts.iter().position(|p| p.id == *id) {
                Some(index) => {
                    state.prompts.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.emit(StoreEvent::PromptDeleted(id.clone()));
        }

        self.refresh_tags().await;
        Ok(())
    }
}

/// Holds the loading flag up while at least one search is in flight.
struct LoadingGuard<'a, A> {
    store: &'a PromptStore<A>,
}

impl<'a, A> LoadingGuard<'a, A> {
    fn acquire(store: &'a PromptStore<A>) -> Self {
        let started = {
            let mut state = store.lock();
            state.in_flight += 1;
            let started = !state.loading;
            state.loading = true;
            started
        };
        if started {
            store.emit(StoreEvent::LoadingChanged(true));
        }
        LoadingGuard { store }
    }
}

impl<A> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        let finished = {
            let mut state = self.store.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight == 0 {
                state.loading = false;
                true
            } else {
                false
            }
        };
        if finished {
            self.store.emit(StoreEvent::LoadingChanged(false));
        }
    }
}
