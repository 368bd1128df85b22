//! # Search Session
//!
//! Keeps the store's prompt list in step with what the user is searching for. The query
//! text goes through a [`Debouncer`]; tag selection does not. Whenever the effective
//! query (settled text plus selected tags) changes, a new search is started. Searches
//! may overlap; the store's ticketing decides which results win.
//!
//! Dropping the session stops the debouncer and aborts any search it started that is
//! still in flight.

use crate::debounce::Debouncer;
use crate::query::{PageRequest, SearchQuery, toggle};
use crate::registry::PromptApi;
use crate::store::PromptStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct SearchSession<A> {
    store: Arc<PromptStore<A>>,
    text: Debouncer<String>,
    tags: watch::Sender<BTreeSet<String>>,
    page: PageRequest,
    driver: JoinHandle<()>,
}

impl<A: PromptApi + 'static> SearchSession<A> {
    /// Loads the first page and the tag vocabulary, then starts following query changes.
    pub async fn start(store: Arc<PromptStore<A>>, delay: Duration, page: PageRequest) -> Self {
        let initial = SearchQuery::default();
        tokio::join!(store.refresh(&initial, page), store.refresh_tags());

        let text = Debouncer::new(String::new(), delay);
        let (tags, tags_rx) = watch::channel(BTreeSet::new());
        let driver = tokio::spawn(drive(Arc::clone(&store), text.subscribe(), tags_rx, page));

        Self {
            store,
            text,
            tags,
            page,
            driver,
        }
    }

    /// Refetches prompts for the current effective query, and the tag vocabulary.
    pub async fn reload(&self) {
        let query = self.effective_query();
        tokio::join!(
            self.store.refresh(&query, self.page),
            self.store.refresh_tags()
        );
    }
}

impl<A> SearchSession<A> {
    pub fn store(&self) -> &Arc<PromptStore<A>> {
        &self.store
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.text.set(text.into());
    }

    /// Returns whether the tag is selected afterwards.
    pub fn toggle_tag(&self, tag: &str) -> bool {
        let mut selected = false;
        self.tags.send_if_modified(|tags| {
            let before = tags.len();
            selected = toggle(tags, tag);
            tags.len() != before
        });
        selected
    }

    pub fn clear_tags(&self) {
        self.tags.send_if_modified(|tags| {
            if tags.is_empty() {
                return false;
            }
            tags.clear();
            true
        });
    }

    pub fn selected_tags(&self) -> BTreeSet<String> {
        self.tags.borrow().clone()
    }

    /// What the user has entered so far, settled or not.
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            text: self.text.pending(),
            tags: self.selected_tags(),
        }
    }

    /// The query the prompt list currently reflects.
    pub fn effective_query(&self) -> SearchQuery {
        SearchQuery {
            text: self.text.current(),
            tags: self.selected_tags(),
        }
    }

    pub fn empty_state_message(&self) -> &'static str {
        self.query().empty_state_message()
    }
}

impl<A> Drop for SearchSession<A> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive<A: PromptApi + 'static>(
    store: Arc<PromptStore<A>>,
    mut text: watch::Receiver<String>,
    mut tags: watch::Receiver<BTreeSet<String>>,
    page: PageRequest,
) {
    let mut last = SearchQuery::default();
    // Owned here so that aborting the driver aborts the searches too.
    let mut searches = JoinSet::new();

    loop {
        tokio::select! {
            changed = text.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            changed = tags.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            Some(_) = searches.join_next(), if !searches.is_empty() => continue,
        }

        let query = SearchQuery {
            text: text.borrow_and_update().clone(),
            tags: tags.borrow_and_update().clone(),
        };
        if query == last {
            continue;
        }
        last = query.clone();

        tracing::debug!(text = %query.text, tags = ?query.tags, "Query changed, searching");
        let store = Arc::clone(&store);
        searches.spawn(async move {
            store.refresh(&query, page).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{NO_MATCHES_MESSAGE, NO_PROMPTS_MESSAGE};
    use crate::testing::{MockApi, Op, sample_prompt};
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(300);

    async fn session() -> SearchSession<MockApi> {
        let api = MockApi::with_prompts(vec![
            sample_prompt(1, "rust ownership", &["rust"]),
            sample_prompt(2, "python typing", &["python"]),
            sample_prompt(3, "rust async", &["rust", "async"]),
        ]);
        SearchSession::start(Arc::new(PromptStore::new(api)), DELAY, PageRequest::default()).await
    }

    async fn quiet() {
        sleep(DELAY * 3).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn search_count(session: &SearchSession<MockApi>) -> usize {
        session.store().api().calls(Op::Search)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_loads_prompts_and_tags_once() {
        let session = session().await;

        assert_eq!(1, search_count(&session));
        assert_eq!(1, session.store().api().calls(Op::ListTags));
        assert_eq!(3, session.store().prompts().len());
        assert_eq!(3, session.store().tags().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_searches_once_with_final_text() {
        let session = session().await;

        for text in ["r", "ru", "rus", "rust"] {
            session.set_text(text);
            sleep(Duration::from_millis(50)).await;
        }
        quiet().await;

        assert_eq!(2, search_count(&session));
        let last = session.store().api().search_calls().pop().unwrap();
        assert_eq!("rust", last.query.text);
        assert_eq!(2, session.store().prompts().len());
        assert_eq!("rust", session.effective_query().text);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tag_toggle_searches_without_waiting_for_debounce() {
        let session = session().await;

        assert!(session.toggle_tag("Python"));
        sleep(Duration::from_millis(1)).await;

        assert_eq!(2, search_count(&session));
        let last = session.store().api().search_calls().pop().unwrap();
        assert!(last.query.tags.contains("python"));
        assert_eq!(vec!["python typing"], session.store().prompts().iter().map(|p| p.title.as_str()).collect::<Vec<_>>());

        assert!(!session.toggle_tag("python"));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(3, search_count(&session));
        assert_eq!(3, session.store().prompts().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_search_when_effective_query_is_unchanged() {
        let session = session().await;

        session.toggle_tag("   ");
        session.clear_tags();
        session.set_text("a");
        session.set_text("");
        quiet().await;

        assert_eq!(1, search_count(&session));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_state_message_follows_raw_query() {
        let session = session().await;
        assert_eq!(NO_PROMPTS_MESSAGE, session.empty_state_message());

        session.set_text("nothing matches this");
        assert_eq!(NO_MATCHES_MESSAGE, session.empty_state_message());

        session.set_text("");
        session.toggle_tag("rust");
        assert_eq!(NO_MATCHES_MESSAGE, session.empty_state_message());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_pending_search() {
        let session = session().await;
        let store = Arc::clone(session.store());

        session.set_text("rust");
        sleep(Duration::from_millis(100)).await;
        drop(session);
        quiet().await;

        assert_eq!(1, store.api().calls(Op::Search));
        assert_eq!(3, store.prompts().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_uses_effective_query() {
        let session = session().await;
        session.set_text("python");
        quiet().await;

        session.reload().await;

        assert_eq!(3, search_count(&session));
        assert_eq!(2, session.store().api().calls(Op::ListTags));
        assert_eq!(1, session.store().prompts().len());
    }
}
