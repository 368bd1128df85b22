//! In-memory [`PromptApi`] used by the store and session tests.

use crate::error::{Result, VaultError};
use crate::prompt::{Prompt, PromptDraft, PromptId, PromptPage};
use crate::query::SearchParams;
use crate::registry::PromptApi;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Search,
    GetById,
    Create,
    Update,
    Delete,
    ListTags,
}

#[derive(Default)]
struct MockState {
    prompts: Vec<Prompt>,
    next_id: i64,
    failures: HashMap<Op, VaultError>,
    calls: HashMap<Op, usize>,
    search_calls: Vec<SearchParams>,
    search_delays: VecDeque<Duration>,
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn sample_prompt(id: i64, title: &str, tags: &[&str]) -> Prompt {
    let created_at = base_time() + ChronoDuration::minutes(id);
    Prompt {
        id: PromptId::from(id),
        title: title.to_string(),
        content: format!("{} content", title),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at,
        updated_at: created_at,
    }
}

impl MockApi {
    pub fn with_prompts(prompts: Vec<Prompt>) -> Self {
        let next_id = prompts
            .iter()
            .filter_map(|p| p.id.as_str().parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        MockApi {
            state: Mutex::new(MockState {
                prompts,
                next_id,
                ..MockState::default()
            }),
        }
    }

    /// Every later call to `op` fails with `err` until cleared.
    pub fn fail(&self, op: Op, err: VaultError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    /// Searches sleep for these durations, one per call, in order.
    pub fn delay_searches(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().unwrap().search_delays.extend(delays);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state.lock().unwrap().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn search_calls(&self) -> Vec<SearchParams> {
        self.state.lock().unwrap().search_calls.clone()
    }

    fn begin(&self, op: Op) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_insert(0) += 1;
        match state.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn matches(prompt: &Prompt, params: &SearchParams) -> bool {
    let text = params.query.text.trim().to_lowercase();
    let text_ok = text.is_empty()
        || prompt.title.to_lowercase().contains(&text)
        || prompt.content.to_lowercase().contains(&text);
    let tags_ok = params.query.tags.is_empty() || prompt.tags.iter().any(|t| params.query.tags.contains(t));
    text_ok && tags_ok
}

#[async_trait]
impl PromptApi for MockApi {
    async fn search(&self, params: &SearchParams) -> Result<PromptPage> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.search_calls.push(params.clone());
            state.search_delays.pop_front()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.begin(Op::Search)?;

        let state = self.state.lock().unwrap();
        let hits: Vec<&Prompt> = state.prompts.iter().filter(|p| matches(p, params)).collect();
        let total = hits.len() as u64;
        let limit = params.page.limit;
        let offset = params.page.offset;
        let prompts = hits
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(PromptPage {
            prompts,
            total,
            limit,
            offset,
            has_more: u64::from(offset) + u64::from(limit) < total,
        })
    }

    async fn get_by_id(&self, id: &PromptId) -> Result<Prompt> {
        self.begin(Op::GetById)?;
        let state = self.state.lock().unwrap();
        state
            .prompts
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| VaultError::not_found(id))
    }

    async fn create(&self, draft: &PromptDraft) -> Result<Prompt> {
        self.begin(Op::Create)?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let mut prompt = sample_prompt(id, &draft.title, &[]);
        prompt.content = draft.content.clone();
        prompt.tags = draft.tags.clone();
        state.prompts.insert(0, prompt.clone());
        Ok(prompt)
    }

    async fn update(&self, id: &PromptId, draft: &PromptDraft) -> Result<Prompt> {
        self.begin(Op::Update)?;
        let mut state = self.state.lock().unwrap();
        let prompt = state
            .prompts
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| VaultError::not_found(id))?;
        prompt.title = draft.title.clone();
        prompt.content = draft.content.clone();
        prompt.tags = draft.tags.clone();
        prompt.updated_at = prompt.created_at + ChronoDuration::hours(1);
        Ok(prompt.clone())
    }

    async fn delete(&self, id: &PromptId) -> Result<()> {
        self.begin(Op::Delete)?;
        let mut state = self.state.lock().unwrap();
        let index = state
            .prompts
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| VaultError::not_found(id))?;
        state.prompts.remove(index);
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        self.begin(Op::ListTags)?;
        let state = self.state.lock().unwrap();
        let tags: BTreeSet<String> = state.prompts.iter().flat_map(|p| p.tags.iter().cloned()).collect();
        Ok(tags.into_iter().collect())
    }
}
