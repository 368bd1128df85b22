//! Plain-text views of prompts and of the store state.

use chrono::{DateTime, Utc};
use promptvault_core::prompt::Prompt;
use promptvault_core::store::StoreState;
use std::collections::BTreeSet;

const PREVIEW_CHARS: usize = 100;

/// `Jan 1, 2024, 09:00 AM`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Cuts `text` to at most 100 characters, marking the cut with `...`.
pub fn truncate(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn tag_line(tags: &[String]) -> String {
    tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ")
}

fn dates(prompt: &Prompt) -> String {
    let mut line = format!("Created {}", format_date(&prompt.created_at));
    if prompt.was_edited() {
        line.push_str(&format!("  Updated {}", format_date(&prompt.updated_at)));
    }
    line
}

/// A short card as shown in lists.
pub fn card(prompt: &Prompt) -> String {
    let mut out = format!("[{}] {}\n", prompt.id, prompt.title);
    out.push_str(&format!("    {}\n", truncate(&prompt.content).replace('\n', " ")));
    if !prompt.tags.is_empty() {
        out.push_str(&format!("    {}\n", tag_line(&prompt.tags)));
    }
    out.push_str(&format!("    {}\n", dates(prompt)));
    out
}

/// Everything about one prompt, content untruncated.
pub fn detail(prompt: &Prompt) -> String {
    let mut out = format!("[{}] {}\n", prompt.id, prompt.title);
    if !prompt.tags.is_empty() {
        out.push_str(&format!("{}\n", tag_line(&prompt.tags)));
    }
    out.push_str(&format!("{}\n\n{}\n", dates(prompt), prompt.content));
    out
}

/// The list view: error banner, then the cards or the empty-state message.
pub fn prompt_list(state: &StoreState, empty_message: &str) -> String {
    let mut out = String::new();
    if let Some(error) = &state.error {
        out.push_str(&format!("Error: {}\n", error));
    }

    if state.prompts.is_empty() {
        if state.loading {
            out.push_str("Loading prompts...\n");
        } else if state.error.is_none() {
            out.push_str(&format!("{}\n", empty_message));
        }
        return out;
    }

    for prompt in &state.prompts {
        out.push_str(&card(prompt));
        out.push('\n');
    }

    let pagination = &state.pagination;
    out.push_str(&format!(
        "Showing {} of {} prompts",
        state.prompts.len(),
        pagination.total
    ));
    if pagination.has_more {
        out.push_str(&format!(
            " (more with --offset {})",
            u64::from(pagination.offset) + state.prompts.len() as u64
        ));
    }
    out.push('\n');
    out
}

/// Tag vocabulary with the selected ones marked.
pub fn tag_list(tags: &BTreeSet<String>, selected: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        return String::from("No tags yet.\n");
    }
    tags.iter()
        .map(|t| {
            let mark = if selected.contains(t) { "*" } else { " " };
            format!("{} {}\n", mark, t)
        })
        .collect()
}
