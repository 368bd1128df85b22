//! Interactive search. Each line read from stdin either changes the query or is a
//! `:command`; the list is reprinted each time the store finishes loading.

use crate::config::PromptVaultConfig;
use crate::render;
use anyhow::Result;
use promptvault_core::query::PageRequest;
use promptvault_core::registry::PromptApi;
use promptvault_core::session::SearchSession;
use promptvault_core::store::{PromptStore, StoreEvent};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "Type to search. Commands: :tag NAME, :clear, :tags, :reload, :help, :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    ToggleTag(String),
    ClearTags,
    ShowTags,
    Reload,
    Help,
    Quit,
    Unknown(String),
}

impl BrowseCommand {
    pub fn parse(line: &str) -> BrowseCommand {
        let Some(command) = line.trim().strip_prefix(':') else {
            return BrowseCommand::Search(line.trim().to_string());
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name {
            "tag" | "t" if !arg.is_empty() => BrowseCommand::ToggleTag(arg.to_string()),
            "clear" | "c" => BrowseCommand::ClearTags,
            "tags" => BrowseCommand::ShowTags,
            "reload" | "r" => BrowseCommand::Reload,
            "help" | "h" => BrowseCommand::Help,
            "quit" | "q" => BrowseCommand::Quit,
            _ => BrowseCommand::Unknown(command.to_string()),
        }
    }
}

/// Whether the list should be reprinted after `event`. Results that land while another
/// search is still running wait until the loading flag drops.
pub fn needs_redraw(event: &StoreEvent) -> bool {
    matches!(event, StoreEvent::LoadingChanged(false))
}

pub async fn browse<A: PromptApi + 'static>(store: Arc<PromptStore<A>>, config: &PromptVaultConfig) -> Result<()> {
    let page = PageRequest::default().with_limit(config.page_size());
    let session = SearchSession::start(Arc::clone(&store), config.debounce(), page).await;
    let mut events = store.subscribe();

    println!("{}", HELP);
    print!("{}", render::prompt_list(&store.snapshot(), session.empty_state_message()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match BrowseCommand::parse(&line) {
                    BrowseCommand::Search(text) => session.set_text(text),
                    BrowseCommand::ToggleTag(tag) => {
                        let selected = session.toggle_tag(&tag);
                        tracing::debug!(tag = %tag, selected, "Toggled tag filter");
                    }
                    BrowseCommand::ClearTags => session.clear_tags(),
                    BrowseCommand::ShowTags => {
                        print!("{}", render::tag_list(&store.tags(), &session.selected_tags()));
                    }
                    BrowseCommand::Reload => session.reload().await,
                    BrowseCommand::Help => println!("{}", HELP),
                    BrowseCommand::Quit => break,
                    BrowseCommand::Unknown(command) => println!("Unknown command ':{}'. {}", command, HELP),
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if needs_redraw(&event) {
                        print!("{}", render::prompt_list(&store.snapshot(), session.empty_state_message()));
                    }
                }
                Err(RecvError::Lagged(_)) => {
                    print!("{}", render::prompt_list(&store.snapshot(), session.empty_state_message()));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptvault_core::query::NO_MATCHES_MESSAGE;
    use promptvault_core::store::StoreState;

    #[test]
    fn test_plain_line_is_search_text() {
        assert_eq!(BrowseCommand::Search(String::from("rust async")), BrowseCommand::parse("  rust async \n"));
        assert_eq!(BrowseCommand::Search(String::new()), BrowseCommand::parse(""));
    }

    #[test]
    fn test_tag_command() {
        assert_eq!(BrowseCommand::ToggleTag(String::from("Rust")), BrowseCommand::parse(":tag Rust"));
        assert_eq!(BrowseCommand::ToggleTag(String::from("rust")), BrowseCommand::parse(":t   rust "));
        assert_eq!(BrowseCommand::Unknown(String::from("tag")), BrowseCommand::parse(":tag"));
    }

    #[test]
    fn test_redraw_waits_for_loading_to_finish() {
        assert!(needs_redraw(&StoreEvent::LoadingChanged(false)));
        assert!(!needs_redraw(&StoreEvent::LoadingChanged(true)));
        assert!(!needs_redraw(&StoreEvent::PromptsReplaced));
        assert!(!needs_redraw(&StoreEvent::TagsReplaced));
    }

    #[test]
    fn test_empty_result_after_overlap_shows_empty_message() {
        // What the store holds once the last overlapping search has released the flag.
        let state = StoreState::default();

        assert!(needs_redraw(&StoreEvent::LoadingChanged(false)));
        assert_eq!(
            format!("{}\n", NO_MATCHES_MESSAGE),
            render::prompt_list(&state, NO_MATCHES_MESSAGE)
        );
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(BrowseCommand::ClearTags, BrowseCommand::parse(":clear"));
        assert_eq!(BrowseCommand::ShowTags, BrowseCommand::parse(":tags"));
        assert_eq!(BrowseCommand::Reload, BrowseCommand::parse(":r"));
        assert_eq!(BrowseCommand::Help, BrowseCommand::parse(":help"));
        assert_eq!(BrowseCommand::Quit, BrowseCommand::parse(":quit"));
        assert_eq!(BrowseCommand::Quit, BrowseCommand::parse(" :q"));
        assert_eq!(BrowseCommand::Unknown(String::from("frobnicate now")), BrowseCommand::parse(":frobnicate now"));
    }
}
