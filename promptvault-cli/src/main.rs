mod browse;
mod config;
mod constants;
mod logging;
mod render;

use crate::config::{build_api, load_config};
use crate::constants::{API_URL_ENV, PVAULT_CLI};
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use promptvault_core::prompt::{PromptDraft, PromptId};
use promptvault_core::query::{PageRequest, SearchQuery, SortField, SortOrder};
use promptvault_core::store::{PromptStore, RefreshOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(version,
display_name = "pvault",
bin_name = "pvault",
about = "A personal vault for your LLM prompts",
long_about = "Search, tag, create, edit and copy LLM prompts kept by a Prompt Vault service", )]
struct Args {
    /// Base URL of the Prompt Vault service
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Log debug output to stderr, overriding RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// List prompts, optionally filtered by text and tags
    List {
        #[arg(short = 'q', long)]
        query: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(short = 'l', long)]
        limit: Option<u32>,
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: u32,
        #[arg(long, default_value_t = SortField::CreatedAt)]
        sort_by: SortField,
        #[arg(long, default_value_t = SortOrder::Desc)]
        order: SortOrder,
    },
    /// Show one prompt in full
    Get {
        #[arg(short = 'i', long)]
        id: String,
    },
    /// Create a prompt
    Add {
        #[arg(short = 'n', long)]
        title: String,
        #[arg(short = 'c', long)]
        content: String,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
    },
    /// Change a prompt's title, content or tags
    Edit {
        #[arg(short = 'i', long)]
        id: String,
        #[arg(short = 'n', long)]
        title: Option<String>,
        #[arg(short = 'c', long)]
        content: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(short = 'r', long = "remove-tag")]
        remove_tags: Vec<String>,
    },
    /// Delete a prompt
    Delete {
        #[arg(short = 'i', long)]
        id: String,
        /// Skip the confirmation question
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List every tag in use
    Tags,
    /// Copy a prompt's content to the clipboard
    Copy {
        #[arg(short = 'i', long)]
        id: String,
    },
    /// Search interactively
    Browse,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal.
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::init_logging(args.debug)?;

    if let Commands::Completions { shell } = args.cmd {
        clap_complete::generate(shell, &mut Args::command(), PVAULT_CLI, &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(args.api_url.clone());
    tracing::debug!(api_url = %config.api_url, "Loaded config");
    let store = Arc::new(PromptStore::new(build_api(&config)));

    match args.cmd {
        Commands::List {
            query,
            tags,
            limit,
            offset,
            sort_by,
            order,
        } => {
            let query = SearchQuery::new(query.unwrap_or_default()).with_tags(tags);
            let page = PageRequest {
                limit: limit.unwrap_or(config.page_size()),
                offset,
                sort_by,
                sort_order: order,
            };
            let outcome = store.refresh(&query, page).await;
            print!("{}", render::prompt_list(&store.snapshot(), query.empty_state_message()));
            if outcome == RefreshOutcome::Failed {
                std::process::exit(exitcode::UNAVAILABLE);
            }
        }
        Commands::Get { id } => {
            let prompt = store.get(&PromptId::from(id)).await?;
            print!("{}", render::detail(&prompt));
        }
        Commands::Add { title, content, tags } => {
            let draft = PromptDraft::new(title, content).with_tags(tags);
            let prompt = store.create(&draft).await?;
            println!("Created prompt {}", prompt.id);
            print!("{}", render::card(&prompt));
        }
        Commands::Edit {
            id,
            title,
            content,
            tags,
            remove_tags,
        } => {
            let id = PromptId::from(id);
            let existing = store.get(&id).await?;
            let draft = apply_edits(existing.to_draft(), title, content, &tags, &remove_tags);
            let prompt = store.update(&id, &draft).await?;
            println!("Updated prompt {}", prompt.id);
            print!("{}", render::card(&prompt));
        }
        Commands::Delete { id, yes } => {
            if !yes && !confirm("Are you sure you want to delete this prompt?").await? {
                println!("Cancelled");
                return Ok(());
            }
            let id = PromptId::from(id);
            store.delete(&id).await?;
            println!("Deleted prompt {}", id);
        }
        Commands::Tags => {
            let tags = store.list_tags().await?;
            print!("{}", render::tag_list(&tags, &BTreeSet::new()));
        }
        Commands::Copy { id } => {
            let prompt = store.get(&PromptId::from(id)).await?;
            let mut clipboard = arboard::Clipboard::new()?;
            clipboard.set_text(prompt.content)?;
            println!("Copied!");
        }
        Commands::Browse => browse::browse(store, &config).await?,
        // Printed before the config is loaded.
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn apply_edits(
    mut draft: PromptDraft,
    title: Option<String>,
    content: Option<String>,
    add: &[String],
    remove: &[String],
) -> PromptDraft {
    if let Some(title) = title {
        draft.title = title;
    }
    if let Some(content) = content {
        draft.content = content;
    }
    for tag in remove {
        draft.remove_tag(tag);
    }
    for tag in add {
        draft.add_tag(tag);
    }
    draft
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn confirm(question: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{} [y/N] ", question).as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(is_yes(&answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_list_flags() {
        let args = Args::try_parse_from([
            "pvault", "list", "-q", "rust", "-t", "a", "--tag", "b", "--sort-by", "title", "--order", "asc",
        ])
        .unwrap();

        match args.cmd {
            Commands::List {
                query,
                tags,
                limit,
                offset,
                sort_by,
                order,
            } => {
                assert_eq!(Some(String::from("rust")), query);
                assert_eq!(vec!["a", "b"], tags);
                assert_eq!(None, limit);
                assert_eq!(0, offset);
                assert_eq!(SortField::Title, sort_by);
                assert_eq!(SortOrder::Asc, order);
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        assert!(Args::try_parse_from(["pvault", "list", "--sort-by", "rank"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["pvault", "tags", "--api-url", "http://vault:9000", "--debug"]).unwrap();

        assert_eq!(Some(String::from("http://vault:9000")), args.api_url);
        assert!(args.debug);
    }

    #[test]
    fn test_apply_edits() {
        let draft = PromptDraft::new("old", "body").with_tags(["keep", "drop"]);

        let draft = apply_edits(
            draft,
            Some(String::from("new")),
            None,
            &[String::from(" Fresh "), String::from("keep")],
            &[String::from("drop")],
        );

        assert_eq!("new", draft.title);
        assert_eq!("body", draft.content);
        assert_eq!(vec!["keep", "fresh"], draft.tags);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
