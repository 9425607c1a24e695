//! Link commands.

use clap::Subcommand;

use super::Output;
use crate::error::{CliError, CliResult};
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum LinkCommand {
    /// Add a link to the start page
    Add { title: String, url: String },
    /// List links in page order
    List,
    /// Remove a link by id
    Remove { id: String },
}

pub async fn run(state: &AppState, command: LinkCommand, out: &mut Output<'_>) -> CliResult<()> {
    match command {
        LinkCommand::Add { title, url } => {
            let link = state.links.add(&title, &url).await?;
            out.value(&link, |l| format!("Added {} ({})", l.title, l.id))
        }
        LinkCommand::List => {
            let links = state.links.list().await;
            out.value(&links, |links| {
                links
                    .iter()
                    .map(|l| format!("{:>3}  {}  {}  {}", l.position, l.id, l.title, l.url))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        LinkCommand::Remove { id } => {
            if !state.links.remove(&id).await? {
                return Err(CliError::not_found("link", &id));
            }
            out.message(format!("Removed link {}", id))
        }
    }
}
