//! Note commands.

use clap::Subcommand;

use super::Output;
use crate::error::{CliError, CliResult};
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Add a note
    Add {
        content: String,
        /// Optional heading
        #[arg(long, default_value = "")]
        title: String,
        /// Background colour
        #[arg(long)]
        color: Option<String>,
    },
    /// List notes, newest first
    List,
    /// Remove a note by id
    Remove { id: String },
}

pub async fn run(state: &AppState, command: NoteCommand, out: &mut Output<'_>) -> CliResult<()> {
    match command {
        NoteCommand::Add {
            content,
            title,
            color,
        } => {
            let mut note = state.notes.add(&title, &content).await?;
            if let Some(color) = color {
                note = state.notes.set_color(&note.id, &color).await?;
            }
            out.value(&note, |n| format!("Added note {}", n.id))
        }
        NoteCommand::List => {
            let notes = state.notes.list().await;
            out.value(&notes, |notes| {
                notes
                    .iter()
                    .map(|n| {
                        let head = if n.title.is_empty() {
                            n.content.lines().next().unwrap_or_default()
                        } else {
                            n.title.as_str()
                        };
                        format!("{}  [{}]  {}", n.id, n.color, head)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        NoteCommand::Remove { id } => {
            if !state.notes.remove(&id).await? {
                return Err(CliError::not_found("note", &id));
            }
            out.message(format!("Removed note {}", id))
        }
    }
}
