//! Subcommands and their effect on the credential store

use clap::Subcommand;
use serde::Serialize;
use tracing::debug;

use credstore_core::panel::row_label;
use credstore_core::{CredStoreError, CredentialPanel, CredentialStore, FormOutcome, FormResult};

use crate::error::Result;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List stored credentials
    List {
        /// Print JSON instead of plain lines
        #[arg(long)]
        json: bool,

        /// Include passwords in the output
        #[arg(long)]
        show_passwords: bool,
    },

    /// Add a credential to the end of the list
    Add {
        #[arg(short, long)]
        username: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "CREDSTORE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Replace the credential at INDEX; omitted fields keep their value
    Edit {
        index: usize,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove the credential at INDEX
    Remove { index: usize },

    /// Remove every credential
    Clear,

    /// Print the serialized settings section
    Show,
}

impl Command {
    /// Fill in a missing `add` password using `prompt`
    pub fn with_prompted_password<F>(self, prompt: F) -> Result<Self>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        match self {
            Command::Add {
                username,
                password: None,
                description,
            } => Ok(Command::Add {
                username,
                password: Some(prompt()?),
                description,
            }),
            other => Ok(other),
        }
    }
}

/// Text to print and whether the store now needs saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub changed: bool,
}

/// JSON shape of one listed credential
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListedCredential<'a> {
    index: usize,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    description: &'a str,
    label: String,
}

/// Run one command against `store`
pub fn execute(command: Command, store: &mut CredentialStore) -> Result<CommandOutput> {
    let mut panel = CredentialPanel::new();
    debug!("Executing {:?}", command);

    let text = match command {
        Command::List {
            json,
            show_passwords,
        } => list(store, json, show_passwords)?,

        Command::Add {
            username,
            password,
            description,
        } => {
            let request = panel.request_add();
            let outcome = FormOutcome::Confirm {
                username,
                password: password.unwrap_or_default(),
                description: description.unwrap_or_default(),
            };
            match panel.complete(store, request, outcome) {
                FormResult::Added(handle) => {
                    let index = store.index_of(handle).unwrap_or_default();
                    format!("Added credential {}: {}", index, label_at(store, index))
                }
                _ => return Err(CredStoreError::EmptyUsername.into()),
            }
        }

        Command::Edit {
            index,
            username,
            password,
            description,
        } => {
            panel.select(store, Some(index));
            let request = panel
                .request_edit(store)
                .ok_or(CredStoreError::EntryNotFound(index))?;
            let outcome = FormOutcome::Confirm {
                username: username.unwrap_or_else(|| request.username.clone()),
                password: password.unwrap_or_else(|| request.password.clone()),
                description: description.unwrap_or_else(|| request.description.clone()),
            };
            match panel.complete(store, request, outcome) {
                FormResult::Updated(_) => {
                    format!("Updated credential {}: {}", index, label_at(store, index))
                }
                FormResult::Discarded => return Err(CredStoreError::EmptyUsername.into()),
                _ => return Err(CredStoreError::EntryNotFound(index).into()),
            }
        }

        Command::Remove { index } => {
            panel.select(store, Some(index));
            let label = label_at(store, index);
            if !panel.remove_selected(store) {
                return Err(CredStoreError::EntryNotFound(index).into());
            }
            format!("Removed credential {}: {}", index, label)
        }

        Command::Clear => {
            let removed = store.count();
            store.clear_all();
            if removed > 0 {
                store.mark_changed();
            }
            format!("Removed {} credentials", removed)
        }

        Command::Show => store.save(),
    };

    Ok(CommandOutput {
        text,
        changed: store.has_changes(),
    })
}

fn label_at(store: &CredentialStore, index: usize) -> String {
    store.get(index).map(row_label).unwrap_or_default()
}

fn list(store: &CredentialStore, json: bool, show_passwords: bool) -> Result<String> {
    if json {
        let listed: Vec<ListedCredential<'_>> = store
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| ListedCredential {
                index,
                username: entry.username(),
                password: show_passwords.then(|| entry.password()),
                description: entry.description(),
                label: row_label(entry),
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&listed)?);
    }

    if store.is_empty() {
        return Ok("No credentials stored".to_string());
    }

    let lines: Vec<String> = store
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if show_passwords {
                format!("{}: {}  password: {}", index, row_label(entry), entry.password())
            } else {
                format!("{}: {}", index, row_label(entry))
            }
        })
        .collect();
    Ok(lines.join("\n"))
}
