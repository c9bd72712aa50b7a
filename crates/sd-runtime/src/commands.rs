//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `list` | every field with its effective value |
//! | `get <field>` | one field's effective value as JSON |
//! | `set <field> <json>` | write a field (a bare word is taken as a string) |
//! | `remove <field>` | drop the stored value; the default applies again |
//! | `reset` | drop every stored value |
//! | `watch` | print changes as other processes edit the defaults file |
//!
//! A field is named by its id (`IS_BOLD`) or its key (`isBold`).

use crate::container::Container;
use crate::schema::Preferences;
use anyhow::{bail, Context, Result};
use sd_03_coordinator::{Coordinator, Field, FieldSnapshot};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Command-line usage.
pub const USAGE: &str = "usage: sd-runtime <list | get <field> | set <field> <json> | remove <field> | reset | watch>";

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Get { field: String },
    Set { field: String, value: Value },
    Remove { field: String },
    Reset,
    Watch,
}

/// Command-line errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("missing command\n{USAGE}")]
    Missing,

    #[error("unknown command '{0}'\n{USAGE}")]
    Unknown(String),

    #[error("'{command}' expects {expected} argument(s)\n{USAGE}")]
    Arity {
        command: &'static str,
        expected: usize,
    },
}

impl Command {
    /// Parse arguments, without the program name.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` for an unknown command or wrong arity.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CommandError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let Some((&name, rest)) = args.split_first() else {
            return Err(CommandError::Missing);
        };

        let arity = |command: &'static str, expected: usize| {
            if rest.len() == expected {
                Ok(())
            } else {
                Err(CommandError::Arity { command, expected })
            }
        };

        match name {
            "list" => arity("list", 0).map(|()| Command::List),
            "get" => arity("get", 1).map(|()| Command::Get {
                field: rest[0].to_owned(),
            }),
            "set" => arity("set", 2).map(|()| Command::Set {
                field: rest[0].to_owned(),
                value: parse_value(rest[1]),
            }),
            "remove" => arity("remove", 1).map(|()| Command::Remove {
                field: rest[0].to_owned(),
            }),
            "reset" => arity("reset", 0).map(|()| Command::Reset),
            "watch" => arity("watch", 0).map(|()| Command::Watch),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }

    /// Run a one-shot command and return its output lines.
    ///
    /// # Errors
    ///
    /// Fails for an unknown field, a value of the wrong type, or `watch`,
    /// which must go through [`watch`].
    pub fn execute(&self, container: &Container) -> Result<Vec<String>> {
        let prefs = container.preferences();
        match self {
            Command::List => Ok(prefs.snapshot().iter().map(describe).collect()),
            Command::Get { field } => {
                let field = lookup(prefs, field)?;
                Ok(vec![field.snapshot(prefs).value.to_string()])
            }
            Command::Set { field, value } => {
                prefs
                    .set_json(field, value.clone())
                    .with_context(|| format!("setting {field}"))?;
                flush(container);
                let field = lookup(prefs, field)?;
                Ok(vec![describe(&field.snapshot(prefs))])
            }
            Command::Remove { field } => {
                let field = lookup(prefs, field)?;
                prefs.store().remove_value(field.key());
                flush(container);
                Ok(vec![describe(&field.snapshot(prefs))])
            }
            Command::Reset => {
                prefs.remove_all_stored_values();
                flush(container);
                Ok(vec![format!("reset {} fields", prefs.fields().len())])
            }
            Command::Watch => bail!("watch runs until interrupted; use commands::watch"),
        }
    }
}

/// Print every change to a declared field until `shutdown` completes.
///
/// The defaults file is re-read on each tick, so edits from other processes
/// arrive as external changes.
///
/// # Errors
///
/// Returns an error only if printing fails.
pub async fn watch(
    container: &Container,
    shutdown: impl Future<Output = ()>,
    mut emit: impl FnMut(String) -> Result<()>,
) -> Result<()> {
    let prefs = container.preferences();
    let mut changes = prefs.change_stream();
    let mut ticker = interval(container.config().watch_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                match container.domain().reload() {
                    Ok(0) => {}
                    Ok(changed) => debug!(changed, "Defaults file changed"),
                    Err(e) => warn!(error = %e, "Could not re-read defaults file"),
                }
            }
            change = changes.recv() => {
                let Some(change) = change else { break };
                let line = match prefs.field(change.key) {
                    Some(field) => describe(&field.snapshot(prefs)),
                    None => change.key.to_owned(),
                };
                emit(format!("{:?}: {line}", change.origin))?;
            }
        }
    }
    Ok(())
}

/// A bare word that is not JSON is taken as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn lookup(prefs: &Coordinator<Preferences>, name: &str) -> Result<&'static dyn Field<Preferences>> {
    prefs
        .field(name)
        .with_context(|| format!("no field named '{name}'"))
}

fn flush(container: &Container) {
    if !container.preferences().synchronize() {
        warn!("Changes kept in memory only; flushing the defaults file failed");
    }
}

fn describe(field: &FieldSnapshot) -> String {
    let source = if field.is_stored { "stored" } else { "default" };
    format!("{} = {} ({source})", field.key, field.value)
}
