//! The command capability model.
//!
//! [`Command`] is the contract every command and sub-command satisfies. The
//! optional capabilities — owning a sub-command tree, post-parse validation —
//! are default-provided methods; overriding them is the capability query.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ValidationError;
use crate::flags::Flags;

/// Mapping of sub-command names to commands, as returned by
/// [`Command::subcommands`]. Keys are unique by construction and iterate in
/// name order, which is also the help listing order.
pub type SubCommandSet = BTreeMap<String, Box<dyn Command>>;

/// Per-invocation data handed to [`Command::run`].
///
/// Cancellation is carried by the task itself: a host that wants a timeout
/// wraps or drops the future returned by [`crate::Cli::run`].
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The command path that was resolved to reach this command.
    pub path: Vec<String>,
    /// Positional arguments left over after flag parsing.
    pub args: Vec<String>,
}

/// Failure reported by a running command.
///
/// User-class failures exit 1; everything else is a system-class failure and
/// exits 101.
#[derive(Debug, Error)]
pub enum RunError {
    /// The user can fix this; the message should say how.
    #[error("{0}")]
    User(String),

    /// A bug or environment failure the user cannot fix.
    #[error("internal error: {0}")]
    System(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn user(message: impl Into<String>) -> Self {
        RunError::User(message.into())
    }

    pub fn system(message: impl Into<String>) -> Self {
        RunError::System(message.into())
    }

    /// Exit code the process should report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::User(_) => 1,
            RunError::System(_) | RunError::Io(_) => 101,
        }
    }
}

/// A runnable command of a CLI.
#[async_trait]
pub trait Command: Flags + Send {
    /// Long-form help text: the command-line usage plus a few sentences
    /// explaining the function of the command. May be empty, in which case
    /// only the synopsis is shown.
    fn help(&self) -> String;

    /// One-line, short synopsis of the command.
    fn synopsis(&self) -> String;

    /// Run the command. Called only after flag binding, flag parsing and
    /// [`Command::validate`] have all succeeded.
    async fn run(&mut self, ctx: Context) -> Result<(), RunError>;

    /// Sub-commands of this command, consumed once at registration time.
    /// A non-empty map makes this an internal node of the command tree; the
    /// default makes it a leaf.
    fn subcommands(&mut self) -> SubCommandSet {
        SubCommandSet::new()
    }

    /// Post-parse validation hook, called with the positional remainder after
    /// automatic flag parsing succeeds. Cross-field checks and required-flag
    /// enforcement belong here.
    fn validate(&mut self, args: &[String]) -> Result<(), ValidationError> {
        let _ = args;
        Ok(())
    }
}
