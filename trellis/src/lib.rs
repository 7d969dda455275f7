//! # Trellis: declarative flag binding and sub-command dispatch
//!
//! A small framework for tree-shaped command line tools: describe each
//! command as a struct whose fields carry `#[flag(...)]` metadata, attach
//! commands to a caller-owned root, and the engine binds the flags, resolves
//! the sub-command path, renders help, and answers shell completion queries.
//!
//! ## Core principles
//!
//! - **Declarative flags**: `#[derive(Flags)]` turns tagged struct fields
//!   into registered options; parsing writes straight back into the fields.
//! - **Capabilities over downcasts**: sub-commands and post-parse validation
//!   are default trait methods a command overrides to opt in.
//! - **Errors answer with help**: binding, resolution, parse and run
//!   failures never terminate the process; they are reported on the error
//!   surface with help scoped to the deepest matched command.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use trellis::{async_trait, Cli, Command, Context, Flags, RunError};
//!
//! #[derive(Default, Flags)]
//! struct Echo {
//!     #[flag(name = "echoed", usage = "echo this string")]
//!     echoed: String,
//! }
//!
//! #[async_trait]
//! impl Command for Echo {
//!     fn help(&self) -> String {
//!         "Usage: echoer echo [options]".to_string()
//!     }
//!
//!     fn synopsis(&self) -> String {
//!         "Echo the input string.".to_string()
//!     }
//!
//!     async fn run(&mut self, _ctx: Context) -> Result<(), RunError> {
//!         println!("{}", self.echoed);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut cli = Cli::new("echoer", "1.0.0");
//!     cli.add_command("echo", Box::new(Echo {
//!         echoed: "default string".to_string(),
//!     }));
//!     let args: Vec<String> = std::env::args().collect();
//!     std::process::exit(cli.run(&args).await);
//! }
//! ```
//!
//! Nested structs join the flag namespace with `#[flag(flatten)]` (merged
//! into the parent) or `#[flag(nest = "base")]` (registered under `base.`),
//! and `#[flag(name = "-")]` excludes a field entirely. Any field type that
//! is not a built-in primitive implements [`FlagValue`] and parses itself.

// Re-export the derive macro
pub use trellis_macros::Flags;

// Re-export for command implementations
pub use async_trait::async_trait;

pub mod cli;
pub mod command;
pub mod completion;
pub mod error;
pub mod flags;
pub mod tracing_support;
pub mod value;

mod help;
mod tree;

pub use cli::Cli;
pub use command::{Command, Context, RunError, SubCommandSet};
pub use completion::CompletionRequest;
pub use error::{BindError, DispatchError, ParseError, ValidationError};
pub use flags::{FlagSet, FlagSpec, Flags};
pub use value::{FlagKind, FlagValue, ValueError};

#[cfg(feature = "tracing-init")]
pub use tracing_support::{init_subscriber, init_subscriber_with_format, TracingFormat};
