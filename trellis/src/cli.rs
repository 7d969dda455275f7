//! The caller-owned root: command registration, dispatch, reporting.
//!
//! A [`Cli`] lives for one invocation: commands attach before [`Cli::run`],
//! the tree is walked exactly once, and the returned exit code is the only
//! thing that leaves the engine. Failures are written to the error surface
//! and answered with help scoped to the deepest matched command; the process
//! is never terminated from in here.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::command::{Command, Context, RunError};
use crate::completion::{self, CompletionRequest};
use crate::error::{DispatchError, ParseError};
use crate::flags::{FlagSet, Flags};
use crate::help::{self, Header};
use crate::tree::Node;

/// A command line interface: root metadata plus a tree of named commands.
pub struct Cli {
    name: String,
    version: String,
    description: String,
    authors: Vec<String>,
    default_command: Option<String>,
    commands: BTreeMap<String, Node>,
    help_out: Box<dyn Write + Send>,
    error_out: Box<dyn Write + Send>,
}

/// What one dispatch pass came to.
enum Dispatched {
    Done,
    HelpRequested { scope: Vec<String> },
    Rejected { error: DispatchError, scope: Vec<String> },
    RunFailed { error: RunError, path: Vec<String> },
}

impl Cli {
    /// A new root writing help to stdout and errors to stderr.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            authors: Vec::new(),
            default_command: None,
            commands: BTreeMap::new(),
            help_out: Box::new(io::stdout()),
            error_out: Box::new(io::stderr()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Command to substitute when the argument vector names none.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    /// Redirect the help surface.
    pub fn with_help_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.help_out = Box::new(writer);
        self
    }

    /// Redirect the error surface.
    pub fn with_error_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.error_out = Box::new(writer);
        self
    }

    /// Register a top-level command. Returns `false` — and changes nothing —
    /// if the name is already taken, so a shared root cannot be shadowed.
    pub fn add_command(&mut self, name: impl Into<String>, command: Box<dyn Command>) -> bool {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return false;
        }
        tracing::debug!(command = %name, "command registered");
        self.commands.insert(name, Node::attach(command));
        true
    }

    /// Dispatch one argument vector and return the process exit code.
    ///
    /// `argv[0]` is the program name and is ignored for resolution. When the
    /// completion environment variables are present this answers the
    /// completion query instead of running anything.
    pub async fn run(&mut self, argv: &[String]) -> i32 {
        if let Some(request) = CompletionRequest::from_env() {
            return self.complete(&request);
        }
        let mut tokens: Vec<String> = argv.iter().skip(1).cloned().collect();
        if tokens.is_empty() {
            match self.default_command.clone() {
                Some(default) => tokens.push(default),
                None => {
                    self.print_overview();
                    return 0;
                }
            }
        }
        if tokens[0] == "help" && !self.commands.contains_key("help") {
            let rest = tokens[1..].to_vec();
            return self.explicit_help(&rest);
        }
        match self.dispatch(&tokens).await {
            Dispatched::Done => 0,
            Dispatched::HelpRequested { scope } => {
                self.print_scoped(&scope);
                0
            }
            Dispatched::Rejected { error, scope } => {
                tracing::debug!(error = %error, "dispatch rejected");
                let _ = writeln!(self.error_out, "error: {error}");
                self.print_scoped(&scope);
                2
            }
            Dispatched::RunFailed { error, path } => {
                let code = error.exit_code();
                let _ = writeln!(self.error_out, "error: {error}");
                self.print_scoped(&path);
                code
            }
        }
    }

    /// Answer a completion request directly. [`Cli::run`] takes this path
    /// when [`CompletionRequest::from_env`] finds one.
    pub fn complete(&mut self, request: &CompletionRequest) -> i32 {
        tracing::debug!(line = %request.line, "completion request");
        let candidates = completion::candidates(&mut self.commands, request);
        for candidate in candidates {
            let _ = writeln!(self.help_out, "{candidate}");
        }
        0
    }

    /// Walk the tree for `tokens` and, on reaching a leaf, bind, parse,
    /// validate and run it. Never touches the output surfaces.
    async fn dispatch(&mut self, tokens: &[String]) -> Dispatched {
        let mut path: Vec<String> = Vec::new();
        let mut map = &mut self.commands;
        let mut index = 0;
        loop {
            let token = &tokens[index];
            let Some(node) = map.get_mut(token.as_str()) else {
                return if path.is_empty() {
                    Dispatched::Rejected {
                        error: DispatchError::NoCommand {
                            name: token.clone(),
                        },
                        scope: Vec::new(),
                    }
                } else {
                    Dispatched::Rejected {
                        error: DispatchError::MissingSubCommand { path: path.clone() },
                        scope: path,
                    }
                };
            };
            path.push(token.clone());
            index += 1;
            if node.is_leaf() {
                return Self::run_leaf(node, path, &tokens[index..]).await;
            }
            if index >= tokens.len() {
                return Dispatched::Rejected {
                    error: DispatchError::MissingSubCommand { path: path.clone() },
                    scope: path,
                };
            }
            map = &mut node.children;
        }
    }

    async fn run_leaf(node: &mut Node, path: Vec<String>, rest: &[String]) -> Dispatched {
        tracing::debug!(path = %path.join(" "), "command resolved");
        let command = node.command.as_mut();
        let mut set = FlagSet::new();
        if let Err(error) = command.bind(&mut set, "") {
            return Dispatched::Rejected {
                error: error.into(),
                scope: path,
            };
        }
        match set.parse(rest) {
            Err(ParseError::HelpRequested) => {
                return Dispatched::HelpRequested { scope: path };
            }
            Err(error) => {
                return Dispatched::Rejected {
                    error: error.into(),
                    scope: path,
                };
            }
            Ok(()) => {}
        }
        let args = set.args().to_vec();
        drop(set);
        if let Err(error) = command.validate(&args) {
            return Dispatched::Rejected {
                error: error.into(),
                scope: path,
            };
        }
        let ctx = Context {
            path: path.clone(),
            args,
        };
        match command.run(ctx).await {
            Ok(()) => Dispatched::Done,
            Err(error) => Dispatched::RunFailed { error, path },
        }
    }

    /// `help [path...]`, honored when the host registered no `help` command.
    fn explicit_help(&mut self, path: &[String]) -> i32 {
        if path.is_empty() {
            self.print_overview();
            return 0;
        }
        if Self::node_at_mut(&mut self.commands, path).is_none() {
            let joined = path.join(" ");
            let _ = writeln!(self.error_out, "error: no command {joined:?}");
            self.print_overview();
            return 2;
        }
        self.print_scoped(path);
        0
    }

    /// Render help for the node at `path`, or the overview for an empty path.
    fn print_scoped(&mut self, path: &[String]) {
        let program = self.name.clone();
        let rendered = Self::node_at_mut(&mut self.commands, path)
            .map(|node| help::render_command(&program, path, node));
        match rendered {
            Some(Ok(text)) => {
                let _ = write!(self.help_out, "{text}");
            }
            Some(Err(error)) => {
                let _ = writeln!(self.error_out, "help unavailable: {error}");
            }
            None => self.print_overview(),
        }
    }

    fn print_overview(&mut self) {
        let header = Header {
            name: &self.name,
            version: &self.version,
            description: &self.description,
            authors: &self.authors,
        };
        match help::render_overview(&header, &mut self.commands) {
            Ok(text) => {
                let _ = write!(self.help_out, "{text}");
            }
            Err(error) => {
                let _ = writeln!(self.error_out, "help unavailable: {error}");
            }
        }
    }

    fn node_at_mut<'t>(
        commands: &'t mut BTreeMap<String, Node>,
        path: &[String],
    ) -> Option<&'t mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = commands.get_mut(first.as_str())?;
        for name in rest {
            node = node.children.get_mut(name.as_str())?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;
    use crate::flags::Flags;
    use async_trait::async_trait;

    struct Plain;

    impl Flags for Plain {
        fn bind<'a>(&'a mut self, _set: &mut FlagSet<'a>, _prefix: &str) -> Result<(), BindError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Command for Plain {
        fn help(&self) -> String {
            String::new()
        }
        fn synopsis(&self) -> String {
            "A plain command.".to_string()
        }
        async fn run(&mut self, _ctx: Context) -> Result<(), RunError> {
            Ok(())
        }
    }

    #[test]
    fn test_add_command_refuses_duplicates() {
        let mut cli = Cli::new("test", "1.0.0");
        assert!(cli.add_command("echo", Box::new(Plain)));
        assert!(!cli.add_command("echo", Box::new(Plain)));
    }

    #[test]
    fn test_node_lookup_by_path() {
        let mut cli = Cli::new("test", "1.0.0");
        cli.add_command("echo", Box::new(Plain));
        let path = vec!["echo".to_string()];
        assert!(Cli::node_at_mut(&mut cli.commands, &path).is_some());
        let missing = vec!["nope".to_string()];
        assert!(Cli::node_at_mut(&mut cli.commands, &missing).is_none());
    }
}
