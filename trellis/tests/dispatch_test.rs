//! End-to-end dispatch tests: resolution, scoped errors, help, exit codes.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use trellis::{
    async_trait, Cli, Command, Context, Flags, RunError, SubCommandSet, ValidationError,
};

fn args(strs: &[&str]) -> Vec<String> {
    strs.iter().map(|s| s.to_string()).collect()
}

/// Write sink the tests can read back after `Cli` has consumed it.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Record {
    path: Vec<String>,
    args: Vec<String>,
    rendered: String,
}

type RunLog = Arc<Mutex<Vec<Record>>>;

#[derive(Default, Flags)]
struct Echo {
    #[flag(name = "echoed", usage = "echo this string")]
    echoed: String,
    #[flag(name = "int", usage = "an int flag")]
    int: i32,
    log: RunLog,
}

#[async_trait]
impl Command for Echo {
    fn help(&self) -> String {
        "Echo the given string back, repeated if asked.".to_string()
    }

    fn synopsis(&self) -> String {
        "Echo the input string.".to_string()
    }

    async fn run(&mut self, ctx: Context) -> Result<(), RunError> {
        self.log.lock().unwrap().push(Record {
            path: ctx.path,
            args: ctx.args,
            rendered: format!("{} {}", self.echoed, self.int),
        });
        Ok(())
    }
}

#[derive(Default, Flags)]
struct Probe {
    #[flag(name = "customer", usage = "print just the customer info")]
    customer: String,
    log: RunLog,
}

#[async_trait]
impl Command for Probe {
    fn help(&self) -> String {
        String::new()
    }

    fn synopsis(&self) -> String {
        "Probe one entry.".to_string()
    }

    async fn run(&mut self, ctx: Context) -> Result<(), RunError> {
        self.log.lock().unwrap().push(Record {
            path: ctx.path,
            args: ctx.args,
            rendered: self.customer.clone(),
        });
        Ok(())
    }
}

#[derive(Default, Flags)]
struct Group {
    log: RunLog,
}

#[async_trait]
impl Command for Group {
    fn help(&self) -> String {
        String::new()
    }

    fn synopsis(&self) -> String {
        "Grouped operations.".to_string()
    }

    async fn run(&mut self, _ctx: Context) -> Result<(), RunError> {
        Ok(())
    }

    fn subcommands(&mut self) -> SubCommandSet {
        let mut set = SubCommandSet::new();
        set.insert(
            "x".to_string(),
            Box::new(Probe {
                log: self.log.clone(),
                ..Default::default()
            }) as Box<dyn Command>,
        );
        set
    }
}

fn harness(log: RunLog) -> (Cli, SharedBuf, SharedBuf) {
    let help_buf = SharedBuf::default();
    let error_buf = SharedBuf::default();
    let mut cli = Cli::new("prog", "1.0.0")
        .with_description("Test program.")
        .with_author("someone")
        .with_help_writer(help_buf.clone())
        .with_error_writer(error_buf.clone());
    cli.add_command(
        "a",
        Box::new(Echo {
            echoed: "default string".to_string(),
            log: log.clone(),
            ..Default::default()
        }),
    );
    cli.add_command("b", Box::new(Group { log }));
    (cli, help_buf, error_buf)
}

#[tokio::test]
async fn test_resolves_nested_leaf() {
    let log = RunLog::default();
    let (mut cli, _help, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog", "b", "x"])).await;
    assert_eq!(code, 0);
    assert_eq!(error_buf.contents(), "");
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].path, args(&["b", "x"]));
}

#[tokio::test]
async fn test_internal_node_without_sub_command_token() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog", "b"])).await;
    assert_eq!(code, 2);
    assert!(error_buf.contents().contains("missing sub command"));
    // help is scoped to b, which lists its children
    assert!(help_buf.contents().contains("Sub commands:"));
    assert!(help_buf.contents().contains("x"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_top_level_command() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog", "c"])).await;
    assert_eq!(code, 2);
    assert!(error_buf.contents().contains("no command"));
    assert!(help_buf
        .contents()
        .contains("Usage: prog <command> [command options]"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_parse_error_is_scoped_to_the_leaf() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog", "a", "-int", "notanumber"])).await;
    assert_eq!(code, 2);
    assert!(error_buf.contents().contains("invalid value"));
    assert!(error_buf.contents().contains("-int"));
    let help = help_buf.contents();
    assert!(help.contains("Echo the input string."));
    assert!(help.contains("-int"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_flags_and_positionals_reach_the_leaf() {
    let log = RunLog::default();
    let (mut cli, _help, _error) = harness(log.clone());
    let code = cli
        .run(&args(&["prog", "a", "-echoed", "hi", "-int", "3", "tail", "end"]))
        .await;
    assert_eq!(code, 0);
    let log = log.lock().unwrap();
    assert_eq!(log[0].rendered, "hi 3");
    assert_eq!(log[0].args, args(&["tail", "end"]));
}

#[tokio::test]
async fn test_unset_flags_keep_their_defaults() {
    let log = RunLog::default();
    let (mut cli, _help, _error) = harness(log.clone());
    let code = cli.run(&args(&["prog", "a"])).await;
    assert_eq!(code, 0);
    assert_eq!(log.lock().unwrap()[0].rendered, "default string 0");
}

#[tokio::test]
async fn test_duplicate_registration_keeps_the_first_command() {
    let log = RunLog::default();
    let (mut cli, _help, _error) = harness(log.clone());
    let added = cli.add_command(
        "a",
        Box::new(Echo {
            echoed: "shadow".to_string(),
            log: log.clone(),
            ..Default::default()
        }),
    );
    assert!(!added);
    cli.run(&args(&["prog", "a"])).await;
    assert_eq!(log.lock().unwrap()[0].rendered, "default string 0");
}

#[derive(Default, Flags)]
struct Strict {
    #[flag(name = "project-id", usage = "project to operate on")]
    project_id: i64,
    log: RunLog,
}

#[async_trait]
impl Command for Strict {
    fn help(&self) -> String {
        String::new()
    }

    fn synopsis(&self) -> String {
        "Operate on one project.".to_string()
    }

    async fn run(&mut self, ctx: Context) -> Result<(), RunError> {
        self.log.lock().unwrap().push(Record {
            path: ctx.path,
            args: ctx.args,
            rendered: self.project_id.to_string(),
        });
        Ok(())
    }

    fn validate(&mut self, _args: &[String]) -> Result<(), ValidationError> {
        if self.project_id == 0 {
            return Err(ValidationError::new("project-id is required"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_validation_reports_like_a_parse_failure() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    cli.add_command(
        "strict",
        Box::new(Strict {
            log: log.clone(),
            ..Default::default()
        }),
    );

    let code = cli.run(&args(&["prog", "strict"])).await;
    assert_eq!(code, 2);
    assert!(error_buf.contents().contains("project-id is required"));
    assert!(help_buf.contents().contains("Operate on one project."));
    assert!(log.lock().unwrap().is_empty());

    let code = cli.run(&args(&["prog", "strict", "-project-id", "7"])).await;
    assert_eq!(code, 0);
    assert_eq!(log.lock().unwrap()[0].rendered, "7");
}

#[derive(Default, Flags)]
struct Failing;

#[async_trait]
impl Command for Failing {
    fn help(&self) -> String {
        String::new()
    }

    fn synopsis(&self) -> String {
        "Always fails.".to_string()
    }

    async fn run(&mut self, _ctx: Context) -> Result<(), RunError> {
        Err(RunError::user("boom"))
    }
}

#[tokio::test]
async fn test_run_failure_maps_to_the_command_exit_code() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log);
    cli.add_command("fail", Box::new(Failing));
    let code = cli.run(&args(&["prog", "fail"])).await;
    assert_eq!(code, 1);
    assert!(error_buf.contents().contains("boom"));
    assert!(help_buf.contents().contains("Always fails."));
}

#[tokio::test]
async fn test_help_flag_renders_scoped_help() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog", "a", "-h"])).await;
    assert_eq!(code, 0);
    assert_eq!(error_buf.contents(), "");
    let help = help_buf.contents();
    assert!(help.contains("Options:"));
    assert!(help.contains("-echoed"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_help_command() {
    let log = RunLog::default();
    let (mut cli, help_buf, _error) = harness(log.clone());
    let code = cli.run(&args(&["prog", "help", "b"])).await;
    assert_eq!(code, 0);
    assert!(help_buf.contents().contains("Sub commands:"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_help_for_unknown_path() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log);
    let code = cli.run(&args(&["prog", "help", "zzz"])).await;
    assert_eq!(code, 2);
    assert!(error_buf.contents().contains("no command"));
    assert!(help_buf.contents().contains("Commands:"));
}

#[tokio::test]
async fn test_default_command_substitution() {
    let log = RunLog::default();
    let (cli, _help, _error) = harness(log.clone());
    let mut cli = cli.with_default("a");
    let code = cli.run(&args(&["prog"])).await;
    assert_eq!(code, 0);
    assert_eq!(log.lock().unwrap()[0].rendered, "default string 0");
}

#[tokio::test]
async fn test_empty_argv_without_default_shows_the_overview() {
    let log = RunLog::default();
    let (mut cli, help_buf, error_buf) = harness(log.clone());
    let code = cli.run(&args(&["prog"])).await;
    assert_eq!(code, 0);
    assert_eq!(error_buf.contents(), "");
    let help = help_buf.contents();
    assert!(help.contains("Usage: prog <command> [command options]"));
    assert!(help.contains("Version: 1.0.0"));
    assert!(help.contains("Commands:"));
    assert!(help.contains("Echo the input string."));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_double_dash_passes_flag_lookalikes_through() {
    let log = RunLog::default();
    let (mut cli, _help, _error) = harness(log.clone());
    let code = cli.run(&args(&["prog", "a", "--", "-int", "x"])).await;
    assert_eq!(code, 0);
    let log = log.lock().unwrap();
    assert_eq!(log[0].args, args(&["-int", "x"]));
    assert_eq!(log[0].rendered, "default string 0");
}
