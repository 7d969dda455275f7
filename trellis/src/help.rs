//! Help rendering.
//!
//! Text is composed into a `String` first and written to the help surface in
//! one piece, so a failing introspection never leaves partial output behind.
//! Flag metadata comes from a dry bind: a throwaway [`FlagSet`] captures each
//! flag's name, usage and rendered default without disturbing the command.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::command::Command;
use crate::error::BindError;
use crate::flags::{FlagSet, FlagSpec, Flags};
use crate::tree::Node;
use crate::value::FlagKind;

/// Root metadata the overview header is rendered from.
pub(crate) struct Header<'h> {
    pub name: &'h str,
    pub version: &'h str,
    pub description: &'h str,
    pub authors: &'h [String],
}

/// Collect flag metadata without touching the command's live parse state.
pub(crate) fn flag_specs(command: &mut dyn Command) -> Result<Vec<FlagSpec>, BindError> {
    let mut set = FlagSet::new();
    command.bind(&mut set, "")?;
    Ok(set.specs())
}

/// Render the whole-tree overview shown when nothing resolved.
pub(crate) fn render_overview(
    header: &Header<'_>,
    commands: &mut BTreeMap<String, Node>,
) -> Result<String, BindError> {
    let mut out = String::new();
    let _ = write!(out, "Usage: {}", header.name);
    if !commands.is_empty() {
        out.push_str(" <command> [command options]");
    }
    out.push('\n');
    if !header.version.is_empty() {
        let _ = writeln!(out, "Version: {}", header.version);
    }
    match header.authors.len() {
        0 => {}
        1 => {
            let _ = writeln!(out, "Author: {}", header.authors[0]);
        }
        _ => {
            let _ = writeln!(out, "Authors: {}", header.authors.join(", "));
        }
    }
    if !header.description.is_empty() {
        out.push_str("Description:\n");
        for line in header.description.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    if !commands.is_empty() {
        out.push_str("\nCommands:\n");
        render_children(&mut out, commands, "  ")?;
    }
    Ok(out)
}

/// Render help for one resolved node.
pub(crate) fn render_command(
    program: &str,
    path: &[String],
    node: &mut Node,
) -> Result<String, BindError> {
    let mut out = String::new();
    let synopsis = node.command.synopsis();
    if !synopsis.is_empty() {
        let _ = writeln!(out, "{synopsis}");
        out.push('\n');
    }
    let _ = write!(out, "Usage: {} {}", program, path.join(" "));
    if node.is_leaf() {
        out.push_str(" [options]");
    } else {
        out.push_str(" <sub command> [options]");
    }
    out.push('\n');
    let help = node.command.help();
    if !help.is_empty() && help != synopsis {
        out.push('\n');
        for line in help.lines() {
            let _ = writeln!(out, "{line}");
        }
    }
    let specs = flag_specs(node.command.as_mut())?;
    if !specs.is_empty() {
        out.push_str("\nOptions:\n");
        render_flag_block(&mut out, &specs, "  ");
    }
    if !node.children.is_empty() {
        out.push_str("\nSub commands:\n");
        render_children(&mut out, &mut node.children, "  ")?;
    }
    Ok(out)
}

/// List children under a node: names padded to a common width, each with its
/// synopsis and its own flag block.
fn render_children(
    out: &mut String,
    children: &mut BTreeMap<String, Node>,
    indent: &str,
) -> Result<(), BindError> {
    let width = children.keys().map(String::len).max().unwrap_or(0);
    for (name, node) in children.iter_mut() {
        let _ = writeln!(
            out,
            "{indent}{name:<width$}  {}",
            node.command.synopsis()
        );
        let deep = format!("{indent}    ");
        let specs = flag_specs(node.command.as_mut())?;
        render_flag_block(out, &specs, &deep);
        if !node.children.is_empty() {
            let names: Vec<&str> = node.children.keys().map(String::as_str).collect();
            let _ = writeln!(out, "{deep}sub commands: {}", names.join(", "));
        }
    }
    Ok(())
}

fn render_flag_block(out: &mut String, specs: &[FlagSpec], indent: &str) {
    for spec in specs {
        let _ = write!(out, "{indent}-{}", spec.name);
        if spec.kind != FlagKind::Bool {
            let _ = write!(out, " {}", spec.kind);
        }
        out.push('\n');
        let mut detail = spec.usage.clone();
        if spec.has_default() {
            if !detail.is_empty() {
                detail.push(' ');
            }
            if spec.kind == FlagKind::String || spec.kind == FlagKind::Value {
                let _ = write!(detail, "(default {:?})", spec.default);
            } else {
                let _ = write!(detail, "(default {})", spec.default);
            }
        }
        if !detail.is_empty() {
            let _ = writeln!(out, "{indent}      {detail}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_flag_block_shapes() {
        let specs = vec![
            FlagSpec {
                name: "v".to_string(),
                usage: "print debug and info messages".to_string(),
                default: "false".to_string(),
                kind: FlagKind::Bool,
            },
            FlagSpec {
                name: "from".to_string(),
                usage: "start of the range".to_string(),
                default: "2017/01/01".to_string(),
                kind: FlagKind::String,
            },
        ];
        let mut out = String::new();
        render_flag_block(&mut out, &specs, "  ");
        let expected = "  -v\n        print debug and info messages\n  -from string\n        start of the range (default \"2017/01/01\")\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_overview_header_only() {
        let header = Header {
            name: "archiver",
            version: "1.0.0",
            description: "Archive things.",
            authors: &["someone".to_string()],
        };
        let mut commands = BTreeMap::new();
        let text = render_overview(&header, &mut commands).unwrap();
        assert_eq!(
            text,
            "Usage: archiver\nVersion: 1.0.0\nAuthor: someone\nDescription:\n  Archive things.\n"
        );
    }
}
