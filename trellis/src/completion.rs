//! Shell completion responder.
//!
//! Bash's `complete -C` protocol re-invokes the program with `COMP_LINE`
//! holding the line typed so far and `COMP_POINT` the cursor offset into it.
//! The responder replays the command-tree walk against that line, treating
//! the word under the cursor as a prefix, and prints one candidate per line.
//! No command is ever run on this path.

use std::collections::BTreeMap;
use std::env;

use crate::help;
use crate::tree::Node;

/// A completion query decoded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The full command line typed so far.
    pub line: String,
    /// Cursor offset into the line, if the shell supplied one.
    pub point: Option<usize>,
}

impl CompletionRequest {
    pub const LINE_VAR: &'static str = "COMP_LINE";
    pub const POINT_VAR: &'static str = "COMP_POINT";

    /// Detect completion mode from the environment.
    pub fn from_env() -> Option<Self> {
        let line = env::var(Self::LINE_VAR).ok()?;
        let point = env::var(Self::POINT_VAR)
            .ok()
            .and_then(|point| point.parse().ok());
        Some(Self { line, point })
    }

    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            point: None,
        }
    }

    pub fn with_point(mut self, point: usize) -> Self {
        self.point = Some(point);
        self
    }

    /// Split the line into fully typed words (program name dropped) and the
    /// partial word under the cursor. A line ending in whitespace has an
    /// empty partial word.
    pub fn words(&self) -> (Vec<String>, String) {
        let mut line = self.line.as_str();
        if let Some(mut point) = self.point {
            if point < line.len() {
                while !line.is_char_boundary(point) {
                    point -= 1;
                }
                line = &line[..point];
            }
        }
        let trailing = line.ends_with(char::is_whitespace);
        let mut words: Vec<&str> = line.split_whitespace().collect();
        let partial = if trailing {
            String::new()
        } else {
            words.pop().unwrap_or("").to_string()
        };
        let full = words.iter().skip(1).map(|word| word.to_string()).collect();
        (full, partial)
    }
}

/// Candidates for one request, in listing order.
///
/// Fully typed words descend the tree by exact match. At an internal level
/// the matching child names are the candidates; at a leaf the registered flag
/// names are, in `-name` form.
pub(crate) fn candidates(
    commands: &mut BTreeMap<String, Node>,
    request: &CompletionRequest,
) -> Vec<String> {
    let (full, partial) = request.words();
    let mut map = commands;
    let mut words = full.iter();
    loop {
        let Some(word) = words.next() else {
            return map
                .keys()
                .filter(|name| name.starts_with(&partial))
                .cloned()
                .collect();
        };
        let Some(node) = map.get_mut(word.as_str()) else {
            return Vec::new();
        };
        if node.is_leaf() {
            let Ok(specs) = help::flag_specs(node.command.as_mut()) else {
                return Vec::new();
            };
            return specs
                .iter()
                .map(|spec| format!("-{}", spec.name))
                .filter(|candidate| candidate.starts_with(&partial))
                .collect();
        }
        map = &mut node.children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_with_partial() {
        let request = CompletionRequest::new("prog b x");
        let (full, partial) = request.words();
        assert_eq!(full, vec!["b".to_string()]);
        assert_eq!(partial, "x");
    }

    #[test]
    fn test_words_with_trailing_space() {
        let request = CompletionRequest::new("prog b ");
        let (full, partial) = request.words();
        assert_eq!(full, vec!["b".to_string()]);
        assert_eq!(partial, "");
    }

    #[test]
    fn test_words_truncated_at_point() {
        let request = CompletionRequest::new("prog queue info -cu").with_point(9);
        let (full, partial) = request.words();
        assert_eq!(full, Vec::<String>::new());
        assert_eq!(partial, "queu");
    }

    #[test]
    fn test_words_point_past_end_is_ignored() {
        let request = CompletionRequest::new("prog b x").with_point(999);
        let (full, partial) = request.words();
        assert_eq!(full, vec!["b".to_string()]);
        assert_eq!(partial, "x");
    }

    #[test]
    fn test_words_empty_line() {
        let request = CompletionRequest::new("");
        let (full, partial) = request.words();
        assert!(full.is_empty());
        assert_eq!(partial, "");
    }
}
