//! Error taxonomy for binding, resolution, parsing and validation.
//!
//! None of these abort the process: the dispatcher reports them on the error
//! surface and renders help scoped to the deepest matched command.

use thiserror::Error;

use crate::value::ValueError;

/// A struct's flag metadata could not be registered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// A flag with this name is already registered on the target flag set.
    #[error("flag {name:?} is already defined")]
    Duplicate { name: String },

    /// Flag names must be non-empty and must not look like flag syntax.
    #[error("invalid flag name {name:?}")]
    InvalidName { name: String },
}

/// The flag parser rejected a token.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown flag -{name}")]
    UnknownFlag { name: String },

    #[error("bad flag syntax {token:?}")]
    BadSyntax { token: String },

    #[error("flag -{name} needs a value")]
    MissingValue { name: String },

    #[error("invalid value {value:?} for flag -{name}: {source}")]
    InvalidValue {
        name: String,
        value: String,
        #[source]
        source: ValueError,
    },

    /// `-h`/`-help` was given and the command defines no such flag.
    #[error("help requested")]
    HelpRequested,
}

/// A command's post-parse validation rejected the parsed input.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Anything that can stop dispatch before a command runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No top-level command matched the first argument.
    #[error("no command {name:?}")]
    NoCommand { name: String },

    /// An internal node was reached without a usable sub-command token.
    #[error("missing sub command")]
    MissingSubCommand { path: Vec<String> },

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        let err = BindError::Duplicate {
            name: "v".to_string(),
        };
        assert_eq!(err.to_string(), "flag \"v\" is already defined");

        let err = DispatchError::MissingSubCommand {
            path: vec!["queue".to_string()],
        };
        assert_eq!(err.to_string(), "missing sub command");

        let err = ParseError::MissingValue {
            name: "from".to_string(),
        };
        assert_eq!(err.to_string(), "flag -from needs a value");
    }

    #[test]
    fn test_invalid_value_carries_source() {
        let err = ParseError::InvalidValue {
            name: "int".to_string(),
            value: "whales".to_string(),
            source: ValueError::new("invalid int value \"whales\""),
        };
        let text = err.to_string();
        assert!(text.contains("-int"));
        assert!(text.contains("whales"));
    }
}
