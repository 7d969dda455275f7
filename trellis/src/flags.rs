//! Flag registration and parsing.
//!
//! [`FlagSet`] is the registration target the `#[derive(Flags)]` macro binds
//! struct fields into: one typed registration method per supported kind, a
//! token parser over an argument slice, programmatic assignment, and an
//! enumeration snapshot for help and completion. A set borrows the command it
//! was bound from, so parsing writes straight back into the struct's fields.

use std::time::Duration;

use crate::error::{BindError, ParseError};
use crate::value::{Binding, FlagKind, FlagValue};

/// Implemented (normally via `#[derive(Flags)]`) by any struct whose fields
/// can be registered as command-line flags.
///
/// Binding is opt-in per field and idempotent per flag-set instance: binding
/// the same struct to a fresh set is always safe, while registering a name
/// twice on one set is a [`BindError`].
pub trait Flags {
    /// Register every flag-tagged field into `set`, qualified by `prefix`.
    fn bind<'a>(&'a mut self, set: &mut FlagSet<'a>, prefix: &str) -> Result<(), BindError>;
}

/// One registered flag: its metadata plus the slot it writes through.
struct Flag<'a> {
    name: String,
    usage: String,
    default: String,
    binding: Binding<'a>,
}

/// An owned snapshot of one registered flag, for help and completion.
#[derive(Debug, Clone)]
pub struct FlagSpec {
    pub name: String,
    pub usage: String,
    pub default: String,
    pub kind: FlagKind,
}

impl FlagSpec {
    /// True when the captured default is worth showing in help output.
    pub fn has_default(&self) -> bool {
        !matches!(self.default.as_str(), "" | "false" | "0" | "0s")
    }
}

/// A set of flags bound to the fields of one command.
///
/// # Example
///
/// ```
/// use trellis::FlagSet;
///
/// let mut verbose = false;
/// let mut set = FlagSet::new();
/// set.bool_var(&mut verbose, "v", "print debug and info messages").unwrap();
/// set.parse(&["-v".to_string()]).unwrap();
/// drop(set);
/// assert!(verbose);
/// ```
#[derive(Default)]
pub struct FlagSet<'a> {
    flags: Vec<Flag<'a>>,
    args: Vec<String>,
}

impl<'a> FlagSet<'a> {
    pub fn new() -> Self {
        Self {
            flags: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Join a dotted prefix onto a flag name.
    pub fn qualify(prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    fn register(&mut self, name: &str, usage: &str, binding: Binding<'a>) -> Result<(), BindError> {
        if name.is_empty() || name.starts_with('-') || name.contains('=') {
            return Err(BindError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.flags.iter().any(|flag| flag.name == name) {
            return Err(BindError::Duplicate {
                name: name.to_string(),
            });
        }
        self.flags.push(Flag {
            name: name.to_string(),
            usage: usage.to_string(),
            default: binding.render(),
            binding,
        });
        Ok(())
    }

    pub fn bool_var(&mut self, p: &'a mut bool, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Bool(p))
    }

    pub fn int_var(&mut self, p: &'a mut i32, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Int(p))
    }

    pub fn int64_var(&mut self, p: &'a mut i64, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Int64(p))
    }

    pub fn uint_var(&mut self, p: &'a mut u32, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Uint(p))
    }

    pub fn uint64_var(&mut self, p: &'a mut u64, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Uint64(p))
    }

    pub fn float64_var(&mut self, p: &'a mut f64, name: &str, usage: &str) -> Result<(), BindError> {
        self.register(name, usage, Binding::Float64(p))
    }

    pub fn string_var(
        &mut self,
        p: &'a mut String,
        name: &str,
        usage: &str,
    ) -> Result<(), BindError> {
        self.register(name, usage, Binding::String(p))
    }

    pub fn duration_var(
        &mut self,
        p: &'a mut Duration,
        name: &str,
        usage: &str,
    ) -> Result<(), BindError> {
        self.register(name, usage, Binding::Duration(p))
    }

    /// Register a custom [`FlagValue`] implementation.
    pub fn var(
        &mut self,
        p: &'a mut dyn FlagValue,
        name: &str,
        usage: &str,
    ) -> Result<(), BindError> {
        self.register(name, usage, Binding::Value(p))
    }

    /// Parse a token slice, writing values through the registered bindings.
    ///
    /// Accepted forms: `-name value`, `-name=value`, bare `-bool-flag`, with
    /// `--name` equivalent to `-name`. Parsing stops at `--`, at a lone `-`,
    /// or at the first token that does not start with `-`; everything from
    /// there on is kept as the positional remainder ([`FlagSet::args`]).
    pub fn parse(&mut self, args: &[String]) -> Result<(), ParseError> {
        let mut index = 0;
        while index < args.len() {
            let token = args[index].as_str();
            if token == "--" {
                index += 1;
                break;
            }
            if token == "-" || !token.starts_with('-') {
                break;
            }
            let body = token.strip_prefix("--").unwrap_or(&token[1..]);
            if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
                return Err(ParseError::BadSyntax {
                    token: token.to_string(),
                });
            }
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            let Some(flag) = self.flags.iter_mut().find(|flag| flag.name == name) else {
                if name == "h" || name == "help" {
                    return Err(ParseError::HelpRequested);
                }
                return Err(ParseError::UnknownFlag {
                    name: name.to_string(),
                });
            };
            let raw = if flag.binding.kind() == FlagKind::Bool {
                inline.unwrap_or_else(|| "true".to_string())
            } else {
                match inline {
                    Some(value) => value,
                    None => {
                        index += 1;
                        args.get(index)
                            .cloned()
                            .ok_or_else(|| ParseError::MissingValue {
                                name: name.to_string(),
                            })?
                    }
                }
            };
            flag.binding
                .assign(&raw)
                .map_err(|source| ParseError::InvalidValue {
                    name: name.to_string(),
                    value: raw.clone(),
                    source,
                })?;
            index += 1;
        }
        self.args = args[index..].to_vec();
        Ok(())
    }

    /// Programmatic assignment, outside of token parsing.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let Some(flag) = self.flags.iter_mut().find(|flag| flag.name == name) else {
            return Err(ParseError::UnknownFlag {
                name: name.to_string(),
            });
        };
        flag.binding
            .assign(value)
            .map_err(|source| ParseError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                source,
            })
    }

    /// Positional arguments left over by the last [`FlagSet::parse`] call.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of registered flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Owned metadata snapshot of every registered flag, in registration
    /// order.
    pub fn specs(&self) -> Vec<FlagSpec> {
        self.flags
            .iter()
            .map(|flag| FlagSpec {
                name: flag.name.clone(),
                usage: flag.usage.clone(),
                default: flag.default.clone(),
                kind: flag.binding.kind(),
            })
            .collect()
    }
}
