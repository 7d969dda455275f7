//! Flag value typing.
//!
//! Every flag writes through a [`Binding`]: a typed slot borrowed from the
//! command struct it belongs to. The supported primitive kinds mirror the
//! conventional long-option vocabulary (`bool`, signed/unsigned integers,
//! `f64`, `String`, `Duration`); anything else goes through the [`FlagValue`]
//! escape hatch.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// A raw token could not be converted into a flag's value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValueError(String);

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A custom flag value type.
///
/// Fields whose type is not one of the built-in primitives are registered
/// through this trait, which takes precedence over the primitive dispatch:
/// a newtype over `String` is a custom value, not a string flag.
///
/// # Example
///
/// ```
/// use trellis::{FlagValue, ValueError};
///
/// #[derive(Default)]
/// struct Csv(Vec<String>);
///
/// impl FlagValue for Csv {
///     fn render(&self) -> String {
///         self.0.join(",")
///     }
///
///     fn assign(&mut self, value: &str) -> Result<(), ValueError> {
///         self.0.push(value.to_string());
///         Ok(())
///     }
/// }
/// ```
pub trait FlagValue: Send {
    /// Render the current value, as shown in help output defaults.
    fn render(&self) -> String;

    /// Replace the current value with one parsed from a raw token.
    fn assign(&mut self, value: &str) -> Result<(), ValueError>;
}

/// The semantic kind of a registered flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    Int,
    Int64,
    Uint,
    Uint64,
    Float64,
    String,
    Duration,
    /// A custom [`FlagValue`] implementation.
    Value,
}

impl FlagKind {
    pub fn name(self) -> &'static str {
        match self {
            FlagKind::Bool => "bool",
            FlagKind::Int => "int",
            FlagKind::Int64 => "int64",
            FlagKind::Uint => "uint",
            FlagKind::Uint64 => "uint64",
            FlagKind::Float64 => "float64",
            FlagKind::String => "string",
            FlagKind::Duration => "duration",
            FlagKind::Value => "value",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed slot one flag writes through.
pub enum Binding<'a> {
    Bool(&'a mut bool),
    Int(&'a mut i32),
    Int64(&'a mut i64),
    Uint(&'a mut u32),
    Uint64(&'a mut u64),
    Float64(&'a mut f64),
    String(&'a mut String),
    Duration(&'a mut Duration),
    Value(&'a mut (dyn FlagValue + 'a)),
}

impl<'a> Binding<'a> {
    pub fn kind(&self) -> FlagKind {
        match self {
            Binding::Bool(_) => FlagKind::Bool,
            Binding::Int(_) => FlagKind::Int,
            Binding::Int64(_) => FlagKind::Int64,
            Binding::Uint(_) => FlagKind::Uint,
            Binding::Uint64(_) => FlagKind::Uint64,
            Binding::Float64(_) => FlagKind::Float64,
            Binding::String(_) => FlagKind::String,
            Binding::Duration(_) => FlagKind::Duration,
            Binding::Value(_) => FlagKind::Value,
        }
    }

    /// Render the value currently stored behind this binding.
    pub fn render(&self) -> String {
        match self {
            Binding::Bool(v) => v.to_string(),
            Binding::Int(v) => v.to_string(),
            Binding::Int64(v) => v.to_string(),
            Binding::Uint(v) => v.to_string(),
            Binding::Uint64(v) => v.to_string(),
            Binding::Float64(v) => v.to_string(),
            Binding::String(v) => (**v).clone(),
            Binding::Duration(v) => format_duration(**v),
            Binding::Value(v) => v.render(),
        }
    }

    /// Parse a raw token and store it behind this binding.
    pub fn assign(&mut self, raw: &str) -> Result<(), ValueError> {
        match self {
            Binding::Bool(v) => **v = parse_bool(raw)?,
            Binding::Int(v) => **v = parse_number(raw, FlagKind::Int)?,
            Binding::Int64(v) => **v = parse_number(raw, FlagKind::Int64)?,
            Binding::Uint(v) => **v = parse_number(raw, FlagKind::Uint)?,
            Binding::Uint64(v) => **v = parse_number(raw, FlagKind::Uint64)?,
            Binding::Float64(v) => **v = parse_number(raw, FlagKind::Float64)?,
            Binding::String(v) => **v = raw.to_string(),
            Binding::Duration(v) => **v = parse_duration(raw)?,
            Binding::Value(v) => v.assign(raw)?,
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(ValueError::new(format!("invalid bool value {raw:?}"))),
    }
}

fn parse_number<T: FromStr>(raw: &str, kind: FlagKind) -> Result<T, ValueError> {
    raw.parse()
        .map_err(|_| ValueError::new(format!("invalid {kind} value {raw:?}")))
}

/// Parse a duration in conventional suffix notation: `300ms`, `2s`, `15m`,
/// `1h30m`. Units are `ns`, `us`, `ms`, `s`, `m`, `h`; segments concatenate
/// and fractional values are accepted (`1.5h`).
pub fn parse_duration(raw: &str) -> Result<Duration, ValueError> {
    if raw == "0" {
        return Ok(Duration::ZERO);
    }
    let bad = || ValueError::new(format!("invalid duration value {raw:?}"));
    let mut rest = raw;
    let mut seconds = 0f64;
    if rest.is_empty() {
        return Err(bad());
    }
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| bad())?;
        if split == 0 {
            return Err(bad());
        }
        let value: f64 = rest[..split].parse().map_err(|_| bad())?;
        rest = &rest[split..];
        let (scale, used) = if rest.starts_with("ns") {
            (1e-9, 2)
        } else if rest.starts_with("us") {
            (1e-6, 2)
        } else if rest.starts_with("ms") {
            (1e-3, 2)
        } else if rest.starts_with('s') {
            (1.0, 1)
        } else if rest.starts_with('m') {
            (60.0, 1)
        } else if rest.starts_with('h') {
            (3600.0, 1)
        } else {
            return Err(bad());
        };
        seconds += value * scale;
        rest = &rest[used..];
    }
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(bad());
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Render a duration back into suffix notation.
pub fn format_duration(duration: Duration) -> String {
    if duration == Duration::ZERO {
        return "0s".to_string();
    }
    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return with_unit(nanos as f64 / 1e3, "us");
    }
    if nanos < 1_000_000_000 {
        return with_unit(nanos as f64 / 1e6, "ms");
    }
    let secs = duration.as_secs();
    let subsec = duration.subsec_nanos();
    let mut out = String::new();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let whole = secs % 60;
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if subsec > 0 {
        out.push_str(&with_unit(whole as f64 + subsec as f64 / 1e9, "s"));
    } else if whole > 0 {
        out.push_str(&format!("{whole}s"));
    }
    out
}

fn with_unit(value: f64, unit: &str) -> String {
    format!("{value}{unit}")
}
