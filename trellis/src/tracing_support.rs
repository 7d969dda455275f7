//! Tracing setup helpers.
//!
//! The engine emits `tracing` events on the dispatch and completion paths;
//! hosts that want to see them can install a subscriber with these helpers
//! instead of depending on `tracing-subscriber` themselves. Level filtering
//! honors `RUST_LOG` (`RUST_LOG=trellis=debug` shows the dispatch trace).

#[cfg(feature = "tracing-init")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for [`init_subscriber_with_format`].
#[cfg(feature = "tracing-init")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line format.
    Pretty,

    /// Single-line format.
    Compact,
}

/// Install a subscriber with the default compact format.
///
/// Defaults to the `info` level when `RUST_LOG` is not set.
#[cfg(feature = "tracing-init")]
pub fn init_subscriber() {
    init_subscriber_with_format(TracingFormat::Compact);
}

/// Install a subscriber with an explicit output format.
#[cfg(feature = "tracing-init")]
pub fn init_subscriber_with_format(format: TracingFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        TracingFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        TracingFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    }
}

// No-op when the tracing-init feature is disabled.
#[cfg(not(feature = "tracing-init"))]
pub fn init_subscriber() {}
