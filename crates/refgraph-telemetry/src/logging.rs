//! Structured logging on stderr.
//!
//! stdout is reserved for command output, so every layer writes to stderr.

use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{LogFormat, TelemetryConfig, TelemetryError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. An unparsable configured level
/// is an error rather than a silent fallback.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            TelemetryError::LoggingInit(format!("invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    tracing_subscriber::registry()
        .with(output_layer(config.log_format).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn output_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    }
}

/// Standard log event names.
pub mod events {
    /// A resolution run is starting.
    pub const RESOLUTION_STARTED: &str = "resolution_started";

    /// A root's reference graph has been resolved.
    pub const RESOLUTION_COMPLETED: &str = "resolution_completed";

    /// A reference could not be fetched.
    pub const REFERENCE_MISSING: &str = "reference_missing";

    /// A root spec could not be loaded or parsed.
    pub const RESOLUTION_FAILED: &str = "resolution_failed";

    /// Component slots were planned for a root.
    pub const SLOTS_PLANNED: &str = "slots_planned";
}

/// Emit a tracing event at `$level` tagged with a standard event name.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($level:ident, $event:ident, $($field:tt)*) => {
        tracing::$level!(event = $crate::logging::events::$event, $($field)*)
    };
}

#[macro_export]
macro_rules! log_resolution_started {
    ($($field:tt)*) => { $crate::__log_event!(info, RESOLUTION_STARTED, $($field)*) };
}

#[macro_export]
macro_rules! log_resolution_completed {
    ($($field:tt)*) => { $crate::__log_event!(info, RESOLUTION_COMPLETED, $($field)*) };
}

#[macro_export]
macro_rules! log_reference_missing {
    ($($field:tt)*) => { $crate::__log_event!(warn, REFERENCE_MISSING, $($field)*) };
}

#[macro_export]
macro_rules! log_resolution_failed {
    ($($field:tt)*) => { $crate::__log_event!(error, RESOLUTION_FAILED, $($field)*) };
}

#[macro_export]
macro_rules! log_slots_planned {
    ($($field:tt)*) => { $crate::__log_event!(info, SLOTS_PLANNED, $($field)*) };
}
