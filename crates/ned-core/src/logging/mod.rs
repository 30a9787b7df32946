//! Structured logging foundation for ned.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for batch pipelines
//!
//! stdout is reserved for report payloads; all log output goes to stderr.
//!
//! # Usage
//!
//! ```ignore
//! use ned_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id(), get_host_id());
//! log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "Starting study");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Initialize the logging subsystem.
///
/// Call once at startup. A subscriber installed earlier (tests, embedders)
/// is left in place.
pub fn init_logging(config: &LogConfig) {
    let filter = config.filter();
    let layer = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                fmt_layer.with_filter(filter).boxed()
            } else {
                fmt_layer.without_time().with_filter(filter).boxed()
            }
        }
        LogFormat::Jsonl => JsonlLayer::stderr().with_filter(filter).boxed(),
    };
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

/// Run identifier: UTC start time plus a random suffix, so ids sort by time.
pub fn generate_run_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &suffix[..6])
}

/// Stable, non-reversible host identifier for log correlation.
///
/// Hashes `/etc/machine-id`, falling back to `$HOSTNAME`, then to a random
/// value for this process.
pub fn get_host_id() -> String {
    let source = std::fs::read_to_string("/etc/machine-id")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    format!("host-{}", &digest[..8])
}

/// Structured event logging with the run's correlation fields.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::LOAD_FINISHED, Stage::Load, "Trace loaded");
/// log_event!(ctx, DEBUG, event_names::COUNT_FINISHED, Stage::Count, "Totals counted",
///     task_total = 120u64, notask_total = 9000u64);
/// ```
#[macro_export]
macro_rules! log_event {
    (@emit $level:ident, $ctx:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::$level!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            system = %$ctx.system_field(),
            stage = %$stage,
            message = %$msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $($rest:tt)*) => {
        $crate::log_event!(@emit debug, $ctx, $($rest)*)
    };
    ($ctx:expr, INFO, $($rest:tt)*) => {
        $crate::log_event!(@emit info, $ctx, $($rest)*)
    };
    ($ctx:expr, WARN, $($rest:tt)*) => {
        $crate::log_event!(@emit warn, $ctx, $($rest)*)
    };
    ($ctx:expr, ERROR, $($rest:tt)*) => {
        $crate::log_event!(@emit error, $ctx, $($rest)*)
    };
}
