//! Diagnostics go to stderr so stdout stays free for change reports.
//!
//! Levels come from the `[logging]` table of the settings file:
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! fswatch = "debug"
//! notify = "info"
//! ```
//!
//! which becomes the directive list `warn,fswatch=debug,notify=info`. When
//! `RUST_LOG` is set it replaces that list entirely.

use std::sync::Once;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Local wall clock with millisecond precision, no date.
struct WallClock;

impl FormatTime for WallClock {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Render `config` as an `EnvFilter` directive list, default level first.
pub fn filter_directives(config: &LoggingConfig) -> String {
    config
        .modules
        .iter()
        .fold(config.default.clone(), |mut directives, (module, level)| {
            directives.push(',');
            directives.push_str(module);
            directives.push('=');
            directives.push_str(level);
            directives
        })
}

/// Install the stderr subscriber.
///
/// Only the first call in a process does anything. A set `RUST_LOG` wins
/// over `config`, and an already installed global subscriber is left alone.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = match std::env::var_os("RUST_LOG") {
            Some(_) => EnvFilter::from_default_env(),
            None => EnvFilter::new(filter_directives(config)),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(WallClock)
            .with_target(true)
            .with_filter(filter);

        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}

/// [`init_with_config`] with the default `warn` level.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[doc(hidden)]
#[macro_export]
macro_rules! __component_event {
    ($level:expr, $component:expr, $event:expr) => {
        ::tracing::event!($level, "[{}] {}", $component, $event)
    };
    ($level:expr, $component:expr, $event:expr, $($arg:tt)+) => {
        ::tracing::event!($level, "[{}] {}: {}", $component, $event, format_args!($($arg)+))
    };
}

/// `info` line tagged with a component, rendered as `[component] event: detail`.
///
/// ```ignore
/// log_event!("cli", "watching", "{} files", count);
/// ```
#[macro_export]
macro_rules! log_event {
    ($($body:tt)+) => {
        $crate::__component_event!(::tracing::Level::INFO, $($body)+)
    };
}

/// `debug` counterpart of [`log_event!`].
#[macro_export]
macro_rules! debug_event {
    ($($body:tt)+) => {
        $crate::__component_event!(::tracing::Level::DEBUG, $($body)+)
    };
}
