//! Tracing setup shared by Tessera tests, benches and binaries.
//!
//! Library crates only emit events. Whatever drives them installs the subscriber through
//! [`init_global_tracing`] or [`init_test_tracing`].

pub mod performance;

#[macro_use]
pub mod macros;

use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// How the global subscriber filters and formats events
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directives such as `tessera_runtime=debug,info`. Falls back to `RUST_LOG`,
    /// then to `default_directive`.
    pub directives: Option<String>,
    pub default_directive: String,
    pub output: TracingOutput,
    pub ansi: bool,
    /// When false, [`performance::PerformanceSpan`] guards skip their timing event.
    pub performance_spans: bool,
    /// Minimum duration in microseconds for a performance span to be logged
    pub performance_threshold_us: Option<u64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            output: TracingOutput::Compact,
            ansi: true,
            performance_spans: cfg!(debug_assertions),
            performance_threshold_us: None,
        }
    }
}

impl TracingConfig {
    /// Defaults overridden by the environment.
    ///
    /// # Environment Variables
    ///
    /// - `TESSERA_LOG` - filter directives
    /// - `TESSERA_LOG_FORMAT` - `compact` (default) or `json`; `json` turns off colour
    /// - `TESSERA_PERF_TRACING` - `true`/`1`/`yes` enables performance spans
    /// - `TESSERA_PERF_THRESHOLD_US` - minimum span duration to log
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(directives) = env::var("TESSERA_LOG") {
            if !directives.trim().is_empty() {
                config.directives = Some(directives);
            }
        }

        if let Ok(format) = env::var("TESSERA_LOG_FORMAT") {
            if let Some(output) = TracingOutput::from_env_value(&format) {
                config.output = output;
            }
        }
        if config.output == TracingOutput::Json {
            config.ansi = false;
        }

        if let Ok(flag) = env::var("TESSERA_PERF_TRACING") {
            config.performance_spans = matches!(flag.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }

        if let Ok(threshold) = env::var("TESSERA_PERF_THRESHOLD_US") {
            if let Ok(threshold_us) = threshold.trim().parse::<u64>() {
                config.performance_threshold_us = Some(threshold_us);
            }
        }

        config
    }

    /// Resolve the event filter: explicit directives, then `RUST_LOG`, then the default.
    pub fn filter(&self) -> Result<EnvFilter, TracingSetupError> {
        match &self.directives {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|err| TracingSetupError::InvalidFilter(err.to_string()))
            }
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_directive))),
        }
    }
}

/// Failure to install the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),

    /// Usually a subscriber is already installed
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[from] TryInitError),
}

/// Install the configured subscriber as the process-wide default.
pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    let filter = config.filter()?;
    performance::configure(config.performance_spans, config.performance_threshold_us);

    let registry = tracing_subscriber::registry().with(filter);
    match config.output {
        TracingOutput::Compact => registry.with(fmt::layer().compact().with_ansi(config.ansi)).try_init()?,
        TracingOutput::Json => registry.with(fmt::layer().json().with_ansi(false)).try_init()?,
    }
    Ok(())
}

/// Install a `warn`-level compact subscriber for tests; later calls are no-ops.
pub fn init_test_tracing() {
    let config = TracingConfig {
        default_directive: "warn".to_string(),
        output: TracingOutput::Compact,
        ansi: false,
        ..TracingConfig::from_env()
    };
    let _ = init_global_tracing(&config);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Json,
}

impl TracingOutput {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "TESSERA_LOG",
        "TESSERA_LOG_FORMAT",
        "TESSERA_PERF_TRACING",
        "TESSERA_PERF_THRESHOLD_US",
        "RUST_LOG",
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn rejects_invalid_directive() {
        let config = TracingConfig {
            directives: Some("=::invalid".to_string()),
            ..TracingConfig::default()
        };
        assert!(matches!(config.filter(), Err(TracingSetupError::InvalidFilter(_))));
        assert!(matches!(init_global_tracing(&config), Err(TracingSetupError::InvalidFilter(_))));
    }

    #[test]
    fn default_filter_falls_back_to_default_directive() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();
        let filter = TracingConfig::default().filter().unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn from_env_reads_directives_and_format() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();

        env::set_var("TESSERA_LOG", "tessera_core=trace");
        env::set_var("TESSERA_LOG_FORMAT", "JSON");

        let config = TracingConfig::from_env();
        assert_eq!(config.directives.as_deref(), Some("tessera_core=trace"));
        assert_eq!(config.output, TracingOutput::Json);
        assert!(!config.ansi);
        reset_env();
    }

    #[test]
    fn from_env_reads_performance_settings() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();

        env::set_var("TESSERA_PERF_TRACING", "yes");
        env::set_var("TESSERA_PERF_THRESHOLD_US", "250");
        let config = TracingConfig::from_env();
        assert!(config.performance_spans);
        assert_eq!(config.performance_threshold_us, Some(250));

        env::set_var("TESSERA_PERF_TRACING", "off");
        env::set_var("TESSERA_LOG_FORMAT", "xml");
        let config = TracingConfig::from_env();
        assert!(!config.performance_spans);
        assert_eq!(config.output, TracingOutput::Compact);
        reset_env();
    }
}
