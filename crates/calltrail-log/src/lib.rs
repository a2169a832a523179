//! Logging infrastructure for calltrail.
//!
//! [`init`] installs the process log sink (stderr plus an optional
//! append-only file) and returns the [`LogCapture`] handle tracers use to
//! collect the lines emitted while a single call runs.

use std::io;
use std::path::PathBuf;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

mod capture;
pub mod spans;

pub use capture::{CaptureGuard, CaptureLayer, LogCapture};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level for the process sink.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path (if file logging enabled).
    pub file_path: Option<PathBuf>,
    /// Include source location.
    pub source_location: bool,
    /// Include span events.
    pub span_events: bool,
    /// Minimum level of lines collected into capture buffers.
    pub capture_level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl LogLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Directive form understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file_path: None,
            source_location: false,
            span_events: false,
            capture_level: LogLevel::Info,
        }
    }
}

impl LogConfig {
    /// Build a config from `CALLTRAIL_LOG_*` variables.
    ///
    /// `RUST_LOG` is consulted for the level only when `CALLTRAIL_LOG_LEVEL`
    /// is unset. Unparseable values keep the default.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        let flag = |name: &str| var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1");
        let defaults = Self::default();

        Self {
            level: var("CALLTRAIL_LOG_LEVEL")
                .or_else(|| var("RUST_LOG"))
                .and_then(|l| LogLevel::parse(&l))
                .unwrap_or(defaults.level),
            format: var("CALLTRAIL_LOG_FORMAT")
                .and_then(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.format),
            file_path: var("CALLTRAIL_LOG_FILE").map(PathBuf::from),
            source_location: flag("CALLTRAIL_LOG_SOURCE").unwrap_or(defaults.source_location),
            span_events: flag("CALLTRAIL_LOG_SPANS").unwrap_or(defaults.span_events),
            capture_level: defaults.capture_level,
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn output_layer<W>(&self, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Pretty => layer
                .with_ansi(ansi)
                .with_target(true)
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .boxed(),
            LogFormat::Compact => layer.compact().with_ansi(ansi).boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Build the process subscriber without installing it.
///
/// Output layers are filtered by `RUST_LOG` when set, otherwise by
/// `config.level`. The capture layer has its own filter: `audited_call` spans
/// are always enabled for it and events are gated by `capture_level`, so the
/// process verbosity never hides the span a capture buffer is bound to.
pub fn subscriber(
    config: &LogConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogCapture), LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let mut outputs = vec![config.output_layer(io::stderr, true)];

    if let Some(file_path) = &config.file_path {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        outputs.push(config.output_layer(std::sync::Mutex::new(file), false));
    }

    let capture = LogCapture::new();
    let capture_level = LevelFilter::from(config.capture_level);
    let capture_filter = filter_fn(move |meta: &Metadata<'_>| {
        if meta.is_span() {
            meta.name() == spans::AUDITED_CALL
        } else {
            *meta.level() <= capture_level
        }
    });

    let subscriber = tracing_subscriber::registry()
        .with(outputs.with_filter(filter))
        .with(capture.layer().with_filter(capture_filter));

    Ok((subscriber, capture))
}

/// Initialize logging with the given configuration.
///
/// Installs [`subscriber`] as the global default and returns its capture handle.
pub fn init(config: LogConfig) -> Result<LogCapture, LogError> {
    let (subscriber, capture) = subscriber(&config)?;
    subscriber
        .try_init()
        .map_err(|e| LogError::InitError(e.to_string()))?;
    Ok(capture)
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    #[error("failed to open log file: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tracing::{debug, error, info, warn};

    fn captured_with(config: &LogConfig) -> String {
        let (subscriber, capture) = subscriber(config).unwrap();
        let _default = tracing::subscriber::set_default(subscriber);

        let span = spans::audited_call_span("settle", module_path!());
        let guard = capture.begin(&span);
        assert!(guard.is_attached());

        span.in_scope(|| {
            debug!("fine detail");
            info!("progress");
            warn!("about to fail");
            error!("settlement failed");
        });
        guard.finish()
    }

    #[test]
    fn test_capture_level_above_span_level_keeps_capturing() {
        let config = LogConfig {
            capture_level: LogLevel::Warn,
            ..Default::default()
        };
        let text = captured_with(&config);

        assert!(text.contains(" - WARN - about to fail\n"));
        assert!(text.contains(" - ERROR - settlement failed\n"));
        assert!(!text.contains("progress"));
        assert!(!text.contains("fine detail"));
    }

    #[test]
    fn test_capture_ignores_process_level() {
        let config = LogConfig {
            level: LogLevel::Error,
            capture_level: LogLevel::Debug,
            ..Default::default()
        };
        let text = captured_with(&config);

        assert_eq!(text.lines().count(), 4);
        assert!(text.contains(" - DEBUG - fine detail\n"));
        assert!(text.contains(" - INFO - progress\n"));
    }

    #[test]
    fn test_default_capture_level_is_info() {
        let text = captured_with(&LogConfig::default());

        assert!(text.contains("progress"));
        assert!(!text.contains("fine detail"));
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("calltrail.log");
        let config = LogConfig {
            level: LogLevel::Error,
            file_path: Some(path.clone()),
            ..Default::default()
        };

        let (subscriber, _capture) = subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            error!("ledger unavailable");
        });

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("ledger unavailable"));
    }

    #[test]
    fn test_log_level_parse() {
        assert!(matches!(LogLevel::parse("info"), Some(LogLevel::Info)));
        assert!(matches!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug)));
        assert!(matches!(LogLevel::parse("Warning"), Some(LogLevel::Warn)));
        assert!(matches!(LogLevel::parse("error"), Some(LogLevel::Error)));
        assert!(matches!(LogLevel::parse("trace"), Some(LogLevel::Trace)));
        assert!(LogLevel::parse("invalid").is_none());
    }

    #[test]
    fn test_log_level_roundtrips_through_directive() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(LogLevel::parse(level.as_str()), Some(level));
        }
    }

    #[test]
    fn test_log_level_from() {
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::INFO);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.capture_level, LogLevel::Info);
        assert!(config.file_path.is_none());
        assert!(!config.source_location);
        assert!(!config.span_events);
    }

    // All environment manipulation lives in one test so parallel tests never
    // observe each other's variables.
    #[test]
    fn test_config_from_env() {
        let saved: Vec<(&str, Option<String>)> = [
            "CALLTRAIL_LOG_LEVEL",
            "CALLTRAIL_LOG_FORMAT",
            "CALLTRAIL_LOG_FILE",
            "CALLTRAIL_LOG_SOURCE",
            "CALLTRAIL_LOG_SPANS",
            "RUST_LOG",
        ]
        .into_iter()
        .map(|var| (var, env::var(var).ok()))
        .collect();

        env::set_var("CALLTRAIL_LOG_LEVEL", "debug");
        env::set_var("CALLTRAIL_LOG_FORMAT", "json");
        env::set_var("CALLTRAIL_LOG_FILE", "/tmp/calltrail-test.log");
        env::set_var("CALLTRAIL_LOG_SOURCE", "true");
        env::set_var("CALLTRAIL_LOG_SPANS", "1");

        let config = LogConfig::from_env();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(
            config.file_path.unwrap(),
            PathBuf::from("/tmp/calltrail-test.log")
        );
        assert!(config.source_location);
        assert!(config.span_events);

        env::remove_var("CALLTRAIL_LOG_LEVEL");
        env::set_var("RUST_LOG", "warn");
        assert_eq!(LogConfig::from_env().level, LogLevel::Warn);

        for (var, value) in saved {
            match value {
                Some(v) => env::set_var(var, v),
                None => env::remove_var(var),
            }
        }
    }
}
