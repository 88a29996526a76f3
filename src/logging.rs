//! Logging for the NIF library.
//!
//! Records are written to stderr, which the VM forwards to the console of the
//! node. The filter comes from `N_LOG`, then `RUST_LOG`, then a `warn` default
//! for this crate's own target.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Once, RwLock};

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::{NifError, Result};

pub const LOG_ENV: &str = "N_LOG";
const FALLBACK_LOG_ENV: &str = "RUST_LOG";
const CRATE_TARGET: &str = "n";

const LOGGER_STATE_UNINIT: u8 = 0;
const LOGGER_STATE_READY: u8 = 1;
const LOGGER_STATE_FAILED: u8 = 2;

static LOGGER_STATE: AtomicU8 = AtomicU8::new(LOGGER_STATE_UNINIT);
static LOGGER_INIT: Once = Once::new();
static NIF_LOGGER: Lazy<NifLogger> = Lazy::new(NifLogger::new);

#[derive(Clone, Debug, PartialEq)]
struct TargetFilter {
    target: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LogFilter {
    default: LevelFilter,
    directives: Vec<TargetFilter>,
}

impl LogFilter {
    fn default_for_level(level: LevelFilter) -> Self {
        Self {
            default: LevelFilter::Off,
            directives: vec![TargetFilter {
                target: CRATE_TARGET.to_string(),
                level,
            }],
        }
    }

    pub(crate) fn parse(spec: &str) -> std::result::Result<Self, String> {
        let mut default = LevelFilter::Off;
        let mut directives = Vec::new();

        for (index, raw) in spec.split(',').enumerate() {
            let directive = raw.trim();
            if directive.is_empty() {
                continue;
            }
            let mut parts = directive.splitn(2, '=');
            let left = parts.next().unwrap_or_default().trim();
            let right = parts.next().map(str::trim);

            if left.is_empty() {
                return Err(format!("empty log directive at position {index}"));
            }

            if let Some(level_str) = right {
                if level_str.is_empty() {
                    return Err(format!("missing log level for target `{left}`"));
                }
                let level =
                    parse_level(level_str).ok_or_else(|| format!("invalid level `{level_str}`"))?;
                directives.push(TargetFilter {
                    target: left.to_string(),
                    level,
                });
            } else if let Some(level) = parse_level(left) {
                default = level;
            } else {
                directives.push(TargetFilter {
                    target: left.to_string(),
                    level: LevelFilter::Trace,
                });
            }
        }

        Ok(Self { default, directives })
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        let mut best_level = self.default;
        let mut best_len = 0usize;

        for directive in &self.directives {
            if matches_target(target, &directive.target) && directive.target.len() >= best_len {
                best_len = directive.target.len();
                best_level = directive.level;
            }
        }
        best_level
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level().to_level_filter() <= self.level_for(metadata.target())
    }

    fn max_level(&self) -> LevelFilter {
        let mut max_level = self.default;
        for directive in &self.directives {
            if directive.level > max_level {
                max_level = directive.level;
            }
        }
        max_level
    }
}

struct NifLogger {
    filter: RwLock<LogFilter>,
}

impl NifLogger {
    fn new() -> Self {
        Self {
            filter: RwLock::new(LogFilter::default_for_level(LevelFilter::Warn)),
        }
    }

    fn update(&self, filter: LogFilter) {
        let mut guard = self.filter.write().unwrap_or_else(|err| err.into_inner());
        *guard = filter;
    }

    fn with_filter<T>(&self, f: impl FnOnce(&LogFilter) -> T) -> T {
        let guard = self.filter.read().unwrap_or_else(|err| err.into_inner());
        f(&guard)
    }
}

impl Log for NifLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.with_filter(|filter| filter.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{} {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// `target` is `prefix` itself or one of its `::` submodules.
fn matches_target(target: &str, prefix: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Picks the filter from the first of `N_LOG`, `RUST_LOG` that is set.
fn resolve_filter(lookup: impl Fn(&str) -> Option<String>) -> Result<LogFilter> {
    for key in [LOG_ENV, FALLBACK_LOG_ENV] {
        if let Some(filter) = lookup(key) {
            return LogFilter::parse(&filter)
                .map_err(|reason| NifError::InvalidLogFilter { filter, reason });
        }
    }
    Ok(LogFilter::default_for_level(LevelFilter::Warn))
}

fn ensure_logger() -> Result<()> {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&*NIF_LOGGER).is_ok() {
            LOGGER_STATE.store(LOGGER_STATE_READY, Ordering::SeqCst);
        } else {
            LOGGER_STATE.store(LOGGER_STATE_FAILED, Ordering::SeqCst);
        }
    });

    match LOGGER_STATE.load(Ordering::SeqCst) {
        LOGGER_STATE_READY => Ok(()),
        _ => Err(NifError::LoggerAlreadyInstalled),
    }
}

/// Installs the logger and applies the filter from the environment.
///
/// Safe to call on every load; later calls only refresh the filter. An invalid
/// filter falls back to the default and is reported once the logger is live.
pub fn init() -> Result<()> {
    ensure_logger()?;

    let (filter, rejected) = match resolve_filter(|key| std::env::var(key).ok()) {
        Ok(filter) => (filter, None),
        Err(err) => (LogFilter::default_for_level(LevelFilter::Warn), Some(err)),
    };

    log::set_max_level(filter.max_level());
    NIF_LOGGER.update(filter);

    if let Some(err) = rejected {
        log::warn!("{err}; using default filter");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn metadata(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn default_filter_only_enables_crate_warnings() {
        let filter = LogFilter::default_for_level(LevelFilter::Warn);
        assert!(filter.enabled(&metadata(Level::Warn, "n::init")));
        assert!(!filter.enabled(&metadata(Level::Info, "n::init")));
        assert!(!filter.enabled(&metadata(Level::Error, "other")));
    }

    #[test]
    fn longest_prefix_wins() {
        let filter = LogFilter::parse("info,n=warn,n::init=trace").unwrap();
        assert!(filter.enabled(&metadata(Level::Trace, "n::init")));
        assert!(!filter.enabled(&metadata(Level::Info, "n::hello")));
        assert!(filter.enabled(&metadata(Level::Info, "somewhere")));
        assert_eq!(filter.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn crate_target_does_not_leak_to_similar_names() {
        let filter = LogFilter::default_for_level(LevelFilter::Warn);
        assert!(filter.enabled(&metadata(Level::Warn, "n")));
        assert!(!filter.enabled(&metadata(Level::Warn, "notify::watcher")));
        assert!(!filter.enabled(&metadata(Level::Error, "nix")));

        let filter = LogFilter::parse("n::init=debug").unwrap();
        assert_eq!(filter.level_for("n::init::load"), LevelFilter::Debug);
        assert_eq!(filter.level_for("n::initial"), LevelFilter::Off);
    }

    #[test]
    fn max_level_covers_default_and_directives() {
        assert_eq!(LogFilter::parse("debug,n=warn").unwrap().max_level(), LevelFilter::Debug);
        assert_eq!(LogFilter::parse("off").unwrap().max_level(), LevelFilter::Off);
        assert_eq!(
            LogFilter::default_for_level(LevelFilter::Warn).max_level(),
            LevelFilter::Warn
        );
    }

    #[test]
    fn bare_target_enables_trace() {
        let filter = LogFilter::parse("n").unwrap();
        assert_eq!(filter.level_for("n::registry"), LevelFilter::Trace);
        assert_eq!(filter.level_for("elsewhere"), LevelFilter::Off);
    }

    #[test]
    fn rejects_malformed_directives() {
        assert!(LogFilter::parse("=debug").is_err());
        assert!(LogFilter::parse("n=").is_err());
        assert!(LogFilter::parse("n=loud").is_err());
        assert!(LogFilter::parse(" , ").is_ok());
    }

    #[test]
    fn n_log_takes_precedence_over_rust_log() {
        let filter = resolve_filter(|key| match key {
            "N_LOG" => Some("n=debug".to_string()),
            "RUST_LOG" => Some("off".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(filter.level_for("n"), LevelFilter::Debug);
    }

    #[test]
    fn falls_back_to_rust_log_then_default() {
        let filter =
            resolve_filter(|key| (key == "RUST_LOG").then(|| "error".to_string())).unwrap();
        assert_eq!(filter.level_for("n"), LevelFilter::Error);

        let filter = resolve_filter(|_| None).unwrap();
        assert_eq!(filter, LogFilter::default_for_level(LevelFilter::Warn));
    }

    #[test]
    fn invalid_env_filter_is_reported() {
        let err =
            resolve_filter(|key| (key == "N_LOG").then(|| "n=shout".to_string())).unwrap_err();
        assert!(matches!(
            err,
            NifError::InvalidLogFilter { ref filter, .. } if filter == "n=shout"
        ));
    }
}
