//! Minimal logger.
//!
//! The logger prints `[elapsed LEVEL stage] message` to stderr, where `stage`
//! is the pipeline crate that emitted the record (`dataset`, `records`, ...).
//! Records from third-party crates (HTTP client, TLS, codecs) are only shown
//! at `warn` and above so that `debug` runs stay readable. Use
//! `init_with_level` to install it once at startup.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const PIPELINE_PREFIX: &str = "cloudless";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

/// Short stage name for a log target such as `cloudless_dataset::prepare`.
fn stage_of(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    match krate.strip_prefix(PIPELINE_PREFIX) {
        Some("") => "cli",
        Some(rest) => rest.trim_start_matches(['_', '-']),
        None => krate,
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.target().starts_with(PIPELINE_PREFIX) {
            metadata.level() <= self.level
        } else {
            metadata.level() <= Level::Warn && metadata.level() <= self.level
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {:<8}] {}",
            elapsed,
            record.level(),
            stage_of(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stage logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` subscriber instead of the plain logger.
///
/// `RUST_LOG` overrides the default filter, which keeps pipeline crates at
/// `info` and everything else at `warn`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cloudless=info,cloudless_acquire=info,cloudless_raster=info,cloudless_dataset=info,cloudless_records=info,cloudless_train=info,cloudless_eval=info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::stage_of;

    #[test]
    fn stage_names_strip_the_pipeline_prefix() {
        assert_eq!(stage_of("cloudless_dataset::prepare"), "dataset");
        assert_eq!(stage_of("cloudless_records"), "records");
        assert_eq!(stage_of("cloudless"), "cli");
        assert_eq!(stage_of("ureq::unit"), "ureq");
    }
}
