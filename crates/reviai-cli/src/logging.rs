//! Console and log-file output for the `reviai` binary.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE: &str = "app.log";

/// Crates whose events are shown; dependencies only surface warnings.
const CRATES: [&str; 5] = [
    "reviai",
    "reviai_core",
    "reviai_excel",
    "reviai_review",
    "reviai_report",
];

/// `[2024-01-31 12:00:00] [INFO] message`
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] [{}] ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn directives(level: &str) -> String {
    let mut out = String::from("warn");
    for krate in CRATES {
        out.push_str(&format!(",{krate}={level}"));
    }
    out
}

/// Install the global subscriber: INFO (DEBUG with `verbose`) on stderr,
/// DEBUG appended to `{log_dir}/app.log`. `RUST_LOG` overrides the console
/// level.
pub fn init(log_dir: &Path, verbose: bool) {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(if verbose { "debug" } else { "info" })));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(LineFormat)
        .with_filter(console_filter);

    let (file, file_error) = match open_log_file(log_dir) {
        Ok(file) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .event_format(LineFormat)
                .with_filter(EnvFilter::new(directives("debug")));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry().with(console).with(file).init();

    if let Some(e) = file_error {
        tracing::warn!(
            "Logging to console only, cannot open {}: {}",
            log_dir.join(LOG_FILE).display(),
            e
        );
    }
}

fn open_log_file(log_dir: &Path) -> std::io::Result<fs::File> {
    fs::create_dir_all(log_dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        assert_eq!(
            directives("info"),
            "warn,reviai=info,reviai_core=info,reviai_excel=info,reviai_review=info,reviai_report=info"
        );
    }

    #[test]
    fn test_log_file_created() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        open_log_file(&logs).unwrap();
        assert!(logs.join(LOG_FILE).exists());
    }
}
