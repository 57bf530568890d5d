use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming a log file path.
pub const ENV_LOG_FILE: &str = "MONGOSEARCH_LOG";

/// Initialize tracing.
///
/// stdout carries the protocol, so logs go to stderr. When `MONGOSEARCH_LOG`
/// is set they go to a file instead, named `{path}.{timestamp}.{pid}` so
/// that concurrent instances never share one. If that file cannot be
/// created, logging stays on stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = std::env::var(ENV_LOG_FILE).ok();
    let (writer, _) = log_writer(log_path.as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .init();
}

/// Pick the log destination; the path is `None` when logging to stderr.
fn log_writer(log_path: Option<&str>) -> (BoxMakeWriter, Option<String>) {
    let Some(base) = log_path.filter(|p| !p.is_empty()) else {
        return (BoxMakeWriter::new(std::io::stderr), None);
    };

    let unique_path = unique_log_path(base);
    match std::fs::File::create(&unique_path) {
        Ok(file) => (BoxMakeWriter::new(Arc::new(file)), Some(unique_path)),
        Err(e) => {
            eprintln!(
                "Warning: Failed to create log file {}: {}; logging to stderr",
                unique_path, e
            );
            (BoxMakeWriter::new(std::io::stderr), None)
        }
    }
}

fn unique_log_path(base: &str) -> String {
    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}.{}.{}", base, timestamp, pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_log_path_appends_timestamp_and_pid() {
        let path = unique_log_path("/tmp/mongosearch.log");
        let suffix = path.strip_prefix("/tmp/mongosearch.log.").unwrap();
        let (timestamp, pid) = suffix.split_once('.').unwrap();
        assert!(timestamp.parse::<u64>().unwrap() > 0);
        assert_eq!(pid.parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn unset_or_empty_path_logs_to_stderr() {
        assert_eq!(log_writer(None).1, None);
        assert_eq!(log_writer(Some("")).1, None);
    }

    #[test]
    fn log_file_is_created_next_to_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("server.log");

        let (_, path) = log_writer(Some(base.to_str().unwrap()));
        let path = path.expect("file destination");
        assert!(path.starts_with(base.to_str().unwrap()));
        assert!(std::path::Path::new(&path).exists());
    }

    #[test]
    fn uncreatable_log_file_falls_back_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("missing-dir").join("server.log");

        let (_, path) = log_writer(Some(base.to_str().unwrap()));
        assert_eq!(path, None);
    }
}
