use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing with optional file output.
///
/// The runtime lives inside a host application's process, so logging is
/// off unless `EMBERCORE_LOG` names a file path. `RUST_LOG` overrides
/// `default_filter` when set.
///
/// Log files get unique names so several processes embedding the runtime
/// do not clobber each other: `{path}.{timestamp}.{pid}`.
///
/// Runs at most once per process; later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| install(default_filter));
}

fn install(default_filter: &str) {
    let Some(log_path) = std::env::var("EMBERCORE_LOG").ok() else {
        return;
    };

    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let unique_path = format!("{}.{}.{}", log_path, timestamp, pid);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {}", unique_path);
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    // A host may already own the global subscriber; keep theirs.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
}

/// Initialize tracing to stderr for the command-line tool.
pub fn init_stderr_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .try_init();
}
