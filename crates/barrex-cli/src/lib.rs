//! Shared plumbing for the barrex binaries.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Set up console logging the same way across all three tools.
pub fn init_logging(debug: bool) {
    let log_level = if debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}
