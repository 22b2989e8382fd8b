//! Tracing subscriber setup for binaries and tests embedding the library

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `quarry=info`. Later calls are no-ops,
/// so embedding applications and tests may both call it.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarry=info"));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
