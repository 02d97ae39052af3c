//! Structured logging setup, in the teacher's style: a `tracing_subscriber`
//! registry with an `ErrorLayer` (so `color_eyre` reports can recover
//! spantrace context) and a pretty `fmt` layer, filtered by the `MAEK_LOG`
//! environment variable.

use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber. Safe to call once at process
/// start; a second call panics, which is the behavior we want in tests that
/// forget to guard against double-init.
pub fn init() {
    let filter = EnvFilter::builder().with_env_var("MAEK_LOG").from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(fmt::layer().with_target(false).with_level(true))
        .init();
}
