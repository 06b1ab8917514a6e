//! # Logging Module
//!
//! Tracing bootstrap for embedders.
//!
//! The crate itself only emits `tracing` events; installing a subscriber
//! is the embedding process's call. `init_tracing` wires up the common
//! case: an `EnvFilter` driven by `RESTLINK_LOG` (falling back to `info`)
//! over either the compact or the JSON formatter.
//!
//! ```rust,no_run
//! restlink::logging::init_tracing(false);
//! ```

use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "RESTLINK_LOG";

/// Install a global tracing subscriber.
///
/// `json` selects newline-delimited JSON output instead of the compact
/// human format. Filtering comes from `RESTLINK_LOG` (same syntax as
/// `RUST_LOG`), defaulting to `info`. If a global subscriber is already
/// installed this is a no-op — the embedder's choice wins.
pub fn init_tracing(json: bool) {
    if json {
        let filter =
            EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let filter =
            EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init();
    }
}
