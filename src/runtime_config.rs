//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for restlink's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `RESTLINK_STACK_SIZE`
//!
//! Stack size for the per-route worker coroutines. Accepts values in:
//! - Decimal: `16384` (16 KB)
//! - Hexadecimal: `0x4000` (16 KB)
//!
//! Default: `0x4000` (16 KB). Larger stacks support deeper handler call
//! chains; smaller stacks reduce memory when many routes are registered.
//!
//! ### `RESTLINK_MAX_DEPTH`
//!
//! Maximum recursion depth for the view-expansion pipeline. Expansion
//! beyond this depth aborts the request with an error. Default: `8`.
//!
//! ## Usage
//!
//! ```rust
//! use restlink::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;
const DEFAULT_MAX_DEPTH: usize = 8;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`] and pass it to
/// [`Dispatcher::new`](crate::dispatcher::Dispatcher::new).
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for worker coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Maximum link-expansion recursion depth (default: 8)
    pub max_expand_depth: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("RESTLINK_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
                } else {
                    val.parse().unwrap_or(DEFAULT_STACK_SIZE)
                }
            }
            Err(_) => DEFAULT_STACK_SIZE,
        };
        let max_expand_depth = env::var("RESTLINK_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_DEPTH);
        RuntimeConfig {
            stack_size,
            max_expand_depth,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
            max_expand_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
