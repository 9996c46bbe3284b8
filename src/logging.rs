//! Log output for binaries and tests embedding Osprey
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's choice. [`init`] is a convenience that reads the filter from
//! `OSPREY_LOG` and falls back to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const ENV_LOG: &str = "OSPREY_LOG";

/// Install a formatted subscriber on stderr
///
/// Returns `false` if a global subscriber was already installed, so calling
/// this more than once is harmless.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
