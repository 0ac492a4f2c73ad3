//! Observability facade (§2a): one crate the rest of the workspace
//! depends on for the logging facade, so the version of `tracing`
//! stays pinned in one place.

pub use tracing::{debug, error, info, instrument, trace, warn};

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber (§2a): `RUST_LOG`-driven
/// filtering via [`EnvFilter`], with an optional switch to JSON output
/// for log shipping.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
