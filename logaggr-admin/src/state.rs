use std::sync::Arc;

use logaggr_bus::BusAdmin;
use logaggr_metric::Registry;
use logaggr_time::TimeProviderRef;

/// Shared state for every admin route (§6). Cloned per request — cheap,
/// since everything inside is already `Arc`-backed.
#[derive(Clone)]
pub struct AdminState {
    pub metrics: Registry,
    pub bus_admin: Arc<dyn BusAdmin>,
    pub clock: TimeProviderRef,
}
