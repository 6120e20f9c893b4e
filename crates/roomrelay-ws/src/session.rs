use std::sync::atomic::{AtomicI64, Ordering};

/// Count of currently-connected, authenticated dashboards, fed into every
/// `live_stats` push. Process-local: with multiple `roomrelay-server`
/// instances behind a load balancer, each only reports its own share.
static CONNECTED_DASHBOARDS: AtomicI64 = AtomicI64::new(0);

pub fn connected_dashboards() -> i64 {
    CONNECTED_DASHBOARDS.load(Ordering::Relaxed)
}

/// Marks one dashboard connection as live for the lifetime of this guard;
/// decrements on drop so a panicked or early-returned handler task can't
/// leak the count upward forever.
pub struct DashboardGuard;

impl DashboardGuard {
    pub fn acquire() -> Self {
        CONNECTED_DASHBOARDS.fetch_add(1, Ordering::Relaxed);
        Self
    }
}

impl Drop for DashboardGuard {
    fn drop(&mut self) {
        CONNECTED_DASHBOARDS.fetch_sub(1, Ordering::Relaxed);
    }
}
