//! Prometheus counters for the authentication chain.

use prometheus::IntCounterVec;

lazy_static::lazy_static! {
    /// Rejections produced by the chain, labeled by reason code.
    pub static ref AUTH_REJECTIONS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "auth_rejections_total",
        "Authentication chain rejections",
        &["reason"]
    ).unwrap();

    /// Shared-store failures observed by the chain, labeled by store and the
    /// policy outcome applied (fail_open, fail_closed, refresh).
    pub static ref AUTH_STORE_FAILURES_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "auth_store_failures_total",
        "Shared store failures during authentication",
        &["store", "outcome"]
    ).unwrap();
}
