//! Observability infrastructure for the controller
//!
//! Provides Prometheus metrics for the reconciliation loop: pass latency,
//! create/update activity on the derived resources, and error counts.

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;

/// Default histogram buckets for reconciliation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ControllerMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ControllerMetricsInner {
    reconcile_latency_seconds: Histogram,
    vpas_created: IntCounter,
    vpas_updated: IntCounter,
    reconcile_errors: IntCounter,
    scalers_with_recommendations: IntGauge,
}

impl ControllerMetricsInner {
    fn new() -> Self {
        Self {
            reconcile_latency_seconds: register_histogram!(
                "vpa_controller_reconcile_latency_seconds",
                "Time spent in one reconciliation pass",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register reconcile_latency_seconds"),

            vpas_created: register_int_counter!(
                "vpa_controller_vpas_created_total",
                "Total number of VerticalPodAutoscalers created"
            )
            .expect("Failed to register vpas_created_total"),

            vpas_updated: register_int_counter!(
                "vpa_controller_vpas_updated_total",
                "Total number of VerticalPodAutoscaler spec updates issued"
            )
            .expect("Failed to register vpas_updated_total"),

            reconcile_errors: register_int_counter!(
                "vpa_controller_reconcile_errors_total",
                "Total number of reconciliation passes that returned an error"
            )
            .expect("Failed to register reconcile_errors_total"),

            scalers_with_recommendations: register_int_gauge!(
                "vpa_controller_scalers_with_recommendations",
                "Number of PodScalers whose last pass extracted a non-empty recommendation"
            )
            .expect("Failed to register scalers_with_recommendations"),
        }
    }
}

/// Controller metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ControllerMetrics {
    _private: (),
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ControllerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the latency of one reconciliation pass
    pub fn observe_reconcile_latency(&self, duration_secs: f64) {
        self.inner().reconcile_latency_seconds.observe(duration_secs);
    }

    /// Increment the created-VPAs counter
    pub fn inc_vpas_created(&self) {
        self.inner().vpas_created.inc();
    }

    /// Increment the updated-VPAs counter
    pub fn inc_vpas_updated(&self) {
        self.inner().vpas_updated.inc();
    }

    /// Increment the reconcile-errors counter
    pub fn inc_reconcile_errors(&self) {
        self.inner().reconcile_errors.inc();
    }

    /// Update the recommendation-carrying-scalers gauge
    pub fn set_scalers_with_recommendations(&self, count: i64) {
        self.inner().scalers_with_recommendations.set(count);
    }
}
