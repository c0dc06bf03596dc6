//! Reconciliation engine for PodScaler resources
//!
//! One pass runs the build → fetch → classify → correct → extract pipeline
//! for a single PodScaler:
//!
//! 1. Build the desired VerticalPodAutoscaler from the scaler and the
//!    injected autoscaler config.
//! 2. Fetch the observed VPA and classify it against desired state.
//! 3. Create it if missing, reject it if owned by someone else, update it
//!    if its spec drifted.
//! 4. Extract recommendations from the observed status onto the scaler's
//!    in-memory status. Persisting that status is the harness's job.
//!
//! Precondition: passes for the same PodScaler key must never run
//! concurrently. The engine does a non-atomic read-modify-write on the VPA
//! with no locking of its own; the watch harness provides per-key
//! serialization, and cross-client races are left to the server's
//! resourceVersion conflict detection. Conflicts and transient errors are
//! surfaced, not retried in-process; retry scheduling belongs to the
//! harness.


use std::time::{Duration, Instant};

use kube::ResourceExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::builder::desired_vpa;
use crate::client::VpaApi;
use crate::config::AutoscalerConfig;
use crate::extractor::recommended_resources;
use crate::observability::ControllerMetrics;
use crate::resources::{PodScaler, VerticalPodAutoscaler};

/// Wall-clock budget for one reconciliation pass.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

const DERIVED_KIND: &str = "VerticalPodAutoscaler";

/// Errors from one reconciliation pass.
///
/// Every failure is surfaced to the caller; nothing is swallowed. All
/// variants are retryable from the engine's point of view, though
/// [`ReconcileError::NotOwned`] will keep failing until ownership is fixed
/// externally.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to get VPA {name:?}: {source}")]
    Get {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to create VPA {name:?}: {source}")]
    Create {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to update VPA {name:?}: {source}")]
    Update {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("PodScaler {scaler:?} does not own VPA {name:?}")]
    NotOwned { scaler: String, name: String },

    #[error("reconciliation exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),
}

/// Classification of the observed VPA against desired state.
///
/// Modeled as an explicit enum so the four-way branch is exhaustive.
#[derive(Debug)]
enum Observation {
    /// No VPA exists under the computed name.
    Missing,
    /// A VPA exists but is not controlled by this PodScaler.
    NotOwned,
    /// Owned, but its spec differs from desired.
    Drifted(Box<VerticalPodAutoscaler>),
    /// Owned and already equal to desired.
    Converged(Box<VerticalPodAutoscaler>),
}

/// The reconciliation engine. Generic over the API seam so tests can run
/// against an in-memory backend.
pub struct Reconciler<A> {
    api: A,
    deadline: Duration,
    metrics: ControllerMetrics,
}

impl<A: VpaApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self::with_deadline(api, DEFAULT_DEADLINE)
    }

    /// Create an engine with a non-default deadline.
    pub fn with_deadline(api: A, deadline: Duration) -> Self {
        Self {
            api,
            deadline,
            metrics: ControllerMetrics::new(),
        }
    }

    /// Run one reconciliation pass for `scaler`.
    ///
    /// Mutates the scaler's in-memory status: recommendations are replaced
    /// on success, failure conditions are recorded on create/ownership
    /// errors. On deadline expiry any in-flight API call is abandoned and
    /// [`ReconcileError::DeadlineExceeded`] is returned for re-enqueueing.
    pub async fn reconcile(
        &self,
        scaler: &mut PodScaler,
        config: &AutoscalerConfig,
    ) -> Result<(), ReconcileError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.deadline, self.run_pass(scaler, config)).await
        {
            Ok(result) => result,
            Err(_) => Err(ReconcileError::DeadlineExceeded(self.deadline)),
        };

        self.metrics
            .observe_reconcile_latency(start.elapsed().as_secs_f64());
        if result.is_err() {
            self.metrics.inc_reconcile_errors();
        }
        result
    }

    async fn run_pass(
        &self,
        scaler: &mut PodScaler,
        config: &AutoscalerConfig,
    ) -> Result<(), ReconcileError> {
        let desired = desired_vpa(scaler, config);
        let name = desired.name_any();
        let namespace = scaler.namespace().unwrap_or_default();
        debug!(scaler = %scaler.name_any(), %namespace, "reconciling VPA");

        let observed = self
            .api
            .get(&namespace, &name)
            .await
            .map_err(|source| ReconcileError::Get {
                name: name.clone(),
                source,
            })?;

        let vpa = match classify(scaler, &desired, observed) {
            Observation::Missing => {
                info!(%name, %namespace, "creating VPA");
                match self.api.create(&namespace, &desired).await {
                    Ok(created) => {
                        self.metrics.inc_vpas_created();
                        created
                    }
                    Err(source) => {
                        scaler.mark_resource_failed_creation(DERIVED_KIND, &name);
                        return Err(ReconcileError::Create { name, source });
                    }
                }
            }
            Observation::NotOwned => {
                scaler.mark_resource_not_owned(DERIVED_KIND, &name);
                return Err(ReconcileError::NotOwned {
                    scaler: scaler.name_any(),
                    name,
                });
            }
            Observation::Drifted(observed) => {
                info!(%name, %namespace, "updating VPA");
                let mut corrected = desired;
                // Carry the resourceVersion read above so the server rejects
                // the write if someone else got there first.
                corrected.metadata.resource_version = observed.metadata.resource_version.clone();
                self.api
                    .update(&namespace, &corrected)
                    .await
                    .map_err(|source| ReconcileError::Update {
                        name: name.clone(),
                        source,
                    })?;
                self.metrics.inc_vpas_updated();
                // Recommendations are read from the observed status; the
                // update only corrected spec drift.
                *observed
            }
            Observation::Converged(observed) => *observed,
        };

        scaler.set_resource_recommendations(recommended_resources(&vpa));
        Ok(())
    }
}

fn classify(
    scaler: &PodScaler,
    desired: &VerticalPodAutoscaler,
    observed: Option<VerticalPodAutoscaler>,
) -> Observation {
    match observed {
        None => Observation::Missing,
        Some(vpa) if !is_controlled_by(&vpa, scaler) => Observation::NotOwned,
        Some(vpa) if vpa.spec != desired.spec => Observation::Drifted(Box::new(vpa)),
        Some(vpa) => Observation::Converged(Box::new(vpa)),
    }
}

/// True when `vpa` carries a controller owner reference resolving to
/// `scaler`. UID comparison, same as the apimachinery IsControlledBy check.
fn is_controlled_by(vpa: &VerticalPodAutoscaler, scaler: &PodScaler) -> bool {
    let Some(scaler_uid) = scaler.uid() else {
        return false;
    };
    vpa.owner_references()
        .iter()
        .any(|owner| owner.controller.unwrap_or(false) && owner.uid == scaler_uid)
}
