//! Watch-driven harness around the reconciliation engine
//!
//! Watches PodScalers and the VerticalPodAutoscalers they own, runs one
//! engine pass per queued key, and persists the PodScaler's status
//! afterwards. The kube runtime provides the guarantees the engine
//! documents as preconditions: per-key serialization and retry
//! scheduling via the returned `Action`s.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use thiserror::Error;
use tracing::{debug, warn};

use controller_lib::{
    AutoscalerConfig, ControllerMetrics, HealthRegistry, KubeVpaApi, PodScaler, ReconcileError,
    Reconciler, VerticalPodAutoscaler,
};

use crate::config::ControllerConfig;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("failed to patch PodScaler status {name:?}: {source}")]
    StatusPatch {
        name: String,
        #[source]
        source: kube::Error,
    },
}

/// Shared context handed to every reconciliation invocation
pub struct Ctx {
    pub client: Client,
    pub reconciler: Reconciler<KubeVpaApi>,
    pub autoscaler_config: AutoscalerConfig,
    pub health: HealthRegistry,
    pub metrics: ControllerMetrics,
    pub requeue_interval: Duration,
    pub error_requeue: Duration,
    /// Keys of scalers whose last pass produced a non-empty recommendation,
    /// backing the recommendation gauge.
    recommended: Mutex<HashSet<String>>,
}

impl Ctx {
    pub fn new(
        client: Client,
        reconciler: Reconciler<KubeVpaApi>,
        autoscaler_config: AutoscalerConfig,
        health: HealthRegistry,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            client,
            reconciler,
            autoscaler_config,
            health,
            metrics: ControllerMetrics::new(),
            requeue_interval: Duration::from_secs(config.requeue_interval_secs),
            error_requeue: Duration::from_secs(config.error_requeue_secs),
            recommended: Mutex::new(HashSet::new()),
        }
    }

    fn track_recommendations(&self, scaler: &PodScaler) {
        let key = format!(
            "{}/{}",
            scaler.namespace().unwrap_or_default(),
            scaler.name_any()
        );
        let has_recommendations = scaler
            .status
            .as_ref()
            .is_some_and(|s| !s.resource_recommendations.is_empty());

        let mut recommended = self.recommended.lock().unwrap();
        if has_recommendations {
            recommended.insert(key);
        } else {
            recommended.remove(&key);
        }
        self.metrics
            .set_scalers_with_recommendations(recommended.len() as i64);
    }
}

/// One queued invocation: engine pass, then status persistence.
async fn reconcile(scaler: Arc<PodScaler>, ctx: Arc<Ctx>) -> Result<Action, Error> {
    let mut scaler = (*scaler).clone();
    let outcome = ctx
        .reconciler
        .reconcile(&mut scaler, &ctx.autoscaler_config)
        .await;

    // Status mutations made during the pass (recommendations, failure
    // conditions) are persisted even when the pass itself errored.
    let persisted = persist_status(&ctx, &scaler).await;

    // The health registry sees every pass; a failed status patch counts
    // as a failed pass.
    ctx.health
        .record_reconcile_outcome(pass_succeeded(&outcome, &persisted))
        .await;
    persisted?;
    outcome?;

    ctx.track_recommendations(&scaler);
    Ok(Action::requeue(ctx.requeue_interval))
}

fn pass_succeeded(outcome: &Result<(), ReconcileError>, persisted: &Result<(), Error>) -> bool {
    outcome.is_ok() && persisted.is_ok()
}

async fn persist_status(ctx: &Ctx, scaler: &PodScaler) -> Result<(), Error> {
    let Some(status) = &scaler.status else {
        return Ok(());
    };
    let namespace = scaler.namespace().unwrap_or_default();
    let api: Api<PodScaler> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        &scaler.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await
    .map_err(|source| Error::StatusPatch {
        name: scaler.name_any(),
        source,
    })?;
    Ok(())
}

fn error_policy(scaler: Arc<PodScaler>, error: &Error, ctx: Arc<Ctx>) -> Action {
    warn!(
        scaler = %scaler.name_any(),
        error = %error,
        "reconcile failed, requeueing"
    );
    Action::requeue(ctx.error_requeue)
}

/// Run the controller until shutdown is signaled.
pub async fn run(client: Client, config: &ControllerConfig, ctx: Arc<Ctx>) -> anyhow::Result<()> {
    let (scalers, vpas): (Api<PodScaler>, Api<VerticalPodAutoscaler>) = match &config.namespace {
        Some(ns) => (
            Api::namespaced(client.clone(), ns),
            Api::namespaced(client, ns),
        ),
        None => (Api::all(client.clone()), Api::all(client)),
    };

    Controller::new(scalers, watcher::Config::default())
        .owns(vpas, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(object = %object.name, "reconciled"),
                Err(error) => warn!(error = %error, "reconciliation stream error"),
            }
        })
        .await;

    Ok(())
}
