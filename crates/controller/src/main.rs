//! VPA recommendation controller
//!
//! Keeps one VerticalPodAutoscaler per PodScaler in sync and mirrors the
//! recommender's per-container output back onto the PodScaler status.

use anyhow::{Context, Result};
use controller_lib::{
    health::components, ControllerMetrics, HealthRegistry, KubeVpaApi, Reconciler,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod controller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting vpa-controller");

    // Load configuration
    let config = config::ControllerConfig::load()?;
    let autoscaler_config = config.load_autoscaler_config()?;
    info!(
        policies = autoscaler_config.container_policies.len(),
        "Autoscaler tunables loaded"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::RECONCILER).await;
    health_registry.register(components::KUBE_CLIENT).await;

    // Initialize metrics
    let _metrics = ControllerMetrics::new();

    // Build the Kubernetes client and the reconciliation engine
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let reconciler = Reconciler::new(KubeVpaApi::new(client.clone()));

    // Start health and metrics server
    let state = Arc::new(api::AppState::new(health_registry.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, state));

    let ctx = Arc::new(controller::Ctx::new(
        client.clone(),
        reconciler,
        autoscaler_config,
        health_registry.clone(),
        &config,
    ));

    // Mark the controller ready once the watch loop is about to start
    health_registry.set_ready(true).await;

    tokio::select! {
        result = controller::run(client, &config, ctx) => result?,
        result = api_handle => result.context("API server task failed")??,
    }

    info!("Shutting down");
    Ok(())
}
