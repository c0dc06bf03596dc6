//! Health check infrastructure for the controller
//!
//! Tracks component health for Kubernetes liveness and readiness probes.
//! The reconciler component degrades after repeated consecutive failures
//! rather than on the first transient error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive reconcile failures before the reconciler reports degraded.
const DEGRADED_AFTER_FAILURES: u32 = 3;

/// Consecutive reconcile failures before the reconciler reports unhealthy.
const UNHEALTHY_AFTER_FAILURES: u32 = 10;

/// Well-known component names
pub mod components {
    pub const RECONCILER: &str = "reconciler";
    pub const KUBE_CLIENT: &str = "kube_client";
}

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is experiencing issues but still operational
    Degraded,
    /// Component has failed
    Unhealthy,
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Unhealthy,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
}

#[derive(Default)]
struct RegistryState {
    components: HashMap<String, ComponentHealth>,
    consecutive_reconcile_failures: u32,
    ready: bool,
}

/// Shared registry of component health
#[derive(Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, name: &str) {
        let mut state = self.state.write().await;
        state
            .components
            .insert(name.to_string(), ComponentHealth::healthy());
    }

    /// Set a component's health directly
    pub async fn set_status(&self, name: &str, health: ComponentHealth) {
        let mut state = self.state.write().await;
        state.components.insert(name.to_string(), health);
    }

    /// Record the outcome of one reconciliation pass, updating the
    /// reconciler component's health from the consecutive-failure count.
    pub async fn record_reconcile_outcome(&self, success: bool) {
        let mut state = self.state.write().await;
        if success {
            state.consecutive_reconcile_failures = 0;
        } else {
            state.consecutive_reconcile_failures =
                state.consecutive_reconcile_failures.saturating_add(1);
        }

        let failures = state.consecutive_reconcile_failures;
        let health = if failures >= UNHEALTHY_AFTER_FAILURES {
            ComponentHealth::unhealthy(format!("{failures} consecutive reconcile failures"))
        } else if failures >= DEGRADED_AFTER_FAILURES {
            ComponentHealth::degraded(format!("{failures} consecutive reconcile failures"))
        } else {
            ComponentHealth::healthy()
        };
        state
            .components
            .insert(components::RECONCILER.to_string(), health);
    }

    /// Mark the process ready (or not) to receive traffic
    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    /// Snapshot overall health
    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        let mut status = ComponentStatus::Healthy;
        for health in state.components.values() {
            match health.status {
                ComponentStatus::Unhealthy => {
                    status = ComponentStatus::Unhealthy;
                    break;
                }
                ComponentStatus::Degraded => status = ComponentStatus::Degraded,
                ComponentStatus::Healthy => {}
            }
        }
        HealthResponse {
            status,
            components: state.components.clone(),
        }
    }

    /// Snapshot readiness
    pub async fn readiness(&self) -> ReadinessResponse {
        ReadinessResponse {
            ready: self.state.read().await.ready,
        }
    }
}
