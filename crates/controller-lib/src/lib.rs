//! Controller library for VPA-backed vertical-scaling recommendations
//!
//! This crate provides the core functionality for:
//! - Building the desired VerticalPodAutoscaler for a PodScaler
//! - Reconciling it against observed cluster state (create, ownership
//!   check, diff, update)
//! - Extracting recommendations back onto the PodScaler status
//! - Health checks and observability

pub mod builder;
pub mod client;
pub mod config;
pub mod extractor;
pub mod health;
pub mod observability;
pub mod reconciler;
pub mod resources;

pub use builder::desired_vpa;
pub use client::{KubeVpaApi, VpaApi};
pub use config::{AutoscalerConfig, ContainerPolicy};
pub use extractor::recommended_resources;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use observability::ControllerMetrics;
pub use reconciler::{ReconcileError, Reconciler, DEFAULT_DEADLINE};
pub use resources::*;
