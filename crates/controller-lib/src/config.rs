//! Autoscaler tunables consumed by the desired-state builder
//!
//! The per-container policy table used to be a literal inside the builder;
//! it is injected configuration here so policy changes do not require a
//! rebuild. The controller binary loads it and hands a shared reference
//! into every reconciliation pass; this crate never caches or watches it.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};

use crate::resources::ContainerScalingMode;

/// Policy applied to one well-known container role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPolicy {
    pub container_name: String,
    pub mode: ContainerScalingMode,
    pub max_allowed_cpu: Quantity,
    pub max_allowed_memory: Quantity,
}

/// Autoscaler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalerConfig {
    /// Per-container policies stamped onto every VerticalPodAutoscaler this
    /// controller creates.
    #[serde(default = "default_container_policies")]
    pub container_policies: Vec<ContainerPolicy>,
}

impl Default for AutoscalerConfig {
    fn default() -> Self {
        Self {
            container_policies: default_container_policies(),
        }
    }
}

fn default_container_policies() -> Vec<ContainerPolicy> {
    vec![
        ContainerPolicy {
            container_name: "user-container".to_string(),
            mode: ContainerScalingMode::Auto,
            max_allowed_cpu: Quantity("4".to_string()),
            max_allowed_memory: Quantity("5Gi".to_string()),
        },
        ContainerPolicy {
            container_name: "queue-proxy".to_string(),
            mode: ContainerScalingMode::Off,
            max_allowed_cpu: Quantity("4".to_string()),
            max_allowed_memory: Quantity("5Gi".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_both_container_roles() {
        let config = AutoscalerConfig::default();
        let names: Vec<_> = config
            .container_policies
            .iter()
            .map(|p| p.container_name.as_str())
            .collect();
        assert_eq!(names, vec!["user-container", "queue-proxy"]);
        assert_eq!(config.container_policies[0].mode, ContainerScalingMode::Auto);
        assert_eq!(config.container_policies[1].mode, ContainerScalingMode::Off);
    }

    #[test]
    fn missing_policies_fall_back_to_defaults() {
        let config: AutoscalerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AutoscalerConfig::default());
    }

    #[test]
    fn policies_round_trip_through_json() {
        let config = AutoscalerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AutoscalerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
