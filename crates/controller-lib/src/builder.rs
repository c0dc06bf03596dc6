//! Desired-state construction for the derived VerticalPodAutoscaler
//!
//! Pure and deterministic: identical inputs produce identical output, which
//! keeps the reconciler's diff step stable across passes. No validation
//! happens here; a malformed scale target is passed through verbatim.

use kube::core::ObjectMeta;
use kube::{Resource, ResourceExt};

use crate::config::AutoscalerConfig;
use crate::resources::{
    ContainerResourcePolicy, CrossVersionObjectReference, PodResourcePolicy, PodScaler,
    PodUpdatePolicy, UpdateMode, VerticalPodAutoscaler, VerticalPodAutoscalerSpec,
};

/// Build the VerticalPodAutoscaler this PodScaler should own.
///
/// The VPA exists purely to obtain recommendations: its update mode is
/// pinned to `Off` so the VPA updater never mutates the live workload.
pub fn desired_vpa(scaler: &PodScaler, config: &AutoscalerConfig) -> VerticalPodAutoscaler {
    VerticalPodAutoscaler {
        metadata: ObjectMeta {
            name: Some(scaler.name_any()),
            namespace: scaler.namespace(),
            labels: scaler.metadata.labels.clone(),
            annotations: scaler.metadata.annotations.clone(),
            owner_references: scaler.controller_owner_ref(&()).map(|o| vec![o]),
            ..ObjectMeta::default()
        },
        spec: VerticalPodAutoscalerSpec {
            target_ref: Some(CrossVersionObjectReference {
                api_version: scaler.spec.scale_target_ref.api_version.clone(),
                kind: scaler.spec.scale_target_ref.kind.clone(),
                name: scaler.spec.scale_target_ref.name.clone(),
            }),
            update_policy: Some(PodUpdatePolicy {
                update_mode: Some(UpdateMode::Off),
            }),
            resource_policy: Some(PodResourcePolicy {
                container_policies: config
                    .container_policies
                    .iter()
                    .map(|policy| ContainerResourcePolicy {
                        container_name: policy.container_name.clone(),
                        mode: Some(policy.mode.clone()),
                        max_allowed: [
                            ("cpu".to_string(), policy.max_allowed_cpu.clone()),
                            ("memory".to_string(), policy.max_allowed_memory.clone()),
                        ]
                        .into(),
                    })
                    .collect(),
            }),
        },
        status: None,
    }
}
