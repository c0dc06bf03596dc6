//! The PodScaler primary resource
//!
//! A `PodScaler` points at a scalable workload and collects per-container
//! vertical-scaling recommendations in its status. The controller never
//! scales the workload itself; it only maintains the derived
//! `VerticalPodAutoscaler` and mirrors recommendations back here.

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type summarizing whether reconciliation is healthy.
pub const CONDITION_ACTIVE: &str = "Active";

/// Condition reason set when creating the derived resource failed.
pub const REASON_FAILED_CREATE: &str = "FailedCreate";

/// Condition reason set when the derived resource exists but is owned by
/// someone else.
pub const REASON_NOT_OWNED: &str = "NotOwned";

/// Reference to the workload being scaled (deployment, statefulset, ...).
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossVersionObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

/// Spec of the PodScaler resource.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "autoscaling.internal.dev",
    version = "v1alpha1",
    kind = "PodScaler",
    namespaced,
    status = "PodScalerStatus",
    shortname = "ps"
)]
#[serde(rename_all = "camelCase")]
pub struct PodScalerSpec {
    /// The workload whose containers receive recommendations.
    pub scale_target_ref: CrossVersionObjectReference,
}

/// One per-container recommendation mirrored from the derived resource.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecommendation {
    pub container_name: String,
    pub cpu: Quantity,
    pub memory: Quantity,
}

/// Observed condition on a PodScaler.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodScalerCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Status of the PodScaler resource.
///
/// `resource_recommendations` is fully replaced, never merged, on every
/// successful reconciliation pass.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodScalerStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PodScalerCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_recommendations: Vec<ResourceRecommendation>,
}

impl PodScaler {
    fn status_mut(&mut self) -> &mut PodScalerStatus {
        self.status.get_or_insert_with(PodScalerStatus::default)
    }

    /// Record that creating the derived resource failed.
    pub fn mark_resource_failed_creation(&mut self, kind: &str, name: &str) {
        self.set_condition(
            CONDITION_ACTIVE,
            "False",
            REASON_FAILED_CREATE,
            format!("Failed to create {kind} {name:?}."),
        );
    }

    /// Record that the derived resource exists but is not controlled by this
    /// PodScaler.
    pub fn mark_resource_not_owned(&mut self, kind: &str, name: &str) {
        self.set_condition(
            CONDITION_ACTIVE,
            "False",
            REASON_NOT_OWNED,
            format!("There is an existing {kind} {name:?} that we do not own."),
        );
    }

    /// Replace the recommendation list wholesale.
    pub fn set_resource_recommendations(&mut self, recommendations: Vec<ResourceRecommendation>) {
        self.status_mut().resource_recommendations = recommendations;
    }

    fn set_condition(&mut self, type_: &str, status: &str, reason: &str, message: String) {
        let conditions = &mut self.status_mut().conditions;
        if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == type_) {
            // The transition timestamp only moves when the condition actually
            // changes state.
            if existing.status != status || existing.reason.as_deref() != Some(reason) {
                existing.last_transition_time = Some(Utc::now());
            }
            existing.status = status.to_string();
            existing.reason = Some(reason.to_string());
            existing.message = Some(message);
        } else {
            conditions.push(PodScalerCondition {
                type_: type_.to_string(),
                status: status.to_string(),
                reason: Some(reason.to_string()),
                message: Some(message),
                last_transition_time: Some(Utc::now()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> PodScaler {
        PodScaler::new(
            "my-scaler",
            PodScalerSpec {
                scale_target_ref: CrossVersionObjectReference {
                    api_version: "apps/v1".to_string(),
                    kind: "Deployment".to_string(),
                    name: "my-app".to_string(),
                },
            },
        )
    }

    #[test]
    fn mark_not_owned_sets_active_false() {
        let mut ps = scaler();
        ps.mark_resource_not_owned("VerticalPodAutoscaler", "my-scaler");

        let status = ps.status.as_ref().unwrap();
        assert_eq!(status.conditions.len(), 1);
        let cond = &status.conditions[0];
        assert_eq!(cond.type_, CONDITION_ACTIVE);
        assert_eq!(cond.status, "False");
        assert_eq!(cond.reason.as_deref(), Some(REASON_NOT_OWNED));
    }

    #[test]
    fn marking_twice_keeps_a_single_condition() {
        let mut ps = scaler();
        ps.mark_resource_failed_creation("VerticalPodAutoscaler", "my-scaler");
        ps.mark_resource_not_owned("VerticalPodAutoscaler", "my-scaler");

        let status = ps.status.as_ref().unwrap();
        assert_eq!(status.conditions.len(), 1);
        assert_eq!(
            status.conditions[0].reason.as_deref(),
            Some(REASON_NOT_OWNED)
        );
    }

    #[test]
    fn recommendations_are_replaced_not_merged() {
        let mut ps = scaler();
        ps.set_resource_recommendations(vec![ResourceRecommendation {
            container_name: "user-container".to_string(),
            cpu: Quantity("500m".to_string()),
            memory: Quantity("512Mi".to_string()),
        }]);
        ps.set_resource_recommendations(Vec::new());

        assert!(ps
            .status
            .as_ref()
            .unwrap()
            .resource_recommendations
            .is_empty());
    }
}
