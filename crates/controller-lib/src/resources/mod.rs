//! Typed Kubernetes API objects handled by the controller
//!
//! Two resources live here: the `PodScaler` primary resource whose status we
//! feed, and the `VerticalPodAutoscaler` derived resource we create and keep
//! in sync to obtain recommendations from the VPA recommender.

mod pod_scaler;
mod vpa;

pub use pod_scaler::{
    CrossVersionObjectReference, PodScaler, PodScalerCondition, PodScalerSpec, PodScalerStatus,
    ResourceRecommendation, CONDITION_ACTIVE, REASON_FAILED_CREATE, REASON_NOT_OWNED,
};
pub use vpa::{
    ContainerResourcePolicy, ContainerScalingMode, PodResourcePolicy, PodUpdatePolicy,
    RecommendedContainerResources, RecommendedPodResources, UpdateMode, VerticalPodAutoscaler,
    VerticalPodAutoscalerCondition, VerticalPodAutoscalerSpec, VerticalPodAutoscalerStatus,
    CONDITION_TRUE, RECOMMENDATION_PROVIDED,
};
