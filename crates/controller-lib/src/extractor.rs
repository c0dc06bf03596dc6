//! Recommendation extraction from the observed VerticalPodAutoscaler

use crate::resources::{
    ResourceRecommendation, VerticalPodAutoscaler, CONDITION_TRUE, RECOMMENDATION_PROVIDED,
};

/// Extract the per-container recommendations from an observed VPA.
///
/// Returns an empty list when the recommender has not (yet) provided a
/// recommendation: no status, no payload, or the first condition is not
/// `RecommendationProvided` with status `"True"`. An empty result is not an
/// error; assigning it clears any previously mirrored recommendations.
///
/// Only `conditions[0]` is consulted, matching the recommender's observed
/// behavior. Output ordering follows the input collection and carries no
/// stability guarantee.
pub fn recommended_resources(vpa: &VerticalPodAutoscaler) -> Vec<ResourceRecommendation> {
    let Some(status) = &vpa.status else {
        return Vec::new();
    };
    let Some(recommendation) = &status.recommendation else {
        return Vec::new();
    };

    let provided = status
        .conditions
        .first()
        .is_some_and(|c| c.type_ == RECOMMENDATION_PROVIDED && c.status == CONDITION_TRUE);
    if !provided {
        return Vec::new();
    }

    recommendation
        .container_recommendations
        .iter()
        .map(|item| ResourceRecommendation {
            container_name: item.container_name.clone(),
            cpu: item.target.get("cpu").cloned().unwrap_or_default(),
            memory: item.target.get("memory").cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{
        RecommendedContainerResources, RecommendedPodResources, VerticalPodAutoscalerCondition,
        VerticalPodAutoscalerSpec, VerticalPodAutoscalerStatus,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn container(name: &str, cpu: &str, memory: &str) -> RecommendedContainerResources {
        RecommendedContainerResources {
            container_name: name.to_string(),
            target: BTreeMap::from([
                ("cpu".to_string(), Quantity(cpu.to_string())),
                ("memory".to_string(), Quantity(memory.to_string())),
            ]),
        }
    }

    fn vpa_with_status(status: Option<VerticalPodAutoscalerStatus>) -> VerticalPodAutoscaler {
        let mut vpa =
            VerticalPodAutoscaler::new("my-scaler", VerticalPodAutoscalerSpec::default());
        vpa.status = status;
        vpa
    }

    fn provided_condition(status: &str) -> VerticalPodAutoscalerCondition {
        VerticalPodAutoscalerCondition {
            type_: RECOMMENDATION_PROVIDED.to_string(),
            status: status.to_string(),
            ..VerticalPodAutoscalerCondition::default()
        }
    }

    #[test]
    fn provided_recommendation_yields_one_entry_per_container() {
        let vpa = vpa_with_status(Some(VerticalPodAutoscalerStatus {
            recommendation: Some(RecommendedPodResources {
                container_recommendations: vec![
                    container("user-container", "750m", "1Gi"),
                    container("queue-proxy", "25m", "64Mi"),
                ],
            }),
            conditions: vec![provided_condition("True")],
        }));

        let recommendations = recommended_resources(&vpa);
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].container_name, "user-container");
        assert_eq!(recommendations[0].cpu.0, "750m");
        assert_eq!(recommendations[0].memory.0, "1Gi");
        assert_eq!(recommendations[1].container_name, "queue-proxy");
        assert_eq!(recommendations[1].cpu.0, "25m");
    }

    #[test]
    fn missing_status_yields_empty() {
        assert!(recommended_resources(&vpa_with_status(None)).is_empty());
    }

    #[test]
    fn missing_payload_yields_empty() {
        let vpa = vpa_with_status(Some(VerticalPodAutoscalerStatus {
            recommendation: None,
            conditions: vec![provided_condition("True")],
        }));
        assert!(recommended_resources(&vpa).is_empty());
    }

    #[test]
    fn false_condition_yields_empty_even_with_payload() {
        let vpa = vpa_with_status(Some(VerticalPodAutoscalerStatus {
            recommendation: Some(RecommendedPodResources {
                container_recommendations: vec![container("user-container", "750m", "1Gi")],
            }),
            conditions: vec![provided_condition("False")],
        }));
        assert!(recommended_resources(&vpa).is_empty());
    }

    #[test]
    fn only_the_first_condition_is_authoritative() {
        let vpa = vpa_with_status(Some(VerticalPodAutoscalerStatus {
            recommendation: Some(RecommendedPodResources {
                container_recommendations: vec![container("user-container", "750m", "1Gi")],
            }),
            conditions: vec![
                VerticalPodAutoscalerCondition {
                    type_: "LowConfidence".to_string(),
                    status: "True".to_string(),
                    ..VerticalPodAutoscalerCondition::default()
                },
                provided_condition("True"),
            ],
        }));
        assert!(recommended_resources(&vpa).is_empty());
    }

    #[test]
    fn missing_target_entries_default_to_zero_value_quantities() {
        let vpa = vpa_with_status(Some(VerticalPodAutoscalerStatus {
            recommendation: Some(RecommendedPodResources {
                container_recommendations: vec![RecommendedContainerResources {
                    container_name: "user-container".to_string(),
                    target: BTreeMap::from([(
                        "cpu".to_string(),
                        Quantity("750m".to_string()),
                    )]),
                }],
            }),
            conditions: vec![provided_condition("True")],
        }));

        let recommendations = recommended_resources(&vpa);
        assert_eq!(recommendations[0].cpu.0, "750m");
        assert_eq!(recommendations[0].memory, Quantity::default());
    }
}
