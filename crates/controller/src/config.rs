//! Controller configuration

use anyhow::{Context, Result};
use controller_lib::AutoscalerConfig;
use serde::Deserialize;
use std::path::Path;

/// Controller process configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Namespace to watch; all namespaces when unset
    #[serde(default)]
    pub namespace: Option<String>,

    /// Interval between periodic resyncs of a converged PodScaler, in seconds
    #[serde(default = "default_requeue_interval")]
    pub requeue_interval_secs: u64,

    /// Delay before retrying a failed reconciliation, in seconds
    #[serde(default = "default_error_requeue_interval")]
    pub error_requeue_secs: u64,

    /// Path to the autoscaler tunables file (JSON); built-in defaults when unset
    #[serde(default)]
    pub autoscaler_config_path: Option<String>,
}

fn default_api_port() -> u16 {
    8080
}

fn default_requeue_interval() -> u64 {
    300
}

fn default_error_requeue_interval() -> u64 {
    15
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            namespace: None,
            requeue_interval_secs: default_requeue_interval(),
            error_requeue_secs: default_error_requeue_interval(),
            autoscaler_config_path: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("CONTROLLER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Load the autoscaler tunables this process hands into every
    /// reconciliation pass.
    pub fn load_autoscaler_config(&self) -> Result<AutoscalerConfig> {
        match &self.autoscaler_config_path {
            Some(path) => load_autoscaler_file(Path::new(path)),
            None => Ok(AutoscalerConfig::default()),
        }
    }
}

fn load_autoscaler_file(path: &Path) -> Result<AutoscalerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read autoscaler config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid autoscaler config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_watch_all_namespaces() {
        let config = ControllerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert!(config.namespace.is_none());
        assert!(config.autoscaler_config_path.is_none());
    }

    #[test]
    fn missing_path_falls_back_to_default_tunables() {
        let config = ControllerConfig::default();
        assert_eq!(
            config.load_autoscaler_config().unwrap(),
            AutoscalerConfig::default()
        );
    }

    #[test]
    fn autoscaler_tunables_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"container_policies": [{{"containerName": "user-container",
                "mode": "Auto", "maxAllowedCpu": "2", "maxAllowedMemory": "1Gi"}}]}}"#
        )
        .unwrap();

        let config = ControllerConfig {
            autoscaler_config_path: Some(file.path().display().to_string()),
            ..ControllerConfig::default()
        };
        let tunables = config.load_autoscaler_config().unwrap();
        assert_eq!(tunables.container_policies.len(), 1);
        assert_eq!(tunables.container_policies[0].max_allowed_cpu.0, "2");
    }

    #[test]
    fn malformed_tunables_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = ControllerConfig {
            autoscaler_config_path: Some(file.path().display().to_string()),
            ..ControllerConfig::default()
        };
        assert!(config.load_autoscaler_config().is_err());
    }
}
