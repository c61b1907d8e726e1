//! JSON runtime configuration for the survey driver.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::estimator::SweepParams;

#[derive(Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the full JSON report here in addition to the per-directory
    /// report set.
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Root directory containing one subdirectory per survey.
    pub survey_root: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: SweepParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_default_params() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{ "survey_root": "/tmp/surveys" }"#).unwrap();
        assert_eq!(config.survey_root, PathBuf::from("/tmp/surveys"));
        assert_eq!(config.params.integration_half_range, 100.0);
        assert!(config.output.json_out.is_none());
    }

    #[test]
    fn params_can_be_overridden() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{ "survey_root": "/tmp/surveys", "params": { "max_fit_iterations": 50 } }"#,
        )
        .unwrap();
        assert_eq!(config.params.max_fit_iterations, 50);
        assert_eq!(config.params.initial_amplitude, 0.63);
    }
}
