use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values missing from
/// the file fall back to environment variables, then to defaults.
///
/// # Example YAML structure
/// ```yaml
/// engine:
///   binary: "espeak-ng"
///   version_check_timeout_seconds: 5
///   phonemize_timeout_seconds: 30
///
/// backend:
///   reset_interval: 50
///   preserve_punctuation: true
///   with_stress: true
///
/// health:
///   warmup_period_seconds: 60
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub engine: Option<EngineYaml>,
    pub backend: Option<BackendYaml>,
    pub health: Option<HealthYaml>,
}

/// eSpeak-NG engine configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineYaml {
    pub binary: Option<String>,
    pub version_check_timeout_seconds: Option<u64>,
    pub phonemize_timeout_seconds: Option<u64>,
}

/// Backend lifecycle configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackendYaml {
    pub reset_interval: Option<u64>,
    pub preserve_punctuation: Option<bool>,
    pub with_stress: Option<bool>,
}

/// Health reporting configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HealthYaml {
    pub warmup_period_seconds: Option<u64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
