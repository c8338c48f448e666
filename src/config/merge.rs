use std::env;

use super::PhonemizerConfig;
use super::utils::{parse_bool, parse_u64};
use super::yaml::YamlConfig;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<PhonemizerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = PhonemizerConfig::default();

    // Helper macro for numeric values with priority: YAML > ENV > Default
    macro_rules! get_u64 {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match env::var($env_var) {
                    Ok(raw) => parse_u64($env_var, &raw)?,
                    Err(_) => $default,
                },
            }
        };
    }

    // Helper macro for boolean values with priority: YAML > ENV > Default
    macro_rules! get_bool {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match env::var($env_var) {
                    Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                        format!("Invalid {} value '{}': expected true/false", $env_var, raw)
                    })?,
                    Err(_) => $default,
                },
            }
        };
    }

    let engine = yaml.engine.unwrap_or_default();
    let backend = yaml.backend.unwrap_or_default();
    let health = yaml.health.unwrap_or_default();

    // Engine configuration
    let espeak_binary = engine
        .binary
        .or_else(|| env::var("ESPEAK_BINARY").ok())
        .unwrap_or(defaults.espeak_binary);

    let version_check_timeout_seconds = get_u64!(
        "ESPEAK_VERSION_CHECK_TIMEOUT_SECONDS",
        engine.version_check_timeout_seconds,
        defaults.version_check_timeout_seconds
    );

    let phonemize_timeout_seconds = get_u64!(
        "PHONEMIZE_TIMEOUT_SECONDS",
        engine.phonemize_timeout_seconds,
        defaults.phonemize_timeout_seconds
    );

    // Backend lifecycle
    let reset_interval = get_u64!(
        "PHONEMIZER_RESET_INTERVAL",
        backend.reset_interval,
        defaults.reset_interval
    );

    let preserve_punctuation = get_bool!(
        "PHONEMIZER_PRESERVE_PUNCTUATION",
        backend.preserve_punctuation,
        defaults.preserve_punctuation
    );

    let with_stress = get_bool!(
        "PHONEMIZER_WITH_STRESS",
        backend.with_stress,
        defaults.with_stress
    );

    // Health reporting
    let warmup_period_seconds = get_u64!(
        "HEALTH_WARMUP_PERIOD_SECONDS",
        health.warmup_period_seconds,
        defaults.warmup_period_seconds
    );

    Ok(PhonemizerConfig {
        espeak_binary,
        version_check_timeout_seconds,
        phonemize_timeout_seconds,
        reset_interval,
        preserve_punctuation,
        with_stress,
        warmup_period_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{BackendYaml, EngineYaml, HealthYaml};
    use serial_test::serial;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("ESPEAK_BINARY");
            env::remove_var("ESPEAK_VERSION_CHECK_TIMEOUT_SECONDS");
            env::remove_var("PHONEMIZE_TIMEOUT_SECONDS");
            env::remove_var("PHONEMIZER_RESET_INTERVAL");
            env::remove_var("PHONEMIZER_PRESERVE_PUNCTUATION");
            env::remove_var("PHONEMIZER_WITH_STRESS");
            env::remove_var("HEALTH_WARMUP_PERIOD_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults_when_no_yaml_or_env() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();
        assert_eq!(config, PhonemizerConfig::default());
    }

    #[test]
    #[serial]
    fn test_merge_yaml_only() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            engine: Some(EngineYaml {
                binary: Some("espeak".to_string()),
                version_check_timeout_seconds: Some(1),
                phonemize_timeout_seconds: Some(2),
            }),
            backend: Some(BackendYaml {
                reset_interval: Some(3),
                preserve_punctuation: Some(false),
                with_stress: Some(false),
            }),
            health: Some(HealthYaml {
                warmup_period_seconds: Some(4),
            }),
        };

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(
            config,
            PhonemizerConfig {
                espeak_binary: "espeak".to_string(),
                version_check_timeout_seconds: 1,
                phonemize_timeout_seconds: 2,
                reset_interval: 3,
                preserve_punctuation: false,
                with_stress: false,
                warmup_period_seconds: 4,
            }
        );
    }

    #[test]
    #[serial]
    fn test_merge_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("ESPEAK_BINARY", "env-espeak");
            env::set_var("PHONEMIZER_RESET_INTERVAL", "10");
            env::set_var("PHONEMIZER_WITH_STRESS", "false");
        }

        let yaml = YamlConfig {
            engine: Some(EngineYaml {
                binary: Some("yaml-espeak".to_string()),
                ..Default::default()
            }),
            backend: Some(BackendYaml {
                reset_interval: Some(20),
                ..Default::default()
            }),
            health: None,
        };

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.espeak_binary, "yaml-espeak");
        assert_eq!(config.reset_interval, 20);
        // Not in YAML, so the environment wins over the default
        assert!(!config.with_stress);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_env_ignored_when_yaml_set() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PHONEMIZER_RESET_INTERVAL", "often");
        }

        let yaml = YamlConfig {
            backend: Some(BackendYaml {
                reset_interval: Some(15),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.reset_interval, 15);

        assert!(merge_config(None).is_err());

        cleanup_env_vars();
    }
}
