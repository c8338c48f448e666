//! Configuration for the phonemizer
//!
//! Settings come from YAML files and environment variables, following the
//! same layering as the rest of the service.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use kokoro_phonemizer::config::PhonemizerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = PhonemizerConfig::from_env()?;
//!
//! // Load from YAML file, falling back to environment variables
//! let config = PhonemizerConfig::from_file(&PathBuf::from("phonemizer.yaml"))?;
//!
//! println!("Using {}", config.espeak_binary);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_bool;

/// Phonemizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemizerConfig {
    // Engine settings
    pub espeak_binary: String,
    pub version_check_timeout_seconds: u64,
    pub phonemize_timeout_seconds: u64,

    // Backend lifecycle
    pub reset_interval: u64, // 0 disables periodic resets
    pub preserve_punctuation: bool,
    pub with_stress: bool,

    // Health reporting
    pub warmup_period_seconds: u64,
}

impl Default for PhonemizerConfig {
    fn default() -> Self {
        Self {
            espeak_binary: "espeak-ng".to_string(),
            version_check_timeout_seconds: 5,
            phonemize_timeout_seconds: 30,
            reset_interval: 50,
            preserve_punctuation: true,
            with_stress: true,
            warmup_period_seconds: 60,
        }
    }
}

impl PhonemizerConfig {
    /// Load configuration from a YAML file merged with environment variables
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// The `.env` file is not read here; the YAML file is the source of truth
    /// and only real environment variables fill in what it leaves out.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}
