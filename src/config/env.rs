use super::PhonemizerConfig;
use super::merge::merge_config;
use super::validation::validate_config;

impl PhonemizerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `ESPEAK_BINARY` | `espeak-ng` |
    /// | `ESPEAK_VERSION_CHECK_TIMEOUT_SECONDS` | 5 |
    /// | `PHONEMIZE_TIMEOUT_SECONDS` | 30 |
    /// | `PHONEMIZER_RESET_INTERVAL` | 50 |
    /// | `PHONEMIZER_PRESERVE_PUNCTUATION` | true |
    /// | `PHONEMIZER_WITH_STRESS` | true |
    /// | `HEALTH_WARMUP_PERIOD_SECONDS` | 60 |
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or validation fails
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        validate_config(&config)?;
        Ok(config)
    }
}
