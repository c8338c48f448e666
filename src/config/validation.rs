use super::PhonemizerConfig;

/// Validate a fully merged configuration
///
/// The binary must be named and every timeout must be positive; a zero
/// timeout would fail every engine call.
pub fn validate_config(config: &PhonemizerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.espeak_binary.trim().is_empty() {
        return Err("ESPEAK_BINARY cannot be empty".into());
    }

    if config.version_check_timeout_seconds == 0 {
        return Err("version_check_timeout_seconds must be greater than 0".into());
    }

    if config.phonemize_timeout_seconds == 0 {
        return Err("phonemize_timeout_seconds must be greater than 0".into());
    }

    Ok(())
}
