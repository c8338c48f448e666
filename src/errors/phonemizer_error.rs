use std::time::Duration;

/// Errors produced by the phonemization pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhonemizerError {
    /// The caller passed a language code outside the supported set
    #[error(
        "Unsupported language code: {0}. Supported: 'a'/'en-us' (American English), 'b'/'en-gb' (British English)"
    )]
    UnsupportedLanguage(String),

    /// The eSpeak-NG binary is missing or did not answer a version query
    #[error("eSpeak-NG not available: {0}. Install with: apt-get install espeak-ng")]
    EngineNotInstalled(String),

    /// The engine reported an error while constructing a backend handle
    #[error("Failed to initialize phonemizer backend: {0}")]
    EngineInitializationFailed(String),

    /// The engine failed while converting text
    #[error("Phonemization failed: {0}")]
    PhonemizationFailed(String),

    /// The engine did not answer within the configured bound
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl PhonemizerError {
    pub(crate) fn timeout(operation: &'static str, timeout: Duration) -> Self {
        PhonemizerError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// Result type for phonemizer operations
pub type PhonemizerResult<T> = Result<T, PhonemizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_message() {
        let err = PhonemizerError::UnsupportedLanguage("fr".to_string());
        let msg = err.to_string();
        assert!(msg.contains("fr"));
        assert!(msg.contains("Unsupported language"));
    }

    #[test]
    fn test_timeout_message() {
        let err = PhonemizerError::timeout("espeak-ng phonemization", Duration::from_secs(2));
        assert_eq!(
            err.to_string(),
            "espeak-ng phonemization timed out after 2000ms"
        );
    }
}
