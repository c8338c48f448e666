//! In-process eSpeak-NG backend via `espeak-rs`
//!
//! Avoids a process spawn per call at the cost of linking `libespeak-ng`.
//! Enabled with the `espeak-lib` feature.
//!
//! # Thread Safety
//!
//! eSpeak-NG keeps global state and is not thread-safe. Every call into
//! espeak-rs goes through [`ESPEAK_MUTEX`] on a blocking thread.
//!
//! # System Requirements
//!
//! - Ubuntu/Debian: `sudo apt-get install espeak-ng libespeak-ng-dev`
//! - macOS: `brew install espeak-ng`

use std::sync::Arc;

use async_trait::async_trait;
use espeak_rs::text_to_phonemes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::{BackendFactory, BackendHandle, BackendOptions, PhonemeBackend};
use crate::core::language::LanguageCode;
use crate::errors::{PhonemizerError, PhonemizerResult};

static ESPEAK_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn phonemize_with_lock(text: &str, voice: &str, with_stress: bool) -> PhonemizerResult<String> {
    let _guard = ESPEAK_MUTEX.lock();

    let mut phonemes = text_to_phonemes(text, voice, None, true, false)
        .map_err(|e| PhonemizerError::PhonemizationFailed(e.to_string()))?
        .join(" ");

    if !with_stress {
        phonemes.retain(|c| c != 'ˈ' && c != 'ˌ');
    }
    Ok(phonemes)
}

async fn phonemize_blocking(
    text: String,
    voice: &'static str,
    with_stress: bool,
) -> PhonemizerResult<String> {
    tokio::task::spawn_blocking(move || phonemize_with_lock(&text, voice, with_stress))
        .await
        .map_err(|e| PhonemizerError::PhonemizationFailed(format!("eSpeak task failed: {e}")))?
}

/// Factory for [`LibEspeakBackend`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibEspeakFactory;

#[async_trait]
impl BackendFactory for LibEspeakFactory {
    async fn is_available(&self) -> bool {
        match phonemize_blocking("test".to_string(), "en-us", true).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("eSpeak-NG library check failed: {}", e);
                false
            }
        }
    }

    async fn create(
        &self,
        language: LanguageCode,
        options: BackendOptions,
    ) -> PhonemizerResult<BackendHandle> {
        phonemize_blocking("test".to_string(), language.espeak_voice(), true)
            .await
            .map_err(|e| PhonemizerError::EngineInitializationFailed(e.to_string()))?;

        tracing::info!(
            "Initialized in-process eSpeak-NG backend (voice {})",
            language.espeak_voice()
        );
        let handle: BackendHandle = Arc::new(LibEspeakBackend { language, options });
        Ok(handle)
    }

    fn name(&self) -> &'static str {
        "espeak-lib"
    }
}

/// eSpeak-NG linked into the process
#[derive(Debug, Clone)]
pub struct LibEspeakBackend {
    language: LanguageCode,
    options: BackendOptions,
}

#[async_trait]
impl PhonemeBackend for LibEspeakBackend {
    async fn phonemize(&self, texts: &[String]) -> PhonemizerResult<Vec<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(
                phonemize_blocking(
                    text.clone(),
                    self.language.espeak_voice(),
                    self.options.with_stress,
                )
                .await?,
            );
        }
        Ok(results)
    }

    fn language(&self) -> LanguageCode {
        self.language
    }

    fn name(&self) -> &'static str {
        "espeak-lib"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_library_backend_phonemizes() {
        let factory = LibEspeakFactory;
        if !factory.is_available().await {
            return; // Skip if espeak-ng is not installed
        }

        let backend = factory
            .create(LanguageCode::AmericanEnglish, BackendOptions::default())
            .await
            .unwrap();
        let result = backend.phonemize(&["hello world".to_string()]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result[0].is_empty());
    }
}
