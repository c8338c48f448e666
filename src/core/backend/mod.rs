//! Grapheme-to-phoneme backends
//!
//! A [`BackendFactory`] knows how to check for and start an engine; the
//! [`PhonemeBackend`] handles it produces do the actual conversion. The
//! [`BackendManager`] owns the single live handle and its reset policy.

use std::sync::Arc;

use async_trait::async_trait;

use super::language::LanguageCode;
use crate::errors::PhonemizerResult;

pub mod availability;
pub mod espeak;
#[cfg(feature = "espeak-lib")]
pub mod espeak_lib;
pub mod manager;

pub use availability::is_engine_available;
pub use espeak::{EspeakBackend, EspeakFactory};
#[cfg(feature = "espeak-lib")]
pub use espeak_lib::{LibEspeakBackend, LibEspeakFactory};
pub use manager::{BackendManager, DEFAULT_CREATE_TIMEOUT, DEFAULT_RESET_INTERVAL};

/// Options fixed at handle creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendOptions {
    /// Keep punctuation marks in the phoneme output
    pub preserve_punctuation: bool,
    /// Emit primary/secondary stress marks
    pub with_stress: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            preserve_punctuation: true,
            with_stress: true,
        }
    }
}

/// A live session with a phonemization engine for one language
#[async_trait]
pub trait PhonemeBackend: Send + Sync {
    /// Phonemize a batch of texts. The result has at most one entry per input;
    /// an engine may return nothing for input it declines to process.
    async fn phonemize(&self, texts: &[String]) -> PhonemizerResult<Vec<String>>;

    fn language(&self) -> LanguageCode;

    fn name(&self) -> &'static str;
}

/// Shared handle type handed out by the manager
pub type BackendHandle = Arc<dyn PhonemeBackend>;

/// Creates backend handles for a particular engine
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Whether the engine is installed and answering. Never errors; a missing
    /// engine is an expected, reportable condition.
    async fn is_available(&self) -> bool;

    /// Start a handle for `language`
    async fn create(
        &self,
        language: LanguageCode,
        options: BackendOptions,
    ) -> PhonemizerResult<BackendHandle>;

    fn name(&self) -> &'static str;
}
