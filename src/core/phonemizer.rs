//! Text-to-phoneme pipeline
//!
//! `phonemize` runs: optional normalization, backend acquisition, the engine
//! call (bounded by a timeout), then the rewrite rules. Failures inside the
//! engine call are logged together with a process diagnostics snapshot and
//! returned unchanged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::backend::{
    BackendFactory, BackendHandle, BackendManager, BackendOptions, DEFAULT_RESET_INTERVAL,
    EspeakFactory, is_engine_available,
};
use super::diagnostics::{DiagnosticsProvider, ProcessDiagnostics, SystemDiagnostics};
use super::health::{EngineHealth, HealthReport};
use super::language::LanguageCode;
use super::normalize::{PassthroughNormalizer, TextNormalizer};
use super::rewrite::PhonemeRewriter;
use crate::config::PhonemizerConfig;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Default bound on a single engine call
pub const DEFAULT_PHONEMIZE_TIMEOUT: Duration = Duration::from_secs(30);

const WARMUP_TEXT: &str = "Welcome to the voice assistant. How can I help you today?";

/// Converts text to Kokoro-compatible phonemes
pub struct Phonemizer {
    manager: BackendManager,
    normalizer: Arc<dyn TextNormalizer>,
    rewriter: PhonemeRewriter,
    diagnostics: Arc<dyn DiagnosticsProvider>,
    call_timeout: Duration,
}

impl Phonemizer {
    pub fn builder() -> PhonemizerBuilder {
        PhonemizerBuilder::default()
    }

    /// eSpeak-NG subprocess pipeline configured from `config`
    pub fn from_config(config: &PhonemizerConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Convert `text` to phonemes.
    ///
    /// # Arguments
    /// * `text` - Text to phonemize
    /// * `language` - "a"/"en-us" for American, "b"/"en-gb" for British English
    /// * `normalize` - Run the normalizer first
    ///
    /// # Errors
    /// `UnsupportedLanguage` before anything else runs; `EngineNotInstalled` or
    /// `EngineInitializationFailed` when no handle can be obtained;
    /// `PhonemizationFailed` or `Timeout` from the engine call. Empty text still
    /// acquires a handle and counts towards the reset interval.
    pub async fn phonemize(
        &self,
        text: &str,
        language: &str,
        normalize: bool,
    ) -> PhonemizerResult<String> {
        let language = language.parse::<LanguageCode>()?;
        self.phonemize_as(text, language, normalize).await
    }

    /// [`Phonemizer::phonemize`] with an already parsed language
    pub async fn phonemize_as(
        &self,
        text: &str,
        language: LanguageCode,
        normalize: bool,
    ) -> PhonemizerResult<String> {
        let normalized = if normalize {
            self.normalizer.normalize(text)
        } else {
            text.to_string()
        };

        let backend = self.manager.acquire(language).await?;
        let raw = self.run_backend(&backend, normalized).await?;

        Ok(self.rewriter.rewrite(&raw, language))
    }

    async fn run_backend(&self, backend: &BackendHandle, text: String) -> PhonemizerResult<String> {
        let batch = [text];
        let result = tokio::time::timeout(self.call_timeout, backend.phonemize(&batch))
            .await
            .unwrap_or_else(|_| Err(PhonemizerError::timeout("phonemization", self.call_timeout)));

        match result {
            Ok(phonemes) => Ok(phonemes.into_iter().next().unwrap_or_default()),
            Err(e) => {
                let diagnostics = self.capture_diagnostics().await;
                tracing::error!(
                    "{} backend error ({}): {} | {}",
                    backend.name(),
                    backend.language(),
                    e,
                    diagnostics
                );
                Err(e)
            }
        }
    }

    // Process scans are blocking and can be slow on busy hosts
    async fn capture_diagnostics(&self) -> ProcessDiagnostics {
        let provider = self.diagnostics.clone();
        tokio::task::spawn_blocking(move || provider.capture())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Diagnostics capture failed: {}", e);
                ProcessDiagnostics::default()
            })
    }

    /// Run the installation check once and log the result
    pub async fn startup_check(&self) -> bool {
        let working = self.manager.factory().is_available().await;
        if !working {
            self.manager
                .health()
                .mark_degraded("eSpeak not working during initialization");
        }
        tracing::info!(
            "eSpeak Status: {}",
            if working { "Working" } else { "Not Working" }
        );
        working
    }

    /// Health as seen by the surrounding service.
    ///
    /// Always healthy during the warm-up period. Afterwards a degraded engine is
    /// reported as is; otherwise the installation check runs again.
    pub async fn health_check(&self) -> HealthReport {
        let health = self.manager.health();
        if health.is_warming_up() {
            return HealthReport::warming_up();
        }
        if health.is_degraded() {
            return HealthReport::unhealthy(health.reason().unwrap_or("espeak not working"));
        }
        if !self.manager.factory().is_available().await {
            health.mark_degraded("espeak not working");
            return HealthReport::unhealthy("espeak not working");
        }
        HealthReport::healthy()
    }

    /// Phonemize a representative sentence so the first real request does not
    /// pay for backend creation
    pub async fn warmup(&self) -> PhonemizerResult<()> {
        let start = Instant::now();
        let phonemes = self
            .phonemize_as(WARMUP_TEXT, LanguageCode::AmericanEnglish, true)
            .await?;

        if phonemes.is_empty() {
            tracing::warn!("Warmup phonemization returned empty result");
        } else {
            tracing::info!(
                "Phonemizer warmup completed: {} chars -> {} phonemes in {:?}",
                WARMUP_TEXT.len(),
                phonemes.chars().count(),
                start.elapsed()
            );
        }
        Ok(())
    }

    /// Shared health state, for wiring into the service's health endpoint
    pub fn health(&self) -> Arc<EngineHealth> {
        self.manager.health().clone()
    }

    pub fn manager(&self) -> &BackendManager {
        &self.manager
    }
}

/// Builder for [`Phonemizer`]
///
/// Defaults: eSpeak-NG subprocess backend, passthrough normalizer, standard
/// rewrite rules, OS diagnostics, reset every 50 acquisitions.
pub struct PhonemizerBuilder {
    factory: Option<Arc<dyn BackendFactory>>,
    normalizer: Arc<dyn TextNormalizer>,
    rewriter: PhonemeRewriter,
    diagnostics: Arc<dyn DiagnosticsProvider>,
    health: Option<Arc<EngineHealth>>,
    options: BackendOptions,
    reset_interval: u64,
    call_timeout: Duration,
    espeak_binary: Option<String>,
    version_check_timeout: Option<Duration>,
    warmup_period: Option<Duration>,
}

impl Default for PhonemizerBuilder {
    fn default() -> Self {
        Self {
            factory: None,
            normalizer: Arc::new(PassthroughNormalizer),
            rewriter: PhonemeRewriter::default(),
            diagnostics: Arc::new(SystemDiagnostics),
            health: None,
            options: BackendOptions::default(),
            reset_interval: DEFAULT_RESET_INTERVAL,
            call_timeout: DEFAULT_PHONEMIZE_TIMEOUT,
            espeak_binary: None,
            version_check_timeout: None,
            warmup_period: None,
        }
    }
}

impl PhonemizerBuilder {
    /// Apply every setting from a loaded configuration
    pub fn config(mut self, config: &PhonemizerConfig) -> Self {
        self.espeak_binary = Some(config.espeak_binary.clone());
        self.version_check_timeout = Some(Duration::from_secs(config.version_check_timeout_seconds));
        self.call_timeout = Duration::from_secs(config.phonemize_timeout_seconds);
        self.reset_interval = config.reset_interval;
        self.options = BackendOptions {
            preserve_punctuation: config.preserve_punctuation,
            with_stress: config.with_stress,
        };
        self.warmup_period = Some(Duration::from_secs(config.warmup_period_seconds));
        self
    }

    /// Use a custom engine instead of the eSpeak-NG binary
    pub fn factory(mut self, factory: Arc<dyn BackendFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn rewriter(mut self, rewriter: PhonemeRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsProvider>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Share an existing health state instead of creating one
    pub fn health(mut self, health: Arc<EngineHealth>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn options(mut self, options: BackendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reset_interval(mut self, reset_interval: u64) -> Self {
        self.reset_interval = reset_interval;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn build(self) -> Phonemizer {
        let factory = self.factory.unwrap_or_else(|| {
            let mut espeak = match self.espeak_binary {
                Some(binary) => EspeakFactory::new(binary),
                None => EspeakFactory::default(),
            };
            if let Some(timeout) = self.version_check_timeout {
                espeak = espeak.with_version_check_timeout(timeout);
            }
            Arc::new(espeak)
        });

        let health = self.health.unwrap_or_else(|| {
            Arc::new(match self.warmup_period {
                Some(period) => EngineHealth::new(period),
                None => EngineHealth::default(),
            })
        });

        // Creation runs a test phonemization, so it gets the same bound as a call
        let manager = BackendManager::new(factory, self.options, self.reset_interval, health)
            .with_create_timeout(self.call_timeout);

        Phonemizer {
            manager,
            normalizer: self.normalizer,
            rewriter: self.rewriter,
            diagnostics: self.diagnostics,
            call_timeout: self.call_timeout,
        }
    }
}

/// Check a binary directly, marking `health` on failure
pub async fn check_espeak(config: &PhonemizerConfig, health: Option<&EngineHealth>) -> bool {
    is_engine_available(
        &config.espeak_binary,
        Duration::from_secs(config.version_check_timeout_seconds),
        health,
    )
    .await
}
