//! eSpeak-NG subprocess backend
//!
//! Drives the `espeak-ng` binary in IPA mode. eSpeak drops punctuation, so when
//! punctuation preservation is on the text is split around marks, each chunk is
//! phonemized on its own, and the marks are put back between the results.
//!
//! Requires eSpeak-NG on the host:
//! - Ubuntu/Debian: `sudo apt-get install espeak-ng`
//! - macOS: `brew install espeak-ng`

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::availability::{DEFAULT_VERSION_CHECK_TIMEOUT, is_engine_available};
use super::{BackendFactory, BackendHandle, BackendOptions, PhonemeBackend};
use crate::core::language::LanguageCode;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Default eSpeak-NG executable name
pub const DEFAULT_ESPEAK_BINARY: &str = "espeak-ng";

/// Marks kept in the output when punctuation preservation is enabled
pub const PUNCTUATION_MARKS: &str = ";:,.!?¡¿—…\"«»“”";

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\s*[{}]+\s*", regex::escape(PUNCTUATION_MARKS))).unwrap());
// Language switch markers such as "(fr)" that eSpeak inserts around foreign words
static LANGUAGE_FLAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([a-z]{2,3}(?:-[a-z0-9]+)?\)").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Piece of input text, either words to phonemize or punctuation to keep
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Words(&'a str),
    Marks(&'a str),
}

fn split_punctuation(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in PUNCTUATION_RE.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Words(&text[last..m.start()]));
        }
        segments.push(Segment::Marks(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Words(&text[last..]));
    }
    segments
}

/// Collapse eSpeak's multi-line IPA output into a single space-separated line
fn clean_output(raw: &str, with_stress: bool) -> String {
    let without_flags = LANGUAGE_FLAG_RE.replace_all(raw, "");
    let mut cleaned = WHITESPACE_RE
        .replace_all(&without_flags, " ")
        .trim()
        .to_string();
    if !with_stress {
        cleaned.retain(|c| c != 'ˈ' && c != 'ˌ');
    }
    cleaned
}

/// Factory for [`EspeakBackend`] handles
#[derive(Debug, Clone)]
pub struct EspeakFactory {
    binary: String,
    version_check_timeout: Duration,
}

impl Default for EspeakFactory {
    fn default() -> Self {
        Self::new(DEFAULT_ESPEAK_BINARY)
    }
}

impl EspeakFactory {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            version_check_timeout: DEFAULT_VERSION_CHECK_TIMEOUT,
        }
    }

    pub fn with_version_check_timeout(mut self, timeout: Duration) -> Self {
        self.version_check_timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl BackendFactory for EspeakFactory {
    async fn is_available(&self) -> bool {
        is_engine_available(&self.binary, self.version_check_timeout, None).await
    }

    async fn create(
        &self,
        language: LanguageCode,
        options: BackendOptions,
    ) -> PhonemizerResult<BackendHandle> {
        let backend = EspeakBackend {
            binary: self.binary.clone(),
            language,
            options,
        };

        // A voice that eSpeak cannot load only shows up on first use
        backend
            .run_espeak("test")
            .await
            .map_err(|e| PhonemizerError::EngineInitializationFailed(e.to_string()))?;

        tracing::info!(
            "Initialized eSpeak-NG backend ({}, voice {}, punctuation: {}, stress: {})",
            self.binary,
            language.espeak_voice(),
            options.preserve_punctuation,
            options.with_stress
        );
        let handle: BackendHandle = Arc::new(backend);
        Ok(handle)
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}

/// One eSpeak-NG voice; every call spawns a short-lived `espeak-ng` process
#[derive(Debug, Clone)]
pub struct EspeakBackend {
    binary: String,
    language: LanguageCode,
    options: BackendOptions,
}

impl EspeakBackend {
    pub fn options(&self) -> BackendOptions {
        self.options
    }

    async fn run_espeak(&self, text: &str) -> PhonemizerResult<String> {
        let mut child = Command::new(&self.binary)
            .args(["-q", "--ipa", "-v", self.language.espeak_voice(), "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PhonemizerError::PhonemizationFailed(format!(
                    "failed to spawn {}: {e}",
                    self.binary
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await.map_err(|e| {
                PhonemizerError::PhonemizationFailed(format!("failed to write to espeak-ng: {e}"))
            })?;
        }

        let output = child.wait_with_output().await.map_err(|e| {
            PhonemizerError::PhonemizationFailed(format!("failed to wait for espeak-ng: {e}"))
        })?;

        if !output.status.success() {
            return Err(PhonemizerError::PhonemizationFailed(format!(
                "espeak-ng exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(clean_output(
            &String::from_utf8_lossy(&output.stdout),
            self.options.with_stress,
        ))
    }

    async fn phonemize_one(&self, text: &str) -> PhonemizerResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if !self.options.preserve_punctuation {
            return self.run_espeak(text).await;
        }

        let mut result = String::with_capacity(text.len() * 2);
        for segment in split_punctuation(text) {
            match segment {
                Segment::Words(words) if words.trim().is_empty() => {}
                Segment::Words(words) => result.push_str(&self.run_espeak(words).await?),
                Segment::Marks(marks) => {
                    if marks.starts_with(char::is_whitespace) && !result.is_empty() {
                        result.push(' ');
                    }
                    result.push_str(marks.trim());
                    if marks.ends_with(char::is_whitespace) {
                        result.push(' ');
                    }
                }
            }
        }

        Ok(result.trim().to_string())
    }
}

#[async_trait]
impl PhonemeBackend for EspeakBackend {
    async fn phonemize(&self, texts: &[String]) -> PhonemizerResult<Vec<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.phonemize_one(text).await?);
        }
        Ok(results)
    }

    fn language(&self) -> LanguageCode {
        self.language
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}
