//! Text normalization seam
//!
//! Number expansion, abbreviation handling and similar rules live with the
//! caller; the pipeline only needs something that maps text to text.

/// Text-to-text transform applied before phonemization
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}

/// Normalizer that returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNormalizer;

impl TextNormalizer for PassthroughNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}
