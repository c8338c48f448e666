pub mod backend;
pub mod diagnostics;
pub mod health;
pub mod language;
pub mod normalize;
pub mod phonemizer;
pub mod rewrite;

// Re-export commonly used types for convenience
pub use backend::{
    BackendFactory, BackendHandle, BackendManager, BackendOptions, EspeakBackend, EspeakFactory,
    PhonemeBackend, is_engine_available,
};
pub use diagnostics::{DiagnosticsProvider, ProcessDiagnostics, SystemDiagnostics};
pub use health::{EngineHealth, HealthReport, HealthStatus};
pub use language::LanguageCode;
pub use normalize::{PassthroughNormalizer, TextNormalizer};
pub use phonemizer::{Phonemizer, PhonemizerBuilder, check_espeak};
pub use rewrite::{PhonemeRewriter, RewriteRule, RuleContext, rewrite_phonemes};
