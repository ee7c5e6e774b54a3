use thiserror::Error;

/// Configuration problems that must stop a run before any sentence is
/// processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported language code `{0}` (expected one of: eng, fra, spa, kor, deu)")]
    UnsupportedLanguage(String),

    #[error("annotator failed on all {attempted} inputs it was given, last error: {reason}")]
    AnnotatorUnavailable { attempted: usize, reason: String },

    #[error("no annotator available: build with the `remote` feature or pass --annotations")]
    MissingAnnotator,
}
