//! Domain error types.

/// Top-level error type for premarket.
///
/// Row-level data problems are never errors; they surface as
/// [`NormalizationWarning`](crate::domain::normalizer::NormalizationWarning)s.
#[derive(Debug, thiserror::Error)]
pub enum PremarketError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("export acquisition failed: {reason}")]
    Acquisition { reason: String },

    #[error("export parse error in {file}: {reason}")]
    ExportParse { file: String, reason: String },

    #[error("failed to write artifact {artifact}: {reason}")]
    Artifact { artifact: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PremarketError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        Self::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

/// Exit code for an empty Top-N. Not an error: the run completed.
pub const EXIT_NO_QUALIFIERS: u8 = 2;

impl From<&PremarketError> for std::process::ExitCode {
    fn from(err: &PremarketError) -> Self {
        let code: u8 = match err {
            PremarketError::Io(_)
            | PremarketError::Artifact { .. }
            | PremarketError::ConfigParse { .. }
            | PremarketError::ConfigMissing { .. }
            | PremarketError::ConfigInvalid { .. } => 1,
            PremarketError::Acquisition { .. } | PremarketError::ExportParse { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
