use thiserror::Error;

// ---------------------------------------------------------------------------
// ProcessingError – failures raised by the numeric core
// ---------------------------------------------------------------------------

/// Everything the filter and detection stages can reject.
///
/// Stages validate before producing output, so an `Err` always means the
/// caller's data was left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    /// A window width, factor, threshold or range the stage cannot use.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Non-rectangular profile, or an axis whose length disagrees with the
    /// profile it describes.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A textual processing step such as `dewow(10)` could not be parsed.
    #[error("cannot parse processing step '{0}'")]
    ParseStep(String),
}

pub type Result<T> = std::result::Result<T, ProcessingError>;

impl ProcessingError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProcessingError::InvalidParameter(msg.into())
    }
}
