use thiserror::Error;

/// Input validation failure in the conversion core.
///
/// Carries a human-readable message that callers show in place of the
/// output they would otherwise have produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("{0}")]
    Message(String),
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        FormatError::Message(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            FormatError::Message(m) => m,
        }
    }
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;
