use thiserror::Error;

use crate::post::validate::ValidationError;

/// Errors surfaced by the content feed layer.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A single raw record failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Caller misuse of a pagination or media API.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A locale group with no members was asked for a translation.
    #[error("no translation available for group {0}")]
    NoTranslationAvailable(String),

    /// A CMS payload that is neither an envelope nor an array of records.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;
