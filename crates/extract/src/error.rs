use thiserror::Error;

/// Problems found while extracting embedded GraphQL.
///
/// Everything except [`ExtractError::InvalidPattern`] is attached to a
/// candidate and reported as a diagnostic at [`ExtractError::offset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ExtractError {
    #[error("invalid {which} delimiter pattern: {message}")]
    InvalidPattern { which: &'static str, message: String },

    #[error("{which} delimiter pattern must not match the empty string")]
    EmptyPattern { which: &'static str },

    #[error("embedded GraphQL is never closed by the end delimiter")]
    Unterminated { offset: usize },

    #[error("interpolation placeholder is never closed")]
    UnbalancedInterpolation { offset: usize },

    #[error("interpolation is not allowed in document position")]
    DocumentInterpolation { offset: usize },

    #[error("interpolation is not allowed in fragment position")]
    FragmentInterpolation { offset: usize },

    #[error("fragment must have a name")]
    UnnamedFragment { offset: usize },
}

impl ExtractError {
    /// Absolute offset in the parent file, if the error is located.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidPattern { .. } | Self::EmptyPattern { .. } => None,
            Self::Unterminated { offset }
            | Self::UnbalancedInterpolation { offset }
            | Self::DocumentInterpolation { offset }
            | Self::FragmentInterpolation { offset }
            | Self::UnnamedFragment { offset } => Some(*offset),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
