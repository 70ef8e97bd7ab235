//! Input validation failures, all reported to clients as 400

/// Why a request field or body was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Empty { field: &'static str },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Body was not decodable into the expected shape (bad JSON, missing or mistyped field)
    #[error("{reason}")]
    MalformedBody { reason: String },
}

impl ValidationError {
    /// Offending field, when the failure is tied to one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } | Self::InvalidFormat { field, .. } => {
                Some(field)
            }
            Self::MalformedBody { .. } => None,
        }
    }
}
