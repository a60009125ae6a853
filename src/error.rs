use thiserror::Error;

/// Reasons a name is refused by [`crate::names::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name is longer than {max} characters")]
    TooLong { max: usize },
    #[error("name contains invalid character {0:?}")]
    InvalidChar(char),
    #[error("name {0:?} is reserved")]
    Banned(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// No live route holds the name. Expected; callers route it to a create flow.
    #[error("no route named {0:?}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] NameError),

    /// The backing table could not be reached or a write failed for a reason
    /// other than a uniqueness conflict.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Degenerate generator inputs or bad environment settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "invalid_name",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::Configuration(_) => "configuration",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::Validation(_) => 400,
            Error::StoreUnavailable(_) => 503,
            Error::Configuration(_) => 500,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
