use thiserror::Error;

use crate::kind::MediaKind;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Store returned asset {identifier} which does not resolve to {expected}")]
    UnexpectedKind {
        identifier: String,
        expected: MediaKind,
    },

    #[error("No representation was delivered")]
    NoRepresentation,

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MediaError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the store error if this failure came from the store unchanged.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;
