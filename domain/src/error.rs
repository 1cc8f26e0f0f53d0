//! Error types for the `domain` layer.
//!
//! Errors are modeled as a root struct holding an `error_kind` discriminant
//! plus the original `source` error that caused it, so lower-layer errors
//! (token validation, hub publishing) are translated here once and the
//! transports only have to map kinds to status codes.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// The kinds of errors the domain layer surfaces to transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The request was well-formed but semantically unacceptable.
    Invalid,
    /// The caller's credential is missing, malformed, or expired.
    Unauthenticated,
    /// Anything that should never happen during steady-state operation.
    Internal,
}

impl Error {
    pub fn not_found() -> Self {
        Self {
            source: None,
            error_kind: DomainErrorKind::NotFound,
        }
    }

    pub fn invalid() -> Self {
        Self {
            source: None,
            error_kind: DomainErrorKind::Invalid,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            source: None,
            error_kind: DomainErrorKind::Unauthenticated,
        }
    }

    pub fn internal(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: Some(source.into()),
            error_kind: DomainErrorKind::Internal,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Unauthenticated,
        }
    }
}

impl From<hub::PublishError> for Error {
    fn from(err: hub::PublishError) -> Self {
        Self {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal,
        }
    }
}
