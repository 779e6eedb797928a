use std::fmt::{Display, Formatter, Result};

use capability_client::GatewayError;
use core_types::{BootcampId, CapabilityId};
use database::database_error::DatabaseError;

/// Failure of the local bootcamp store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The bootcamp row did not exist at delete time
    NotFound(BootcampId),
    /// The store could not be reached or the statement failed
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Bootcamp {} not found", id),
            StoreError::Unavailable(message) => write!(f, "Store unavailable: {}", message),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::BootcampNotFound(id) => StoreError::NotFound(id),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityFailure {
    pub capability_id: CapabilityId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    DbError(String),
    CapabilityServiceError(String),
    SettingsError(String),
    /// Capability ids of the bootcamp could not be read; nothing was deleted
    CapabilityEnumerationFailed {
        bootcamp_id: BootcampId,
        error: StoreError,
    },
    /// The bootcamp row and its links could not be removed
    BootcampDeletionFailed {
        bootcamp_id: BootcampId,
        error: StoreError,
    },
    /// The bootcamp is gone but some of its capabilities were not cleaned up
    IncompleteCleanup {
        bootcamp_id: BootcampId,
        failed_capabilities: Vec<CapabilityFailure>,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Error::DbError(message) => write!(f, "Database error: {}", message),
            Error::CapabilityServiceError(message) => {
                write!(f, "Capability service error: {}", message)
            }
            Error::SettingsError(message) => write!(f, "Settings error: {}", message),
            Error::CapabilityEnumerationFailed { bootcamp_id, error } => write!(
                f,
                "Failed to enumerate capabilities of bootcamp {}: {}",
                bootcamp_id, error
            ),
            Error::BootcampDeletionFailed { bootcamp_id, error } => {
                write!(f, "Failed to delete bootcamp {}: {}", bootcamp_id, error)
            }
            Error::IncompleteCleanup {
                bootcamp_id,
                failed_capabilities,
            } => {
                let ids = failed_capabilities
                    .iter()
                    .map(|failure| failure.capability_id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "Bootcamp {} deleted but capabilities [{}] were not cleaned up",
                    bootcamp_id, ids
                )
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<DatabaseError> for Error {
    fn from(err: DatabaseError) -> Self {
        Error::DbError(err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::DbError(err.to_string())
    }
}

impl From<GatewayError> for Error {
    fn from(err: GatewayError) -> Self {
        Error::CapabilityServiceError(err.to_string())
    }
}
