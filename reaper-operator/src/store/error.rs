//! Object store error types.

use thiserror::Error;

use crate::backoff::FailureClass;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Object with the same key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Object cannot be stored (missing name or namespace).
    #[error("invalid object: {0}")]
    Invalid(String),

    /// Kubernetes API error.
    #[error("kubernetes api: {0}")]
    Kube(#[from] kube::Error),

    /// Object could not be (de)serialized.
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn class(&self) -> FailureClass {
        match self {
            StoreError::NotFound(_) | StoreError::Kube(_) => FailureClass::Transient,
            StoreError::AlreadyExists(_) | StoreError::Conflict(_) => FailureClass::Persistence,
            StoreError::Invalid(_) | StoreError::Serde(_) => FailureClass::Configuration,
        }
    }

    /// Map a Kubernetes API error onto the store taxonomy.
    pub fn from_kube(err: kube::Error, what: &str) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound(what.to_string()),
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                StoreError::AlreadyExists(what.to_string())
            }
            kube::Error::Api(resp) if resp.code == 409 => StoreError::Conflict(what.to_string()),
            _ => StoreError::Kube(err),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
