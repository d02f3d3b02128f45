//! Error types.

use thiserror::Error;

use crate::backoff::FailureClass;
use crate::store::StoreError;

/// Configuration problems that will not heal without a change to the
/// `Reaper` resource or its referenced objects.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reaper has no namespace")]
    MissingNamespace,

    #[error("storage type cassandra requires a cassandraBackend")]
    MissingBackend,

    #[error("replication must set exactly one of simpleStrategy or networkTopologyStrategy")]
    InvalidReplication,

    #[error("jmx user secret {0} not found")]
    MissingSecret(String),

    #[error("{key} key not found in jmx auth secret {secret}")]
    MissingSecretKey { secret: String, key: &'static str },
}

/// Errors raised during a convergence cycle.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot set owner reference on {0}: parent has no uid")]
    OwnerReference(String),

    #[error("failed to render server config: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("failed to fingerprint object: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error("convergence cancelled")]
    Cancelled,
}

impl Error {
    pub fn class(&self) -> FailureClass {
        match self {
            Error::Config(_) | Error::Render(_) | Error::Fingerprint(_) => {
                FailureClass::Configuration
            }
            Error::Store(e) => e.class(),
            Error::OwnerReference(_) => FailureClass::Persistence,
            Error::Cancelled => FailureClass::Transient,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
