//! Stage reconcilers, one per child object kind.
//!
//! Each reconciler compares the desired child (built from the Reaper) with
//! the actual object in the store and takes one step to converge.

pub mod config;
pub mod deployment;
pub mod schema;
pub mod service;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::backoff::RetryPolicy;
use crate::config::OperatorConfig;
use crate::desired::{DesiredState, ObjectKey};
use crate::error::Error;
use crate::owner::attach_owner;
use crate::status::StatusWriter;
use crate::store::{Object, ObjectStore, StoreError};

pub use config::ConfigMapReconciler;
pub use deployment::DeploymentReconciler;
pub use schema::SchemaReconciler;
pub use service::ServiceReconciler;

/// Stages of a convergence cycle, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Endpoint,
    SchemaJob,
    Workload,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Config,
        Stage::Endpoint,
        Stage::SchemaJob,
        Stage::Workload,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Endpoint => "service",
            Stage::SchemaJob => "schema",
            Stage::Workload => "deployment",
        };
        f.write_str(name)
    }
}

/// Outcome of a stage (or of a whole cycle).
#[derive(Debug)]
pub enum ReconcileResult {
    /// Nothing left to do this cycle.
    Complete,
    /// Run again after the delay.
    Requeue(Duration),
    /// Run again after the delay; the attempt failed with `error`.
    Retry { after: Duration, error: Error },
    /// Failed in a way retrying cannot fix.
    Fatal(Error),
}

impl ReconcileResult {
    /// Result for `error`, retried or fatal depending on its class.
    pub fn from_error(error: Error, policy: &RetryPolicy) -> Self {
        match policy.delay_for(error.class()) {
            Some(after) => ReconcileResult::Retry { after, error },
            None => ReconcileResult::Fatal(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileResult::Complete | ReconcileResult::Fatal(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ReconcileResult::Complete)
    }

    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            ReconcileResult::Requeue(after) | ReconcileResult::Retry { after, .. } => Some(*after),
            ReconcileResult::Complete | ReconcileResult::Fatal(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            ReconcileResult::Retry { error, .. } | ReconcileResult::Fatal(error) => Some(error),
            ReconcileResult::Complete | ReconcileResult::Requeue(_) => None,
        }
    }
}

/// Collaborators shared by all stages.
pub struct Context<S, W> {
    pub store: S,
    pub status: W,
    pub config: OperatorConfig,
}

impl<S, W> Context<S, W> {
    pub fn new(store: S, status: W, config: OperatorConfig) -> Self {
        Self {
            store,
            status,
            config,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.config.retry
    }
}

/// Trait for stage reconcilers.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// The stage this reconciler implements.
    fn stage(&self) -> Stage;

    /// Compare desired with actual state and take one step towards it.
    async fn reconcile<S, W>(&self, ctx: &Context<S, W>, desired: &DesiredState) -> ReconcileResult
    where
        S: ObjectStore,
        W: StatusWriter;
}

/// Create `key` from `build` unless an object of kind `K` already exists.
///
/// Existing objects are never modified.
pub(crate) async fn create_if_absent<K, S, W, F>(
    ctx: &Context<S, W>,
    desired: &DesiredState,
    key: &ObjectKey,
    build: F,
) -> ReconcileResult
where
    K: Object,
    S: ObjectStore,
    W: StatusWriter,
    F: FnOnce() -> Result<K, Error> + Send,
{
    let kind = K::kind(&());
    match ctx.store.get::<K>(key).await {
        Ok(Some(_)) => {
            debug!("{} {} exists", kind, key);
            ReconcileResult::Complete
        }
        Ok(None) => {
            let obj = match build().and_then(|obj| attach_owner(obj, desired)) {
                Ok(obj) => obj,
                Err(e) => {
                    error!("Failed to build {} {}: {}", kind, key, e);
                    return ReconcileResult::from_error(e, ctx.policy());
                }
            };

            info!("Creating {} {}", kind, key);
            match ctx.store.create(&obj).await {
                Ok(_) => ReconcileResult::Requeue(ctx.policy().short),
                Err(StoreError::AlreadyExists(_)) => {
                    debug!("{} {} was created concurrently", kind, key);
                    ReconcileResult::Complete
                }
                Err(e) => {
                    error!("Failed to create {} {}: {}", kind, key, e);
                    ReconcileResult::from_error(e.into(), ctx.policy())
                }
            }
        }
        Err(e) => {
            error!("Failed to get {} {}: {}", kind, key, e);
            ReconcileResult::from_error(e.into(), ctx.policy())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn terminal_results() {
        let policy = RetryPolicy::default();
        assert!(ReconcileResult::Complete.is_terminal());
        assert!(!ReconcileResult::Requeue(policy.short).is_terminal());

        let fatal = ReconcileResult::from_error(ConfigError::MissingBackend.into(), &policy);
        assert!(fatal.is_terminal());
        assert!(fatal.error().is_some());
        assert_eq!(fatal.requeue_after(), None);
    }

    #[test]
    fn transient_errors_are_retried() {
        let policy = RetryPolicy::default();
        let result = ReconcileResult::from_error(
            StoreError::NotFound("Deployment a/b".to_string()).into(),
            &policy,
        );
        assert!(!result.is_terminal());
        assert_eq!(result.requeue_after(), Some(policy.transient));
    }

    #[test]
    fn stage_order() {
        assert_eq!(
            Stage::ORDER.map(|s| s.to_string()),
            ["config", "service", "schema", "deployment"]
        );
    }
}
