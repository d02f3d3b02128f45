//! Schema stage: the job that creates the Reaper keyspace.
//!
//! Skipped for the in-memory backend. A failed job is deleted so the next
//! cycle recreates it; there is no retry ceiling.

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use tracing::{debug, error, info, warn};

use super::{Context, ReconcileResult, Reconciler, Stage};
use crate::builders::{build_schema_job, schema_job_name};
use crate::desired::DesiredState;
use crate::job::{self, JobState};
use crate::owner::attach_owner;
use crate::status::StatusWriter;
use crate::store::{ObjectStore, StoreError};

pub struct SchemaReconciler;

#[async_trait]
impl Reconciler for SchemaReconciler {
    fn stage(&self) -> Stage {
        Stage::SchemaJob
    }

    async fn reconcile<S, W>(&self, ctx: &Context<S, W>, desired: &DesiredState) -> ReconcileResult
    where
        S: ObjectStore,
        W: StatusWriter,
    {
        let policy = ctx.policy();
        let Some(job) = build_schema_job(desired, &ctx.config.schema_job_image) else {
            debug!(
                "Reaper {} uses {} storage, no schema job",
                desired.key,
                desired.backend.storage_type()
            );
            return ReconcileResult::Complete;
        };

        let key = desired.key.sibling(schema_job_name(desired.name()));
        info!("Reconciling schema job {}", key);

        let actual = match ctx.store.get::<Job>(&key).await {
            Ok(actual) => actual,
            Err(e) => {
                error!("Failed to get job {}: {}", key, e);
                return ReconcileResult::from_error(e.into(), policy);
            }
        };

        let Some(actual) = actual else {
            let job = match attach_owner(job, desired) {
                Ok(job) => job,
                Err(e) => return ReconcileResult::from_error(e, policy),
            };
            info!("Creating schema job {}", key);
            return match ctx.store.create(&job).await {
                Ok(_) | Err(StoreError::AlreadyExists(_)) => {
                    ReconcileResult::Requeue(policy.standard)
                }
                Err(e) => {
                    error!("Failed to create job {}: {}", key, e);
                    ReconcileResult::from_error(e.into(), policy)
                }
            };
        };

        match job::classify(&actual) {
            JobState::Pending | JobState::Running => {
                debug!("Schema job {} has not finished", key);
                ReconcileResult::Requeue(policy.short)
            }
            JobState::Succeeded => ReconcileResult::Complete,
            JobState::Failed => {
                warn!(
                    "Schema job {} failed: {}",
                    key,
                    job::failure_message(&actual).unwrap_or("no message")
                );
                match ctx.store.delete(&actual).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => {
                        ReconcileResult::Requeue(policy.standard)
                    }
                    Err(e) => {
                        error!("Failed to delete job {}: {}", key, e);
                        ReconcileResult::from_error(e.into(), policy)
                    }
                }
            }
        }
    }
}
