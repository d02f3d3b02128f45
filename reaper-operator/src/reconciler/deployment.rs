//! Workload stage: the deployment running the Reaper server.
//!
//! The desired deployment carries a fingerprint annotation. A live object
//! with the same fingerprint is only checked for readiness; otherwise the
//! mutable parts of the desired spec are merged onto it.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, error, info};

use super::{Context, ReconcileResult, Reconciler, Stage};
use crate::builders::{build_deployment, deployment_name, REPLICAS};
use crate::credentials::{resolve_jmx_credentials, JmxCredentials};
use crate::desired::DesiredState;
use crate::error::Error;
use crate::hash::{add_hash_annotation, same_hash};
use crate::labels;
use crate::owner::attach_owner;
use crate::status::{ReplicaCounts, StatusWriter};
use crate::store::{ObjectStore, StoreError};

pub struct DeploymentReconciler;

impl DeploymentReconciler {
    /// Desired deployment with credentials resolved and fingerprint set.
    async fn desired_deployment<S: ObjectStore>(
        store: &S,
        desired: &DesiredState,
    ) -> Result<Deployment, Error> {
        let credentials: Option<JmxCredentials> = match &desired.jmx_user_secret {
            Some(secret) => Some(resolve_jmx_credentials(store, desired.namespace(), secret).await?),
            None => None,
        };

        let mut deployment = build_deployment(desired, credentials.as_ref());
        add_hash_annotation(&mut deployment)?;
        Ok(deployment)
    }
}

#[async_trait]
impl Reconciler for DeploymentReconciler {
    fn stage(&self) -> Stage {
        Stage::Workload
    }

    async fn reconcile<S, W>(&self, ctx: &Context<S, W>, desired: &DesiredState) -> ReconcileResult
    where
        S: ObjectStore,
        W: StatusWriter,
    {
        let policy = ctx.policy();
        let key = desired.key.sibling(deployment_name(desired.name()));
        info!("Reconciling deployment {}", key);

        let wanted = match Self::desired_deployment(&ctx.store, desired).await {
            Ok(deployment) => deployment,
            Err(e) => {
                error!("Failed to build deployment {}: {}", key, e);
                return ReconcileResult::from_error(e, policy);
            }
        };

        let live = match ctx.store.get::<Deployment>(&key).await {
            Ok(live) => live,
            Err(e) => {
                error!("Failed to get deployment {}: {}", key, e);
                return ReconcileResult::from_error(e.into(), policy);
            }
        };

        let Some(live) = live else {
            let wanted = match attach_owner(wanted, desired) {
                Ok(deployment) => deployment,
                Err(e) => return ReconcileResult::from_error(e, policy),
            };
            info!("Creating deployment {}", key);
            return match ctx.store.create(&wanted).await {
                Ok(_) | Err(StoreError::AlreadyExists(_)) => {
                    ReconcileResult::Requeue(policy.standard)
                }
                Err(e) => {
                    error!("Failed to create deployment {}: {}", key, e);
                    ReconcileResult::from_error(e.into(), policy)
                }
            };
        };

        if !same_hash(&wanted, &live) {
            info!("Updating deployment {}", key);
            let updated = merge_into_live(live, wanted);
            return match ctx.store.update(&updated).await {
                Ok(_) => ReconcileResult::Requeue(policy.standard),
                Err(e) => {
                    error!("Failed to update deployment {}: {}", key, e);
                    ReconcileResult::from_error(e.into(), policy)
                }
            };
        }

        let counts = ReplicaCounts::from(&live);
        if counts.ready == REPLICAS {
            match ctx.status.set_ready(&desired.key, &counts).await {
                Ok(()) => ReconcileResult::Complete,
                Err(e) => {
                    error!("Failed to update status of reaper {}: {}", desired.key, e);
                    ReconcileResult::from_error(e.into(), policy)
                }
            }
        } else {
            debug!(
                "Deployment {} not ready: {}/{} replicas",
                key, counts.ready, REPLICAS
            );
            match ctx.status.set_not_ready(&desired.key, &counts).await {
                Ok(()) => ReconcileResult::Requeue(policy.standard),
                Err(e) => {
                    error!("Failed to update status of reaper {}: {}", desired.key, e);
                    ReconcileResult::from_error(e.into(), policy)
                }
            }
        }
    }
}

/// Apply the mutable parts of `wanted` to `live`.
///
/// Labels and annotations are merged with the desired values winning. The
/// selector is immutable and stays as it is.
pub fn merge_into_live(mut live: Deployment, wanted: Deployment) -> Deployment {
    let meta = &mut live.metadata;
    meta.labels = Some(labels::merge(
        meta.labels.as_ref(),
        wanted.metadata.labels.as_ref(),
    ));
    meta.annotations = Some(labels::merge(
        meta.annotations.as_ref(),
        wanted.metadata.annotations.as_ref(),
    ));

    let Some(wanted_spec) = wanted.spec else {
        return live;
    };
    let spec = live.spec.get_or_insert_with(Default::default);

    let wanted_template_meta = wanted_spec.template.metadata.unwrap_or_default();
    let template_meta = spec.template.metadata.get_or_insert_with(Default::default);
    template_meta.labels = wanted_template_meta.labels;
    template_meta.annotations = wanted_template_meta.annotations;

    if let Some(wanted_pod) = wanted_spec.template.spec {
        let pod = spec.template.spec.get_or_insert_with(Default::default);
        pod.containers = wanted_pod.containers;
        pod.volumes = wanted_pod.volumes;
    }

    spec.strategy = wanted_spec.strategy;
    spec.revision_history_limit = wanted_spec.revision_history_limit;
    spec.paused = wanted_spec.paused;
    spec.progress_deadline_seconds = wanted_spec.progress_deadline_seconds;
    spec.min_ready_seconds = wanted_spec.min_ready_seconds;
    live
}
