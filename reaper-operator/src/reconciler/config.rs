//! Config stage: the config map holding the rendered server configuration.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use tracing::info;

use super::{create_if_absent, Context, ReconcileResult, Reconciler, Stage};
use crate::builders::{build_config_map, config_map_name};
use crate::desired::DesiredState;
use crate::status::StatusWriter;
use crate::store::ObjectStore;

pub struct ConfigMapReconciler;

#[async_trait]
impl Reconciler for ConfigMapReconciler {
    fn stage(&self) -> Stage {
        Stage::Config
    }

    async fn reconcile<S, W>(&self, ctx: &Context<S, W>, desired: &DesiredState) -> ReconcileResult
    where
        S: ObjectStore,
        W: StatusWriter,
    {
        let key = desired.key.sibling(config_map_name(desired.name()));
        info!("Reconciling config map {}", key);

        create_if_absent::<ConfigMap, _, _, _>(ctx, desired, &key, || {
            Ok(build_config_map(desired)?)
        })
        .await
    }
}
