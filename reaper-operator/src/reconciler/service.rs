//! Endpoint stage: the service in front of the Reaper deployment.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use tracing::info;

use super::{create_if_absent, Context, ReconcileResult, Reconciler, Stage};
use crate::builders::{build_service, service_name};
use crate::desired::DesiredState;
use crate::status::StatusWriter;
use crate::store::ObjectStore;

pub struct ServiceReconciler;

#[async_trait]
impl Reconciler for ServiceReconciler {
    fn stage(&self) -> Stage {
        Stage::Endpoint
    }

    async fn reconcile<S, W>(&self, ctx: &Context<S, W>, desired: &DesiredState) -> ReconcileResult
    where
        S: ObjectStore,
        W: StatusWriter,
    {
        let key = desired.key.sibling(service_name(desired.name()));
        info!("Reconciling service {}", key);

        create_if_absent::<Service, _, _, _>(ctx, desired, &key, || Ok(build_service(desired))).await
    }
}
