//! Binding of the orchestrator to the kube controller runtime.
//!
//! The runtime watches Reaper resources and their children and serializes
//! reconciles per Reaper. Each reconcile runs one convergence cycle.

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::Reaper;
use crate::desired::DesiredState;
use crate::error::Error;
use crate::orchestrator::{Cancellation, Convergence, Orchestrator};
use crate::reconciler::{Context, ReconcileResult};
use crate::status::KubeStatusWriter;
use crate::store::KubeStore;

type KubeOrchestrator = Orchestrator<KubeStore, KubeStatusWriter>;

struct Data {
    orchestrator: KubeOrchestrator,
    cancel: Cancellation,
}

fn api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + std::fmt::Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Watch Reaper resources until a shutdown signal arrives.
///
/// With `namespace` set, only that namespace is watched.
pub async fn run(client: Client, namespace: Option<String>, config: OperatorConfig) {
    let ns = namespace.as_deref();
    let cancel = Cancellation::new();
    let ctx = Context::new(
        KubeStore::new(client.clone()),
        KubeStatusWriter::new(client.clone()),
        config,
    );
    let data = Arc::new(Data {
        orchestrator: Orchestrator::new(ctx),
        cancel: cancel.clone(),
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT, cancelling running convergence cycles");
            cancel.cancel();
        }
    });

    info!(
        "Watching reapers in {}",
        ns.map(|n| format!("namespace {}", n))
            .unwrap_or_else(|| "all namespaces".to_string())
    );

    let children = watcher::Config::default();
    Controller::new(api::<Reaper>(&client, ns), watcher::Config::default())
        .owns(api::<ConfigMap>(&client, ns), children.clone())
        .owns(api::<Service>(&client, ns), children.clone())
        .owns(api::<Job>(&client, ns), children.clone())
        .owns(api::<Deployment>(&client, ns), children)
        .shutdown_on_signal()
        .run(reconcile, error_policy, data)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!("Reconciled {}: {:?}", obj, action),
                Err(e) => warn!("Reconcile failed: {}", e),
            }
        })
        .await;

    info!("Controller stopped");
}

async fn reconcile(reaper: Arc<Reaper>, data: Arc<Data>) -> Result<Action, Error> {
    let desired = match DesiredState::from_reaper(&reaper) {
        Ok(desired) => desired,
        Err(e) => {
            error!(
                "Invalid reaper {}/{}: {}",
                reaper.metadata.namespace.as_deref().unwrap_or_default(),
                reaper.metadata.name.as_deref().unwrap_or_default(),
                e
            );
            return Ok(Action::await_change());
        }
    };

    let convergence = data.orchestrator.converge(&desired, &data.cancel).await;
    action_for(&desired, convergence)
}

/// Map a convergence result to a controller action.
///
/// Retryable errors are returned so [`error_policy`] schedules the retry.
fn action_for(desired: &DesiredState, convergence: Convergence) -> Result<Action, Error> {
    let Convergence { stage, result } = convergence;
    match result {
        ReconcileResult::Complete => {
            info!("Reaper {} converged", desired.key);
            Ok(Action::await_change())
        }
        ReconcileResult::Requeue(after) => {
            debug!("Reaper {} waiting on stage {}", desired.key, stage);
            Ok(Action::requeue(after))
        }
        ReconcileResult::Retry { error, .. } => Err(error),
        ReconcileResult::Fatal(e) => {
            error!(
                "Reaper {} failed in stage {} and needs a configuration change: {}",
                desired.key, stage, e
            );
            Ok(Action::await_change())
        }
    }
}

fn error_policy(_reaper: Arc<Reaper>, error: &Error, data: Arc<Data>) -> Action {
    let policy = data.orchestrator.context().policy();
    match policy.delay_for(error.class()) {
        Some(after) => {
            warn!("Retrying in {:?}: {}", after, error);
            Action::requeue(after)
        }
        None => Action::await_change(),
    }
}
