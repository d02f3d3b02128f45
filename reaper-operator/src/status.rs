//! Status reporting on the Reaper resource.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::crd::{Reaper, ReaperStatus};
use crate::desired::ObjectKey;
use crate::store::{Result, StoreError};

/// Replica counts copied from the live deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaCounts {
    pub replicas: i32,
    pub ready: i32,
    pub available: i32,
    pub updated: i32,
}

impl From<&Deployment> for ReplicaCounts {
    fn from(deployment: &Deployment) -> Self {
        let status = deployment.status.clone().unwrap_or_default();
        Self {
            replicas: status.replicas.unwrap_or(0),
            ready: status.ready_replicas.unwrap_or(0),
            available: status.available_replicas.unwrap_or(0),
            updated: status.updated_replicas.unwrap_or(0),
        }
    }
}

fn reaper_status(ready: bool, counts: &ReplicaCounts) -> ReaperStatus {
    ReaperStatus {
        ready,
        replicas: counts.replicas,
        ready_replicas: counts.ready,
        available_replicas: counts.available,
        updated_replicas: counts.updated,
    }
}

/// Writes the reported status of a Reaper. Calls are idempotent.
#[async_trait]
pub trait StatusWriter: Send + Sync {
    async fn set_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()>;

    async fn set_not_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()>;
}

/// Patches the status subresource through the Kubernetes API.
#[derive(Clone)]
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn patch(&self, key: &ObjectKey, status: ReaperStatus) -> Result<()> {
        debug!("Patching status of reaper {}: ready={}", key, status.ready);
        let api: Api<Reaper> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = json!({ "status": status });
        api.patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &format!("Reaper {}", key)))
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn set_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()> {
        self.patch(key, reaper_status(true, counts)).await
    }

    async fn set_not_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()> {
        self.patch(key, reaper_status(false, counts)).await
    }
}

/// Keeps the last reported status per Reaper in memory.
#[derive(Default)]
pub struct StatusRecorder {
    statuses: Mutex<BTreeMap<ObjectKey, ReaperStatus>>,
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &ObjectKey) -> Option<ReaperStatus> {
        self.statuses.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl StatusWriter for StatusRecorder {
    async fn set_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()> {
        self.statuses
            .lock()
            .await
            .insert(key.clone(), reaper_status(true, counts));
        Ok(())
    }

    async fn set_not_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> Result<()> {
        self.statuses
            .lock()
            .await
            .insert(key.clone(), reaper_status(false, counts));
        Ok(())
    }
}
