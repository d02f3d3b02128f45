//! Shared test utilities for reaper-operator integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::batch::v1::{Job, JobCondition, JobStatus};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use reaper_operator::builders::schema_job_name;
use reaper_operator::crd::{
    CassandraBackend, ReplicationConfig, ServerConfig, StorageType,
};
use reaper_operator::status::ReplicaCounts;
use reaper_operator::store::{self, Object};
use reaper_operator::{
    Cancellation, Context, Convergence, DesiredState, MemoryStore, ObjectKey, ObjectStore,
    OperatorConfig, Orchestrator, Reaper, ReaperSpec, StatusRecorder, StatusWriter, StoreError,
};

pub const NAMESPACE: &str = "reaper-test";
pub const NAME: &str = "test-reaper";
pub const IMAGE: &str = "test/reaper:latest";

pub fn reaper(server_config: ServerConfig) -> Reaper {
    let mut reaper = Reaper::new(
        NAME,
        ReaperSpec {
            image: IMAGE.to_string(),
            server_config,
        },
    );
    reaper.metadata.namespace = Some(NAMESPACE.to_string());
    reaper.metadata.uid = Some("4f0c2b5e-reaper".to_string());
    reaper
}

pub fn memory_reaper() -> Reaper {
    reaper(ServerConfig::default())
}

pub fn cassandra_reaper() -> Reaper {
    reaper(ServerConfig {
        storage_type: StorageType::Cassandra,
        cassandra_backend: Some(CassandraBackend {
            cluster_name: "cassandra".to_string(),
            cassandra_service: "cassandra-svc".to_string(),
            keyspace: "reaper_db".to_string(),
            replication: ReplicationConfig {
                network_topology_strategy: Some(BTreeMap::from([("DC1".to_string(), 3)])),
                ..Default::default()
            },
        }),
        ..Default::default()
    })
}

pub fn desired(reaper: &Reaper) -> DesiredState {
    DesiredState::from_reaper(reaper).expect("valid reaper")
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new(NAMESPACE, name)
}

pub fn jmx_secret(name: &str, keys: &[&str]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            namespace: Some(NAMESPACE.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        data: Some(
            keys.iter()
                .map(|k| (k.to_string(), ByteString(b"cassandra".to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// In-memory store whose calls can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_get: AtomicBool,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn get<K: Object>(&self, key: &ObjectKey) -> store::Result<Option<K>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        self.inner.get(key).await
    }

    async fn create<K: Object>(&self, obj: &K) -> store::Result<K> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict(store::key_of(obj)?.to_string()));
        }
        self.inner.create(obj).await
    }

    async fn update<K: Object>(&self, obj: &K) -> store::Result<K> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict(store::key_of(obj)?.to_string()));
        }
        self.inner.update(obj).await
    }

    async fn delete<K: Object>(&self, obj: &K) -> store::Result<()> {
        self.inner.delete(obj).await
    }
}

/// Status recorder whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStatus {
    pub inner: StatusRecorder,
    fail: AtomicBool,
}

impl FlakyStatus {
    fn check(&self, key: &ObjectKey) -> store::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict(format!("Reaper {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusWriter for FlakyStatus {
    async fn set_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> store::Result<()> {
        self.check(key)?;
        self.inner.set_ready(key, counts).await
    }

    async fn set_not_ready(&self, key: &ObjectKey, counts: &ReplicaCounts) -> store::Result<()> {
        self.check(key)?;
        self.inner.set_not_ready(key, counts).await
    }
}

/// Orchestrator over the in-memory store and status recorder.
pub struct TestOperator {
    pub orchestrator: Orchestrator<FlakyStore, FlakyStatus>,
    pub cancel: Cancellation,
}

impl TestOperator {
    pub fn new() -> Self {
        let ctx = Context::new(
            FlakyStore::default(),
            FlakyStatus::default(),
            OperatorConfig::default(),
        );
        Self {
            orchestrator: Orchestrator::new(ctx),
            cancel: Cancellation::new(),
        }
    }

    /// The backing store, bypassing injected failures.
    pub fn store(&self) -> &MemoryStore {
        &self.orchestrator.context().store.inner
    }

    pub fn status(&self) -> &StatusRecorder {
        &self.orchestrator.context().status.inner
    }

    pub fn fail_get(&self, fail: bool) {
        self.orchestrator.context().store.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.orchestrator.context().store.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.orchestrator.context().store.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status(&self, fail: bool) {
        self.orchestrator.context().status.fail.store(fail, Ordering::SeqCst);
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.orchestrator.context().config
    }

    pub async fn converge(&self, desired: &DesiredState) -> Convergence {
        self.orchestrator.converge(desired, &self.cancel).await
    }

    pub async fn job(&self) -> Option<Job> {
        self.store()
            .get::<Job>(&key(&schema_job_name(NAME)))
            .await
            .unwrap()
    }

    pub async fn deployment(&self) -> Option<Deployment> {
        self.store().get::<Deployment>(&key(NAME)).await.unwrap()
    }

    /// Set a true condition of `condition_type` on the schema job.
    pub async fn finish_job(&self, condition_type: &str) {
        let condition = JobCondition {
            type_: condition_type.to_string(),
            status: "True".to_string(),
            message: Some(format!("job {}", condition_type)),
            ..Default::default()
        };
        self.store()
            .modify::<Job, _>(&key(&schema_job_name(NAME)), move |job| {
                job.status = Some(JobStatus {
                    conditions: Some(vec![condition]),
                    ..Default::default()
                });
            })
            .await
            .unwrap();
    }

    /// Report `ready` ready replicas on the deployment.
    pub async fn set_ready_replicas(&self, ready: i32) {
        self.store()
            .modify::<Deployment, _>(&key(NAME), move |deployment| {
                deployment.status = Some(DeploymentStatus {
                    replicas: Some(1),
                    ready_replicas: Some(ready),
                    available_replicas: Some(ready),
                    updated_replicas: Some(1),
                    ..Default::default()
                });
            })
            .await
            .unwrap();
    }

    /// Drive `desired` through every stage until the deployment exists and
    /// reports ready.
    pub async fn converge_fully(&self, desired: &DesiredState) -> Convergence {
        for _ in 0..10 {
            let convergence = self.converge(desired).await;
            if convergence.result.is_complete() {
                return convergence;
            }
            if self.job().await.is_some() {
                self.finish_job("Complete").await;
            }
            if self.deployment().await.is_some() {
                self.set_ready_replicas(1).await;
            }
        }
        panic!("reaper did not converge");
    }
}
