//! Object store abstraction.
//!
//! Stages only talk to the cluster through [`ObjectStore`], so the same
//! convergence code runs against the Kubernetes API and the in-memory store
//! used by tests.

pub mod error;
pub mod kubernetes;
pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::desired::ObjectKey;

pub use error::{Result, StoreError};
pub use kubernetes::KubeStore;
pub use memory::MemoryStore;

/// Namespaced object kinds the store can handle.
pub trait Object:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> Object for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Key of a stored object, taken from its metadata.
pub fn key_of<K: Object>(obj: &K) -> Result<ObjectKey> {
    let namespace = obj
        .namespace()
        .ok_or_else(|| StoreError::Invalid(format!("{} without namespace", K::kind(&()))))?;
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or_else(|| StoreError::Invalid(format!("{} without name", K::kind(&()))))?;
    Ok(ObjectKey::new(namespace, name))
}

/// Strongly consistent, per-key object store with optimistic concurrency.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object, `None` if absent.
    async fn get<K: Object>(&self, key: &ObjectKey) -> Result<Option<K>>;

    /// Create an object. Fails with [`StoreError::AlreadyExists`] if present.
    async fn create<K: Object>(&self, obj: &K) -> Result<K>;

    /// Replace an object. Fails with [`StoreError::Conflict`] when the
    /// resource version is stale.
    async fn update<K: Object>(&self, obj: &K) -> Result<K>;

    /// Delete an object. Fails with [`StoreError::NotFound`] if absent.
    async fn delete<K: Object>(&self, obj: &K) -> Result<()>;
}
