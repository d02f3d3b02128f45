//! In-memory object store.
//!
//! Objects are kept as JSON, keyed by kind and namespaced name, with a
//! monotonically increasing resource version for conflict detection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{key_of, Object, ObjectStore, Result, StoreError};
use crate::desired::ObjectKey;

type Slot = (String, ObjectKey);

#[derive(Default)]
struct Inner {
    objects: BTreeMap<Slot, serde_json::Value>,
    revision: u64,
    writes: u64,
}

impl Inner {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }
}

/// In-memory store with the same semantics as the Kubernetes API for a
/// single key.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn slot<K: Object>(key: &ObjectKey) -> Slot {
    (K::kind(&()).into_owned(), key.clone())
}

fn describe(slot: &Slot) -> String {
    format!("{} {}", slot.0, slot.1)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create, update and delete calls that succeeded.
    pub async fn writes(&self) -> u64 {
        self.inner.lock().await.writes
    }

    /// Number of stored objects of kind `K`.
    pub async fn count<K: Object>(&self) -> usize {
        let kind = K::kind(&());
        self.inner
            .lock()
            .await
            .objects
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Change an object the way an outside actor would (a job controller
    /// updating status, a user editing labels). Not counted as a write.
    pub async fn modify<K, F>(&self, key: &ObjectKey, f: F) -> Result<K>
    where
        K: Object,
        F: FnOnce(&mut K) + Send,
    {
        let slot = slot::<K>(key);
        let mut inner = self.inner.lock().await;
        let value = inner
            .objects
            .get(&slot)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(describe(&slot)))?;
        let mut obj: K = serde_json::from_value(value)?;
        f(&mut obj);
        obj.meta_mut().resource_version = Some(inner.next_revision());
        inner.objects.insert(slot, serde_json::to_value(&obj)?);
        Ok(obj)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get<K: Object>(&self, key: &ObjectKey) -> Result<Option<K>> {
        let slot = slot::<K>(key);
        let inner = self.inner.lock().await;
        match inner.objects.get(&slot) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn create<K: Object>(&self, obj: &K) -> Result<K> {
        let slot = slot::<K>(&key_of(obj)?);
        let mut inner = self.inner.lock().await;
        if inner.objects.contains_key(&slot) {
            return Err(StoreError::AlreadyExists(describe(&slot)));
        }

        let mut stored = obj.clone();
        let meta = stored.meta_mut();
        meta.uid
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string());
        meta.resource_version = Some(inner.next_revision());

        debug!("Created {}", describe(&slot));
        inner.objects.insert(slot, serde_json::to_value(&stored)?);
        inner.writes += 1;
        Ok(stored)
    }

    async fn update<K: Object>(&self, obj: &K) -> Result<K> {
        let slot = slot::<K>(&key_of(obj)?);
        let mut inner = self.inner.lock().await;
        let current: K = match inner.objects.get(&slot) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => return Err(StoreError::NotFound(describe(&slot))),
        };

        let expected = obj.meta().resource_version.as_deref();
        let actual = current.meta().resource_version.as_deref();
        if expected.is_some() && expected != actual {
            return Err(StoreError::Conflict(describe(&slot)));
        }

        let mut stored = obj.clone();
        let meta = stored.meta_mut();
        meta.uid = current.meta().uid.clone();
        meta.resource_version = Some(inner.next_revision());

        debug!("Updated {}", describe(&slot));
        inner.objects.insert(slot, serde_json::to_value(&stored)?);
        inner.writes += 1;
        Ok(stored)
    }

    async fn delete<K: Object>(&self, obj: &K) -> Result<()> {
        let slot = slot::<K>(&key_of(obj)?);
        let mut inner = self.inner.lock().await;
        if inner.objects.remove(&slot).is_none() {
            return Err(StoreError::NotFound(describe(&slot)));
        }
        debug!("Deleted {}", describe(&slot));
        inner.writes += 1;
        Ok(())
    }
}
