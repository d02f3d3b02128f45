//! Object store backed by the Kubernetes API.

use async_trait::async_trait;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

use super::{key_of, Object, ObjectStore, Result, StoreError};
use crate::desired::ObjectKey;

/// Store that reads and writes through a [`kube::Client`].
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: Object>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn describe<K: Object>(key: &ObjectKey) -> String {
    format!("{} {}", K::kind(&()), key)
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: Object>(&self, key: &ObjectKey) -> Result<Option<K>> {
        debug!("Getting {}", describe::<K>(key));
        self.api::<K>(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, &describe::<K>(key)))
    }

    async fn create<K: Object>(&self, obj: &K) -> Result<K> {
        let key = key_of(obj)?;
        debug!("Creating {}", describe::<K>(&key));
        self.api::<K>(&key.namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &describe::<K>(&key)))
    }

    async fn update<K: Object>(&self, obj: &K) -> Result<K> {
        let key = key_of(obj)?;
        debug!("Replacing {}", describe::<K>(&key));
        self.api::<K>(&key.namespace)
            .replace(&key.name, &PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &describe::<K>(&key)))
    }

    async fn delete<K: Object>(&self, obj: &K) -> Result<()> {
        let key = key_of(obj)?;
        debug!("Deleting {}", describe::<K>(&key));
        self.api::<K>(&key.namespace)
            .delete(&key.name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &describe::<K>(&key)))
    }
}
