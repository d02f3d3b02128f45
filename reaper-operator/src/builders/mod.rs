//! Builders for the child objects of a Reaper.
//!
//! Every builder is a pure function of the [`DesiredState`](crate::desired::DesiredState):
//! no I/O, same input, same output.

pub mod config_map;
pub mod deployment;
pub mod schema_job;
pub mod service;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::desired::DesiredState;
use crate::labels;

pub use config_map::{build_config_map, config_map_name, CONFIG_KEY};
pub use deployment::{build_deployment, deployment_name, REPLICAS};
pub use schema_job::{build_schema_job, schema_job_name};
pub use service::{build_service, service_name};

/// Metadata for a child named `name` in the parent's namespace.
fn child_meta(desired: &DesiredState, name: String) -> ObjectMeta {
    ObjectMeta {
        namespace: Some(desired.namespace().to_string()),
        name: Some(name),
        labels: Some(labels::for_reaper(desired.name())),
        ..Default::default()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use crate::desired::{
        CassandraStorage, DesiredState, ObjectKey, ReplicationTopology, ServerSettings,
        StorageBackend,
    };

    pub fn memory() -> DesiredState {
        DesiredState {
            key: ObjectKey::new("reaper-test", "test-reaper"),
            image: "test/reaper:latest".to_string(),
            settings: ServerSettings::default(),
            backend: StorageBackend::Memory,
            jmx_user_secret: None,
            owner: None,
        }
    }

    pub fn cassandra() -> DesiredState {
        DesiredState {
            backend: StorageBackend::Cassandra(CassandraStorage {
                cluster_name: "cassandra".to_string(),
                contact_point: "cassandra-svc".to_string(),
                keyspace: "reaper_db".to_string(),
                replication: ReplicationTopology::PerZone(BTreeMap::from([(
                    "DC1".to_string(),
                    3,
                )])),
            }),
            ..memory()
        }
    }
}
