//! `Reaper` custom resource.
//!
//! This is the wire shape of the desired state. It is validated and turned
//! into a [`DesiredState`](crate::desired::DesiredState) before each cycle.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE: &str = "thelastpickle/cassandra-reaper:2.0.5";
pub const DEFAULT_KEYSPACE: &str = "reaper_db";

/// Reaper custom resource.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[kube(
    group = "reaper.cassandra-reaper.io",
    version = "v1alpha1",
    kind = "Reaper",
    status = "ReaperStatus",
    namespaced,
    printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ReaperSpec {
    /// Reaper server image
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default)]
    pub server_config: ServerConfig,
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

/// Server configuration rendered into `cassandra-reaper.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub storage_type: StorageType,

    /// Required when `storageType` is `cassandra`
    pub cassandra_backend: Option<CassandraBackend>,

    /// Secret holding `username` and `password` keys for JMX authentication
    pub jmx_user_secret_name: Option<String>,

    pub hanging_repair_timeout_mins: Option<i32>,
    pub repair_intensity: Option<String>,
    pub repair_parallelism: Option<String>,
    pub repair_run_thread_count: Option<i32>,
    pub schedule_days_between: Option<i32>,
    pub enable_cross_origin: Option<bool>,
    pub enable_dynamic_seed_list: Option<bool>,
    pub jmx_connection_timeout_in_seconds: Option<i32>,
    pub segment_count_per_node: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Memory,
    Cassandra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CassandraBackend {
    pub cluster_name: String,

    /// Service used as the contact point
    pub cassandra_service: String,

    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    pub replication: ReplicationConfig,
}

fn default_keyspace() -> String {
    DEFAULT_KEYSPACE.to_string()
}

/// Keyspace replication. Exactly one of the two fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationConfig {
    pub simple_strategy: Option<i32>,
    pub network_topology_strategy: Option<BTreeMap<String, i32>>,
}

/// Status reported back on the resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReaperStatus {
    pub ready: bool,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub updated_replicas: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn crd_names() {
        let crd = Reaper::crd();
        let names = &crd.spec.names;
        assert_eq!(names.kind, "Reaper");
        assert_eq!(names.plural, "reapers");
        assert_eq!(names.singular.as_deref(), Some("reaper"));
        assert!(names.short_names.as_ref().map_or(true, |s| s.is_empty()));
    }
}
