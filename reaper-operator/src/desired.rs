//! Desired state for one convergence cycle.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

use crate::crd::{CassandraBackend, ReplicationConfig, Reaper, ServerConfig, StorageType};
use crate::error::ConfigError;

/// Namespaced name of an object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a sibling object in the same namespace.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Keyspace replication topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationTopology {
    /// One replication factor for the whole cluster.
    Simple(i32),
    /// Replication factor per datacenter.
    PerZone(BTreeMap<String, i32>),
}

impl TryFrom<&ReplicationConfig> for ReplicationTopology {
    type Error = ConfigError;

    fn try_from(config: &ReplicationConfig) -> Result<Self, Self::Error> {
        match (config.simple_strategy, &config.network_topology_strategy) {
            (Some(factor), None) => Ok(ReplicationTopology::Simple(factor)),
            (None, Some(zones)) if !zones.is_empty() => {
                Ok(ReplicationTopology::PerZone(zones.clone()))
            }
            _ => Err(ConfigError::InvalidReplication),
        }
    }
}

/// Renders the CQL replication map, e.g.
/// `{'class': 'SimpleStrategy', 'replication_factor': 3}`.
impl fmt::Display for ReplicationTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationTopology::Simple(factor) => write!(
                f,
                "{{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                factor
            ),
            ReplicationTopology::PerZone(zones) => {
                let dcs: Vec<String> = zones
                    .iter()
                    .map(|(zone, factor)| format!("'{}': {}", zone, factor))
                    .collect();
                write!(
                    f,
                    "{{'class': 'NetworkTopologyStrategy', {}}}",
                    dcs.join(", ")
                )
            }
        }
    }
}

/// Cassandra storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassandraStorage {
    pub cluster_name: String,
    /// Contact point address (a service name).
    pub contact_point: String,
    pub keyspace: String,
    pub replication: ReplicationTopology,
}

impl TryFrom<&CassandraBackend> for CassandraStorage {
    type Error = ConfigError;

    fn try_from(backend: &CassandraBackend) -> Result<Self, Self::Error> {
        Ok(Self {
            cluster_name: backend.cluster_name.clone(),
            contact_point: backend.cassandra_service.clone(),
            keyspace: backend.keyspace.clone(),
            replication: ReplicationTopology::try_from(&backend.replication)?,
        })
    }
}

/// Storage backend of the Reaper server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Cassandra(CassandraStorage),
}

impl StorageBackend {
    pub fn storage_type(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Cassandra(_) => "cassandra",
        }
    }
}

/// Repair tuning with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub hanging_repair_timeout_mins: i32,
    pub repair_intensity: String,
    pub repair_parallelism: String,
    pub repair_run_thread_count: i32,
    pub schedule_days_between: i32,
    pub enable_cross_origin: bool,
    pub enable_dynamic_seed_list: bool,
    pub jmx_connection_timeout_in_seconds: i32,
    pub segment_count_per_node: i32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            hanging_repair_timeout_mins: 30,
            repair_intensity: "0.9".to_string(),
            repair_parallelism: "DATACENTER_AWARE".to_string(),
            repair_run_thread_count: 15,
            schedule_days_between: 7,
            enable_cross_origin: true,
            enable_dynamic_seed_list: false,
            jmx_connection_timeout_in_seconds: 20,
            segment_count_per_node: 16,
        }
    }
}

impl From<&ServerConfig> for ServerSettings {
    fn from(config: &ServerConfig) -> Self {
        let defaults = ServerSettings::default();
        Self {
            hanging_repair_timeout_mins: config
                .hanging_repair_timeout_mins
                .unwrap_or(defaults.hanging_repair_timeout_mins),
            repair_intensity: config
                .repair_intensity
                .clone()
                .unwrap_or(defaults.repair_intensity),
            repair_parallelism: config
                .repair_parallelism
                .clone()
                .unwrap_or(defaults.repair_parallelism),
            repair_run_thread_count: config
                .repair_run_thread_count
                .unwrap_or(defaults.repair_run_thread_count),
            schedule_days_between: config
                .schedule_days_between
                .unwrap_or(defaults.schedule_days_between),
            enable_cross_origin: config
                .enable_cross_origin
                .unwrap_or(defaults.enable_cross_origin),
            enable_dynamic_seed_list: config
                .enable_dynamic_seed_list
                .unwrap_or(defaults.enable_dynamic_seed_list),
            jmx_connection_timeout_in_seconds: config
                .jmx_connection_timeout_in_seconds
                .unwrap_or(defaults.jmx_connection_timeout_in_seconds),
            segment_count_per_node: config
                .segment_count_per_node
                .unwrap_or(defaults.segment_count_per_node),
        }
    }
}

/// Immutable snapshot of a `Reaper` for one convergence cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
    pub key: ObjectKey,
    pub image: String,
    pub settings: ServerSettings,
    pub backend: StorageBackend,
    /// Name of the secret with JMX credentials.
    pub jmx_user_secret: Option<String>,
    /// Controller reference pointing at the parent, absent until the parent has a uid.
    pub owner: Option<OwnerReference>,
}

impl DesiredState {
    pub fn from_reaper(reaper: &Reaper) -> Result<Self, ConfigError> {
        let namespace = reaper.namespace().ok_or(ConfigError::MissingNamespace)?;
        let key = ObjectKey::new(namespace, reaper.name_any());
        let server = &reaper.spec.server_config;

        let backend = match server.storage_type {
            StorageType::Memory => StorageBackend::Memory,
            StorageType::Cassandra => {
                let backend = server
                    .cassandra_backend
                    .as_ref()
                    .ok_or(ConfigError::MissingBackend)?;
                StorageBackend::Cassandra(CassandraStorage::try_from(backend)?)
            }
        };

        Ok(Self {
            key,
            image: reaper.spec.image.clone(),
            settings: ServerSettings::from(server),
            backend,
            jmx_user_secret: server
                .jmx_user_secret_name
                .clone()
                .filter(|name| !name.is_empty()),
            owner: reaper.controller_owner_ref(&()),
        })
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }
}
