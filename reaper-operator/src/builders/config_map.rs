//! Config map holding `cassandra-reaper.yaml`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use serde::Serialize;

use super::child_meta;
use crate::desired::{DesiredState, StorageBackend};

/// Key of the rendered config in the config map.
pub const CONFIG_KEY: &str = "reaper.yaml";

pub fn config_map_name(reaper_name: &str) -> String {
    reaper_name.to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument<'a> {
    segment_count_per_node: i32,
    repair_parallelism: &'a str,
    repair_intensity: &'a str,
    schedule_days_between: i32,
    repair_run_thread_count: i32,
    hanging_repair_timeout_mins: i32,
    storage_type: &'a str,
    enable_cross_origin: bool,
    enable_dynamic_seed_list: bool,
    jmx_connection_timeout_in_seconds: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cassandra: Option<CassandraDocument<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CassandraDocument<'a> {
    cluster_name: &'a str,
    contact_points: Vec<&'a str>,
    keyspace: &'a str,
}

/// Render the server configuration as YAML.
pub fn render_config(desired: &DesiredState) -> Result<String, serde_yaml::Error> {
    let settings = &desired.settings;
    let cassandra = match &desired.backend {
        StorageBackend::Memory => None,
        StorageBackend::Cassandra(storage) => Some(CassandraDocument {
            cluster_name: &storage.cluster_name,
            contact_points: vec![storage.contact_point.as_str()],
            keyspace: &storage.keyspace,
        }),
    };

    serde_yaml::to_string(&ConfigDocument {
        segment_count_per_node: settings.segment_count_per_node,
        repair_parallelism: &settings.repair_parallelism,
        repair_intensity: &settings.repair_intensity,
        schedule_days_between: settings.schedule_days_between,
        repair_run_thread_count: settings.repair_run_thread_count,
        hanging_repair_timeout_mins: settings.hanging_repair_timeout_mins,
        storage_type: desired.backend.storage_type(),
        enable_cross_origin: settings.enable_cross_origin,
        enable_dynamic_seed_list: settings.enable_dynamic_seed_list,
        jmx_connection_timeout_in_seconds: settings.jmx_connection_timeout_in_seconds,
        cassandra,
    })
}

pub fn build_config_map(desired: &DesiredState) -> Result<ConfigMap, serde_yaml::Error> {
    Ok(ConfigMap {
        metadata: child_meta(desired, config_map_name(desired.name())),
        data: Some(BTreeMap::from([(
            CONFIG_KEY.to_string(),
            render_config(desired)?,
        )])),
        ..Default::default()
    })
}
