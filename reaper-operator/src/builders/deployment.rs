//! Deployment running the Reaper server.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, HTTPGetAction, KeyToPath, PodSpec,
    PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::child_meta;
use super::config_map::{config_map_name, CONFIG_KEY};
use crate::credentials::JmxCredentials;
use crate::desired::{DesiredState, StorageBackend};
use crate::labels::{self, MANAGED_BY_LABEL, MANAGED_BY_LABEL_VALUE, REAPER_LABEL};

pub const REPLICAS: i32 = 1;
pub const APP_PORT: i32 = 8080;
pub const APP_PORT_NAME: &str = "app";
pub const ADMIN_PORT: i32 = 8081;
pub const ADMIN_PORT_NAME: &str = "admin";
pub const HEALTH_CHECK_PATH: &str = "/healthcheck";
pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 45;
pub const PROBE_PERIOD_SECONDS: i32 = 15;

const CONTAINER_NAME: &str = "reaper";
const CONFIG_VOLUME: &str = "reaper-config";
const CONFIG_MOUNT_PATH: &str = "/etc/cassandra-reaper";
const CONFIG_FILE: &str = "cassandra-reaper.yaml";

pub fn deployment_name(reaper_name: &str) -> String {
    reaper_name.to_string()
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn health_probe() -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(HEALTH_CHECK_PATH.to_string()),
            port: IntOrString::Int(ADMIN_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY_SECONDS),
        period_seconds: Some(PROBE_PERIOD_SECONDS),
        ..Default::default()
    }
}

fn selector(reaper_name: &str) -> LabelSelector {
    LabelSelector {
        match_expressions: Some(vec![
            LabelSelectorRequirement {
                key: MANAGED_BY_LABEL.to_string(),
                operator: "In".to_string(),
                values: Some(vec![MANAGED_BY_LABEL_VALUE.to_string()]),
            },
            LabelSelectorRequirement {
                key: REAPER_LABEL.to_string(),
                operator: "In".to_string(),
                values: Some(vec![reaper_name.to_string()]),
            },
        ]),
        match_labels: None,
    }
}

fn backend_env(desired: &DesiredState) -> Vec<EnvVar> {
    match &desired.backend {
        StorageBackend::Memory => Vec::new(),
        StorageBackend::Cassandra(storage) => vec![
            env("REAPER_STORAGE_TYPE", "cassandra"),
            env("REAPER_ENABLE_DYNAMIC_SEED_LIST", "false"),
            env(
                "REAPER_CASS_CONTACT_POINTS",
                format!("[{}]", storage.contact_point),
            ),
            env("REAPER_AUTH_ENABLED", "false"),
        ],
    }
}

/// Deployment for `desired`. `credentials` must be given when the Reaper
/// references a JMX secret.
pub fn build_deployment(desired: &DesiredState, credentials: Option<&JmxCredentials>) -> Deployment {
    let name = desired.name();
    let mut env_vars = backend_env(desired);
    if let Some(creds) = credentials {
        env_vars.push(creds.username.clone());
        env_vars.push(creds.password.clone());
    }

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(desired.image.clone()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        ports: Some(vec![
            ContainerPort {
                name: Some(APP_PORT_NAME.to_string()),
                container_port: APP_PORT,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            },
            ContainerPort {
                name: Some(ADMIN_PORT_NAME.to_string()),
                container_port: ADMIN_PORT,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            },
        ]),
        liveness_probe: Some(health_probe()),
        readiness_probe: Some(health_probe()),
        env: Some(env_vars),
        volume_mounts: Some(vec![VolumeMount {
            name: CONFIG_VOLUME.to_string(),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let config_volume = Volume {
        name: CONFIG_VOLUME.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(config_map_name(name)),
            items: Some(vec![KeyToPath {
                key: CONFIG_KEY.to_string(),
                path: CONFIG_FILE.to_string(),
                mode: None,
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    Deployment {
        metadata: child_meta(desired, deployment_name(name)),
        spec: Some(DeploymentSpec {
            replicas: Some(REPLICAS),
            selector: selector(name),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels::for_reaper(name)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    volumes: Some(vec![config_volume]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
