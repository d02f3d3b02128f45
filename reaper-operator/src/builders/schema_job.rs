//! Job creating the Reaper keyspace.

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec};

use super::child_meta;
use crate::desired::{CassandraStorage, DesiredState, StorageBackend};

pub fn schema_job_name(reaper_name: &str) -> String {
    format!("{}-schema", reaper_name)
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

/// Schema job for `desired`, `None` when the backend keeps no schema.
pub fn build_schema_job(desired: &DesiredState, image: &str) -> Option<Job> {
    match &desired.backend {
        StorageBackend::Memory => None,
        StorageBackend::Cassandra(storage) => Some(schema_job(desired, storage, image)),
    }
}

fn schema_job(desired: &DesiredState, storage: &CassandraStorage, image: &str) -> Job {
    let name = schema_job_name(desired.name());
    Job {
        metadata: child_meta(desired, name.clone()),
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    restart_policy: Some("OnFailure".to_string()),
                    containers: vec![Container {
                        name,
                        image: Some(image.to_string()),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        env: Some(vec![
                            env("KEYSPACE", storage.keyspace.as_str()),
                            env("CONTACT_POINTS", storage.contact_point.as_str()),
                            env("REPLICATION", storage.replication.to_string()),
                        ]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
