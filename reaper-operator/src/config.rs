//! Operator configuration, built once at startup.

use crate::backoff::RetryPolicy;

pub const DEFAULT_SCHEMA_JOB_IMAGE: &str = "jsanda/create_keyspace:latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    pub retry: RetryPolicy,
    /// Image of the job that creates the Reaper keyspace.
    pub schema_job_image: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            schema_job_image: DEFAULT_SCHEMA_JOB_IMAGE.to_string(),
        }
    }
}
