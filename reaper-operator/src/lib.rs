//! reaper-operator: converges `Reaper` resources into the child objects a
//! Cassandra Reaper server needs.
//!
//! A convergence cycle runs four stages in a fixed order:
//! - config map with the rendered server configuration
//! - service exposing the web port
//! - schema job creating the keyspace (cassandra backend only)
//! - deployment running the server, with drift detection by content hash

pub mod backoff;
pub mod builders;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod crd;
pub mod desired;
pub mod error;
pub mod hash;
pub mod job;
pub mod labels;
pub mod orchestrator;
pub mod owner;
pub mod reconciler;
pub mod status;
pub mod store;

pub use backoff::{FailureClass, RetryPolicy};
pub use config::OperatorConfig;
pub use crd::{Reaper, ReaperSpec, ReaperStatus};
pub use desired::{DesiredState, ObjectKey, ReplicationTopology, StorageBackend};
pub use error::{ConfigError, Error};
pub use orchestrator::{Cancellation, Convergence, Orchestrator};
pub use reconciler::{Context, ReconcileResult, Stage};
pub use status::{StatusRecorder, StatusWriter};
pub use store::{MemoryStore, ObjectStore, StoreError};
