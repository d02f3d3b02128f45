//! reaper-operator: Kubernetes operator for Cassandra Reaper.
//!
//! Watches `Reaper` resources and converges each one into a config map, a
//! service, a schema job and a deployment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use kube::{Client, CustomResourceExt};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reaper_operator::builders::{
    build_config_map, build_deployment, build_schema_job, build_service,
};
use reaper_operator::config::DEFAULT_SCHEMA_JOB_IMAGE;
use reaper_operator::credentials::JmxCredentials;
use reaper_operator::hash::add_hash_annotation;
use reaper_operator::{controller, DesiredState, OperatorConfig, Reaper, RetryPolicy};

/// Cassandra Reaper operator
#[derive(Parser, Debug)]
#[command(name = "reaper-operator", version, about)]
struct Args {
    /// Namespace to watch (all namespaces if not set)
    #[arg(long)]
    namespace: Option<String>,

    /// Delay in seconds while waiting on a job or a freshly created object
    #[arg(long, default_value = "5")]
    short_requeue_secs: u64,

    /// Delay in seconds after a create, update or delete
    #[arg(long, default_value = "10")]
    requeue_secs: u64,

    /// Delay in seconds after a transient error
    #[arg(long, default_value = "10")]
    retry_secs: u64,

    /// Image of the job that creates the Reaper keyspace
    #[arg(long, default_value = DEFAULT_SCHEMA_JOB_IMAGE)]
    schema_job_image: String,

    /// Print the Reaper CRD as YAML and exit
    #[arg(long)]
    print_crd: bool,

    /// Print the child objects for the Reaper in FILE as YAML and exit
    #[arg(long, value_name = "FILE")]
    render: Option<PathBuf>,
}

impl Args {
    fn operator_config(&self) -> OperatorConfig {
        OperatorConfig {
            retry: RetryPolicy {
                short: Duration::from_secs(self.short_requeue_secs),
                standard: Duration::from_secs(self.requeue_secs),
                transient: Duration::from_secs(self.retry_secs),
            },
            schema_job_image: self.schema_job_image.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reaper_operator=info,kube=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.operator_config();

    if args.print_crd {
        print!("{}", serde_yaml::to_string(&Reaper::crd())?);
        return Ok(());
    }

    if let Some(path) = &args.render {
        return render(path, args.namespace.as_deref(), &config);
    }

    info!("Starting reaper-operator");
    info!("Retry policy: {:?}", config.retry);

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    controller::run(client, args.namespace, config).await;

    Ok(())
}

/// Print the objects the operator would create for a Reaper manifest.
fn render(path: &Path, namespace: Option<&str>, config: &OperatorConfig) -> Result<()> {
    let manifest = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut reaper: Reaper = serde_yaml::from_str(&manifest)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if reaper.metadata.namespace.is_none() {
        reaper.metadata.namespace = Some(namespace.unwrap_or("default").to_string());
    }

    let desired = DesiredState::from_reaper(&reaper)?;
    let credentials = desired
        .jmx_user_secret
        .as_deref()
        .map(JmxCredentials::referencing);

    let mut docs = vec![
        serde_yaml::to_string(&build_config_map(&desired)?)?,
        serde_yaml::to_string(&build_service(&desired))?,
    ];
    if let Some(job) = build_schema_job(&desired, &config.schema_job_image) {
        docs.push(serde_yaml::to_string(&job)?);
    }
    let mut deployment = build_deployment(&desired, credentials.as_ref());
    add_hash_annotation(&mut deployment)?;
    docs.push(serde_yaml::to_string(&deployment)?);

    print!("{}", docs.join("---\n"));
    Ok(())
}
