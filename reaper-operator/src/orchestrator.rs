//! Convergence orchestrator.
//!
//! Runs the stages in [`Stage::ORDER`] and stops at the first stage that
//! has not converged, so a later stage never runs before the ones it
//! depends on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info_span, warn, Instrument};

use crate::desired::DesiredState;
use crate::error::Error;
use crate::reconciler::{
    ConfigMapReconciler, Context, DeploymentReconciler, ReconcileResult, Reconciler,
    SchemaReconciler, ServiceReconciler, Stage,
};
use crate::status::StatusWriter;
use crate::store::ObjectStore;

/// Cooperative cancellation flag, checked before each stage.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of one convergence cycle and the stage that produced it.
#[derive(Debug)]
pub struct Convergence {
    pub stage: Stage,
    pub result: ReconcileResult,
}

pub struct Orchestrator<S, W> {
    ctx: Context<S, W>,
}

impl<S, W> Orchestrator<S, W>
where
    S: ObjectStore,
    W: StatusWriter,
{
    pub fn new(ctx: Context<S, W>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context<S, W> {
        &self.ctx
    }

    /// Run one convergence cycle for `desired`.
    pub async fn converge(&self, desired: &DesiredState, cancel: &Cancellation) -> Convergence {
        let span = info_span!("converge", reaper = %desired.key);
        self.run(desired, cancel).instrument(span).await
    }

    async fn run(&self, desired: &DesiredState, cancel: &Cancellation) -> Convergence {
        let mut last = Convergence {
            stage: Stage::Config,
            result: ReconcileResult::Complete,
        };

        for stage in Stage::ORDER {
            if cancel.is_cancelled() {
                warn!("Convergence cancelled before stage {}", stage);
                return Convergence {
                    stage,
                    result: ReconcileResult::from_error(Error::Cancelled, self.ctx.policy()),
                };
            }

            let result = self.run_stage(stage, desired).await;
            let done = result.is_complete();
            last = Convergence { stage, result };
            if !done {
                break;
            }
        }
        last
    }

    async fn run_stage(&self, stage: Stage, desired: &DesiredState) -> ReconcileResult {
        match stage {
            Stage::Config => self.reconcile_with(&ConfigMapReconciler, desired).await,
            Stage::Endpoint => self.reconcile_with(&ServiceReconciler, desired).await,
            Stage::SchemaJob => self.reconcile_with(&SchemaReconciler, desired).await,
            Stage::Workload => self.reconcile_with(&DeploymentReconciler, desired).await,
        }
    }

    async fn reconcile_with<R: Reconciler>(
        &self,
        reconciler: &R,
        desired: &DesiredState,
    ) -> ReconcileResult {
        let result = reconciler.reconcile(&self.ctx, desired).await;
        debug!("Stage {} finished: {:?}", reconciler.stage(), result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures;
    use crate::status::StatusRecorder;
    use crate::store::MemoryStore;
    use crate::OperatorConfig;

    #[test]
    fn reconcilers_report_their_stage() {
        assert_eq!(ConfigMapReconciler.stage(), Stage::Config);
        assert_eq!(ServiceReconciler.stage(), Stage::Endpoint);
        assert_eq!(SchemaReconciler.stage(), Stage::SchemaJob);
        assert_eq!(DeploymentReconciler.stage(), Stage::Workload);
    }

    #[tokio::test]
    async fn memory_backend_never_blocks_on_schema() {
        let orchestrator = Orchestrator::new(Context::new(
            MemoryStore::new(),
            StatusRecorder::new(),
            OperatorConfig::default(),
        ));
        let desired = fixtures::memory();

        let result = orchestrator
            .reconcile_with(&SchemaReconciler, &desired)
            .await;
        assert!(result.is_complete());
    }
}
