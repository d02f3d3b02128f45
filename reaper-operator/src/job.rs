//! Schema job monitor.

use k8s_openapi::api::batch::v1::Job;

/// Execution state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

fn has_true_condition(job: &Job, condition_type: &str) -> bool {
    job.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == condition_type && c.status == "True")
        })
}

/// Classify a job from its status conditions.
///
/// Failed wins over Complete if both are true.
pub fn classify(job: &Job) -> JobState {
    if has_true_condition(job, "Failed") {
        return JobState::Failed;
    }
    if has_true_condition(job, "Complete") {
        return JobState::Succeeded;
    }
    let active = job.status.as_ref().and_then(|s| s.active).unwrap_or(0);
    if active > 0 {
        JobState::Running
    } else {
        JobState::Pending
    }
}

/// Message of the true `Failed` condition, if any.
pub fn failure_message(job: &Job) -> Option<&str> {
    job.status
        .as_ref()?
        .conditions
        .as_ref()?
        .iter()
        .find(|c| c.type_ == "Failed" && c.status == "True")
        .and_then(|c| c.message.as_deref())
}
