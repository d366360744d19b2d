use serde::Serialize;

/// The four steps of the local image sync procedure, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStepKind {
    Login,
    Pull,
    Tag,
    Remove,
}

impl SyncStepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Pull => "pull",
            Self::Tag => "tag",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    Failed,
    Skipped,
}

/// One executed (or skipped) step. `detail` carries the runtime's own
/// explanation verbatim on failure.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStep {
    pub step: SyncStepKind,
    pub outcome: StepOutcome,
    pub detail: String,
}

impl SyncStep {
    pub fn ok(step: SyncStepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Ok,
            detail: detail.into(),
        }
    }

    pub fn failed(step: SyncStepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failed,
            detail: detail.into(),
        }
    }

    pub fn skipped(step: SyncStepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Skipped,
            detail: detail.into(),
        }
    }
}

/// Outcome of one sync invocation. `steps` is the audit trail: appended in
/// execution order, never reordered. `terminated_early` means a required
/// step failed and the remaining steps were not attempted.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub steps: Vec<SyncStep>,
    pub remote_ref: String,
    pub local_ref: String,
    pub terminated_early: bool,
}

impl SyncResult {
    /// Find a step by kind, if it was reached.
    pub fn step(&self, kind: SyncStepKind) -> Option<&SyncStep> {
        self.steps.iter().find(|s| s.step == kind)
    }

    /// The user-facing success signal is keyed on the pull step alone.
    pub fn pull_succeeded(&self) -> bool {
        self.step(SyncStepKind::Pull)
            .map(|s| s.outcome == StepOutcome::Ok)
            .unwrap_or(false)
    }
}
