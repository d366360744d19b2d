use crate::models::{PushEvent, SyncResult};
use crate::notifications::MeowConfig;
use crate::policy::AdmissionDecision;

/// User-facing status derived from one processed event. Formatting only;
/// delivery belongs to the notification gateway.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub headline: String,
    pub body: String,
    pub link: String,
}

/// Map the admission decision and sync outcome to a status message.
///
/// The headline is keyed on the pull step alone: a successful pull with a
/// failed retag still reads as succeeded. The step list in the webhook
/// response stays the accurate record.
pub fn build_status(
    decision: &AdmissionDecision,
    result: Option<&SyncResult>,
    event: &PushEvent,
    notifier: &MeowConfig,
) -> StatusMessage {
    let headline = if !decision.proceed() {
        "image build complete (auto-pull not triggered)".to_string()
    } else if result.map(SyncResult::pull_succeeded).unwrap_or(false) {
        "image build complete, auto-pull succeeded".to_string()
    } else {
        "image build complete, auto-pull did not succeed".to_string()
    };

    let mut lines = Vec::new();
    push_line(&mut lines, "Repository", &event.repo_full_name);
    push_line(&mut lines, "Region", &event.region);
    push_line(&mut lines, "Tag", &event.tag);
    push_line(&mut lines, "Digest", &event.digest);
    push_line(&mut lines, "Pushed at", &event.pushed_at);
    push_line(&mut lines, "Status", &headline);

    let body = if lines.is_empty() {
        headline.clone()
    } else {
        lines.join("\n")
    };

    let link = notifier
        .default_jump_url
        .clone()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| event.repo_full_name.clone());

    StatusMessage {
        headline,
        body,
        link,
    }
}

fn push_line(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("{}: {}", label, value));
    }
}
