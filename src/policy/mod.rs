use crate::models::PushEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Admission policy: which push events warrant a local sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// When set, only events from this namespace proceed.
    pub allow_namespace: Option<String>,
    /// Sentinel tag the registry uses for its internal build cache.
    pub ignore_tag: String,
}

/// Exactly one of the variants applies; a skip always carries its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Proceed,
    Skip { reason: String },
}

impl AdmissionDecision {
    pub fn proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Proceed => None,
            Self::Skip { reason } => Some(reason),
        }
    }
}

impl AdmissionPolicy {
    /// Decide whether an event should trigger a sync. Pure and total:
    /// rules are evaluated in order, first match wins.
    pub fn admit(&self, event: &PushEvent) -> AdmissionDecision {
        if event.repo_full_name.is_empty() {
            debug!("Skipping event without a repository name");
            return AdmissionDecision::Skip {
                reason: "empty repo_full".to_string(),
            };
        }

        if event.tag == self.ignore_tag {
            debug!("Skipping build-cache tag {}", event.tag);
            return AdmissionDecision::Skip {
                reason: format!("ignored tag {}", self.ignore_tag),
            };
        }

        if let Some(allowed) = self.allow_namespace.as_deref()
            && !allowed.is_empty()
            && event.namespace != allowed
        {
            debug!(
                "Skipping event from namespace {} (allowed: {})",
                event.namespace, allowed
            );
            return AdmissionDecision::Skip {
                reason: format!("namespace not allowed: {}", event.namespace),
            };
        }

        AdmissionDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(repo_full_name: &str, namespace: &str, tag: &str) -> PushEvent {
        PushEvent {
            repo_full_name: repo_full_name.to_string(),
            namespace: namespace.to_string(),
            image_name: repo_full_name
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            tag: tag.to_string(),
            digest: String::new(),
            region: String::new(),
            pushed_at: String::new(),
            raw_fallback: None,
        }
    }

    fn policy(allow_namespace: Option<&str>) -> AdmissionPolicy {
        AdmissionPolicy {
            allow_namespace: allow_namespace.map(String::from),
            ignore_tag: "cache".to_string(),
        }
    }

    #[test]
    fn test_empty_repo_always_skips() {
        let decision = policy(None).admit(&event("", "team-a", "v1"));
        assert_eq!(decision.skip_reason(), Some("empty repo_full"));

        // Same outcome regardless of the namespace filter
        let decision = policy(Some("team-a")).admit(&event("", "team-a", "v1"));
        assert_eq!(decision.skip_reason(), Some("empty repo_full"));
    }

    #[test]
    fn test_ignored_tag_skips() {
        let decision = policy(None).admit(&event("team-a/app", "team-a", "cache"));
        assert_eq!(decision.skip_reason(), Some("ignored tag cache"));
    }

    #[test]
    fn test_namespace_filter() {
        let decision = policy(Some("team-a")).admit(&event("team-b/app", "team-b", "v1"));
        assert_eq!(
            decision.skip_reason(),
            Some("namespace not allowed: team-b")
        );

        let decision = policy(Some("team-a")).admit(&event("team-a/app", "team-a", "v1"));
        assert!(decision.proceed());
    }

    #[test]
    fn test_unset_or_empty_filter_admits_any_namespace() {
        let event = event("team-b/app", "team-b", "v1");
        assert!(policy(None).admit(&event).proceed());
        assert!(policy(Some("")).admit(&event).proceed());
    }

    #[test]
    fn test_rule_order_repo_before_tag() {
        // An empty repo with the ignored tag reports the repo reason.
        let decision = policy(None).admit(&event("", "", "cache"));
        assert_eq!(decision.skip_reason(), Some("empty repo_full"));
    }
}
