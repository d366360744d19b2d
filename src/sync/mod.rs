use crate::config::RegistryConfig;
use crate::models::{PushEvent, SyncResult, SyncStep, SyncStepKind};
use crate::runtime::ContainerRuntime;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes the login/pull/tag/cleanup sequence against the local container
/// runtime. Every runtime failure is captured as step data; this engine
/// never returns an error.
pub struct SyncEngine {
    runtime: Arc<dyn ContainerRuntime>,
    registry: RegistryConfig,
}

impl SyncEngine {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, registry: RegistryConfig) -> Self {
        Self { runtime, registry }
    }

    /// Remote-qualified pull target. An empty registry host means an
    /// unprefixed, hub-style reference.
    fn remote_ref(&self, event: &PushEvent) -> String {
        if self.registry.host.is_empty() {
            format!("{}:{}", event.repo_full_name, event.tag)
        } else {
            format!(
                "{}/{}:{}",
                self.registry.host, event.repo_full_name, event.tag
            )
        }
    }

    /// Stable local alias: override > configured name > event image name,
    /// always pinned to the configured local tag.
    fn local_ref(&self, event: &PushEvent, local_image_override: Option<&str>) -> String {
        let local_image = local_image_override
            .filter(|name| !name.is_empty())
            .or(self.registry.local_image.as_deref())
            .unwrap_or(&event.image_name);
        format!("{}:{}", local_image, self.registry.local_tag)
    }

    /// Run the four-step sync for an admitted event.
    ///
    /// Steps are appended in execution order regardless of outcome. A
    /// failed required step halts the remaining ones; the removal of the
    /// remote-qualified tag is housekeeping and never halts.
    pub async fn sync(&self, event: &PushEvent, local_image_override: Option<&str>) -> SyncResult {
        let remote_ref = self.remote_ref(event);
        let local_ref = self.local_ref(event, local_image_override);

        info!("Syncing {} -> {}", remote_ref, local_ref);

        let mut steps = Vec::new();

        // Step 1: login. No credentials configured means rely on whatever
        // session the runtime already holds.
        match (
            self.registry.username.as_deref(),
            self.registry.password.as_deref(),
        ) {
            (Some(username), Some(password)) => {
                match self
                    .runtime
                    .login(&self.registry.host, username, password)
                    .await
                {
                    Ok(()) => {
                        let host = if self.registry.host.is_empty() {
                            "registry"
                        } else {
                            self.registry.host.as_str()
                        };
                        steps.push(SyncStep::ok(
                            SyncStepKind::Login,
                            format!("authenticated to {}", host),
                        ));
                    }
                    Err(e) => {
                        warn!("Registry login failed: {}", e);
                        steps.push(SyncStep::failed(SyncStepKind::Login, e.to_string()));
                        return SyncResult {
                            steps,
                            remote_ref,
                            local_ref,
                            terminated_early: true,
                        };
                    }
                }
            }
            _ => {
                steps.push(SyncStep::skipped(
                    SyncStepKind::Login,
                    "relying on existing session",
                ));
            }
        }

        // Step 2: pull the exact remote artifact named by the event.
        if let Err(e) = self.runtime.pull(&remote_ref).await {
            warn!("Pull of {} failed: {}", remote_ref, e);
            steps.push(SyncStep::failed(SyncStepKind::Pull, e.to_string()));
            return SyncResult {
                steps,
                remote_ref,
                local_ref,
                terminated_early: true,
            };
        }
        steps.push(SyncStep::ok(
            SyncStepKind::Pull,
            format!("pulled {}", remote_ref),
        ));

        // Step 3: apply the stable local alias.
        if let Err(e) = self.runtime.tag(&remote_ref, &local_ref).await {
            warn!("Tagging {} as {} failed: {}", remote_ref, local_ref, e);
            steps.push(SyncStep::failed(SyncStepKind::Tag, e.to_string()));

            // Fire-and-forget cleanup of the now-orphaned remote reference;
            // its outcome is discarded.
            if let Err(cleanup) = self.runtime.remove_image(&remote_ref).await {
                debug!("Cleanup of {} failed: {}", remote_ref, cleanup);
            }

            return SyncResult {
                steps,
                remote_ref,
                local_ref,
                terminated_early: true,
            };
        }
        steps.push(SyncStep::ok(
            SyncStepKind::Tag,
            format!("tagged {}", local_ref),
        ));

        // Step 4: drop the registry-qualified tag, keeping only the alias.
        // The sync is already functionally complete; a failure here is
        // recorded but does not terminate anything.
        match self.runtime.remove_image(&remote_ref).await {
            Ok(()) => steps.push(SyncStep::ok(
                SyncStepKind::Remove,
                format!("removed {}", remote_ref),
            )),
            Err(e) => {
                warn!("Removing {} failed: {}", remote_ref, e);
                steps.push(SyncStep::failed(SyncStepKind::Remove, e.to_string()));
            }
        }

        SyncResult {
            steps,
            remote_ref,
            local_ref,
            terminated_early: false,
        }
    }
}
