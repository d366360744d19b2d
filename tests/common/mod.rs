// Common test utilities for integration tests
//
// Provides webhook payload builders plus mock implementations of the
// container runtime and notification gateway seams.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use autopull::config::AppConfig;
use autopull::notifications::{DeliveryResult, NotificationGateway};
use autopull::runtime::{ContainerRuntime, RuntimeError};
use autopull::sync::SyncEngine;
use autopull::webhook::AppState;

/// Creates a registry push webhook payload
pub fn create_push_payload(repo_full_name: &str, tag: &str, region: &str) -> serde_json::Value {
    let namespace = repo_full_name.split('/').next().unwrap_or_default();
    let name = repo_full_name.rsplit('/').next().unwrap_or_default();

    serde_json::json!({
        "push_data": {
            "tag": tag,
            "digest": "sha256:abc123",
            "pushed_at": "2024-05-01 12:00:00"
        },
        "repository": {
            "repo_full_name": repo_full_name,
            "namespace": namespace,
            "name": name,
            "region": region
        }
    })
}

/// Container runtime double with scripted per-step failures. Every call is
/// recorded so tests can assert what was attempted.
#[derive(Default)]
pub struct MockRuntime {
    pub fail_login: bool,
    pub fail_pull: bool,
    pub fail_tag: bool,
    pub fail_remove: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockRuntime {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(command: &str) -> RuntimeError {
        RuntimeError::CommandFailed {
            command: command.to_string(),
            stderr: "simulated failure".to_string(),
        }
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn login(
        &self,
        registry: &str,
        _username: &str,
        _password: &str,
    ) -> Result<(), RuntimeError> {
        self.record(format!("login {}", registry));
        if self.fail_login {
            return Err(Self::failure("docker login"));
        }
        Ok(())
    }

    async fn pull(&self, reference: &str) -> Result<(), RuntimeError> {
        self.record(format!("pull {}", reference));
        if self.fail_pull {
            return Err(Self::failure("docker pull"));
        }
        Ok(())
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), RuntimeError> {
        self.record(format!("tag {} {}", source, target));
        if self.fail_tag {
            return Err(Self::failure("docker tag"));
        }
        Ok(())
    }

    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.record(format!("rmi {}", reference));
        if self.fail_remove {
            return Err(Self::failure("docker rmi"));
        }
        Ok(())
    }
}

/// Records every delivery instead of talking to the real gateway.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentNotification>>,
}

#[derive(Debug, Clone)]
pub struct SentNotification {
    pub nickname: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl RecordingGateway {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn notify(
        &self,
        nickname: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> DeliveryResult {
        self.sent.lock().unwrap().push(SentNotification {
            nickname: nickname.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            link: link.map(String::from),
        });
        DeliveryResult::delivered(200, serde_json::json!({"status": "sent"}))
    }
}

/// Assemble handler state over the mock seams.
pub fn app_state(
    config: AppConfig,
    runtime: Arc<MockRuntime>,
    gateway: Arc<RecordingGateway>,
) -> AppState {
    let sync_engine = Arc::new(SyncEngine::new(runtime, config.registry.clone()));
    AppState {
        config: Arc::new(config),
        sync_engine,
        gateway,
    }
}

/// Registry credentials present so the login step actually runs.
pub fn config_with_credentials() -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.host = "registry.example.com".to_string();
    config.registry.username = Some("robot".to_string());
    config.registry.password = Some("hunter2".to_string());
    config
}
