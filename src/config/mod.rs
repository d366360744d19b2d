use crate::notifications::MeowConfig;
use crate::policy::AdmissionPolicy;
use crate::runtime::RuntimeConfig;
use std::time::Duration;
use tracing::debug;

/// Process configuration, built once at startup and passed explicitly into
/// the components that need it. Nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub registry: RegistryConfig,
    pub admission: AdmissionPolicy,
    pub runtime: RuntimeConfig,
    pub notifier: MeowConfig,
    /// Shared secret for all endpoints that accept one; unset disables the
    /// check.
    pub webhook_secret: Option<String>,
}

/// Registry and local-alias settings for the sync engine.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry host prefixed onto the remote reference; empty means a
    /// hub-style unprefixed reference.
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Stable local image name; defaults to the event's image name.
    pub local_image: Option<String>,
    /// Tag applied to the local alias.
    pub local_tag: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: None,
            password: None,
            local_image: None,
            local_tag: "latest".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:12082".to_string(),
            registry: RegistryConfig::default(),
            admission: AdmissionPolicy {
                allow_namespace: None,
                ignore_tag: "cache".to_string(),
            },
            runtime: RuntimeConfig::default(),
            notifier: MeowConfig::default(),
            webhook_secret: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_addr: env_string("BIND_ADDR", &defaults.bind_addr),
            registry: RegistryConfig {
                host: env_string("REGISTRY_HOST", ""),
                username: env_optional("REGISTRY_USERNAME"),
                password: env_optional("REGISTRY_PASSWORD"),
                local_image: env_optional("LOCAL_IMAGE_NAME"),
                local_tag: env_string("LOCAL_TAG", "latest"),
            },
            admission: AdmissionPolicy {
                allow_namespace: env_optional("ALLOW_NAMESPACE"),
                ignore_tag: env_string("IGNORE_TAG", "cache"),
            },
            runtime: RuntimeConfig {
                binary: env_string("DOCKER_BIN", "docker"),
                pull_timeout: Duration::from_secs(env_u64("PULL_TIMEOUT_SECS", 600)),
                command_timeout: Duration::from_secs(env_u64("COMMAND_TIMEOUT_SECS", 60)),
            },
            notifier: MeowConfig::from_env(),
            webhook_secret: env_optional("WEBHOOK_SECRET"),
        };

        debug!("Loaded configuration: {:?}", config);
        config
    }
}

// Helper functions for parsing environment values
fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
