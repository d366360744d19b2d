use serde::Serialize;

mod meow;

pub use meow::MeowNotifier;

/// Outcome of one delivery attempt. Transport failures are data, not
/// errors: `http_status` 0 plus an error string, never a fault.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(http_status: u16, resp: serde_json::Value) -> Self {
        Self {
            http_status,
            resp: Some(resp),
            error: None,
        }
    }

    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self {
            http_status: 0,
            resp: None,
            error: Some(error.into()),
        }
    }
}

/// Push-notification gateway configuration.
#[derive(Debug, Clone)]
pub struct MeowConfig {
    /// Default recipient nickname; must already exist on the gateway.
    pub nickname: String,
    pub api_base: String,
    pub default_title: String,
    pub default_jump_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for MeowConfig {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            api_base: "https://api.chuckfang.com".to_string(),
            default_title: "MeoW".to_string(),
            default_jump_url: None,
            timeout_seconds: 10,
        }
    }
}

impl MeowConfig {
    /// Load gateway configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            nickname: std::env::var("MEOW_NICKNAME").unwrap_or(defaults.nickname),
            api_base: std::env::var("MEOW_API_BASE").unwrap_or(defaults.api_base),
            default_title: std::env::var("DEFAULT_TITLE").unwrap_or(defaults.default_title),
            default_jump_url: std::env::var("DEFAULT_JUMP_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout_seconds: std::env::var("NOTIFY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        }
    }
}

/// External collaborator boundary: accepts (recipient, title, message,
/// link) and reports a delivery outcome. Never mutated by the core.
#[async_trait::async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(
        &self,
        nickname: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> DeliveryResult;
}
