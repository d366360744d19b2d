use super::{DeliveryResult, MeowConfig, NotificationGateway};
use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

/// MeoW push gateway client. Posts JSON to `{api_base}/{nickname}` so the
/// message body never needs URL encoding.
pub struct MeowNotifier {
    config: MeowConfig,
    client: Client,
}

impl MeowNotifier {
    pub fn new(config: MeowConfig) -> Result<Self> {
        if config.api_base.is_empty() {
            return Err(anyhow!("notification API base URL is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Gateway endpoint for a recipient; the nickname is percent-encoded
    /// as a path segment.
    fn endpoint(&self, nickname: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.config.api_base)
            .with_context(|| format!("Invalid notification API base: {}", self.config.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("notification API base cannot carry a path"))?
            .pop_if_empty()
            .push(nickname);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl NotificationGateway for MeowNotifier {
    async fn notify(
        &self,
        nickname: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> DeliveryResult {
        let title = if title.is_empty() {
            self.config.default_title.as_str()
        } else {
            title
        };

        let mut payload = json!({
            "title": title,
            "msg": message,
        });
        if let Some(link) = link.filter(|l| !l.is_empty()) {
            payload["url"] = json!(link);
        }

        let endpoint = match self.endpoint(nickname) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build notification endpoint: {}", e);
                return DeliveryResult::transport_failure(e.to_string());
            }
        };

        info!("Delivering notification for {} to {}", nickname, endpoint);
        debug!("Notification payload: {}", payload);

        let response = match self.client.post(endpoint).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Notification delivery failed: {}", e);
                return DeliveryResult::transport_failure(e.to_string());
            }
        };

        let http_status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        let resp = if is_json {
            match response.json::<Value>().await {
                Ok(body) => body,
                Err(e) => return DeliveryResult::transport_failure(e.to_string()),
            }
        } else {
            // Non-JSON gateway responses are wrapped rather than dropped.
            let text = response.text().await.unwrap_or_default();
            json!({ "text": text })
        };

        info!("Notification gateway answered {}", http_status);
        DeliveryResult::delivered(http_status, resp)
    }
}
