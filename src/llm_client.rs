use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gemini::{GeminiRequest, GeminiResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The one upstream operation the gateway depends on.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(&self, request: GeminiRequest) -> Result<GeminiResponse>;
}

#[derive(Debug)]
pub struct LlmClient {
    http_client: Arc<reqwest::Client>,
    api_key: Option<String>,
    target_url: String,
}

impl LlmClient {
    pub fn new(http_client: Arc<reqwest::Client>, config: &Config, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|k| !k.is_empty()),
            target_url: Self::build_target_url(config),
        }
    }

    fn build_target_url(config: &Config) -> String {
        let path = format!("v1beta/models/{}:generateContent", config.model_id());
        let api_base = &config.api_base;
        if api_base.ends_with('/') { format!("{}{}", api_base, path) } else { format!("{}/{}", api_base, path) }
    }
}

#[async_trait]
impl GenerativeModel for LlmClient {
    async fn generate_content(&self, request: GeminiRequest) -> Result<GeminiResponse> {
        let Some(api_key) = &self.api_key else {
            return Err(GatewayError::Upstream("GEMINI_API_KEY is not set".to_string()));
        };

        info!("Forwarding request to: {}", self.target_url);
        debug!("request contents: {}", request.contents.len());

        let response = self
            .http_client
            .post(&self.target_url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Gemini request failed with status {}: {}", status, error_text);
            return Err(GatewayError::Upstream(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse Gemini response: {}", e);
            GatewayError::Upstream(format!("Failed to parse Gemini response: {}", e))
        })
    }
}
