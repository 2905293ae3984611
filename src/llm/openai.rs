use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::client::{LlmClient, LlmRequest, LlmResponse};
use crate::config::LoanFlowConfig;
use crate::error::{LoanFlowError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI 兼容的 chat completions 客户端
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// 缺少 `api_key` 时返回配置错误；未设置 `base_url` 时使用官方地址
    pub fn from_config(config: &LoanFlowConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LoanFlowError::Config("api_key is required for the OpenAI client".into()))?;
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    fn chat_body(&self, request: &LlmRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.user }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.chat_body(&request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LoanFlowError::Llm(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoanFlowError::Llm(format!(
                "OpenAI request failed with status {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LoanFlowError::Llm(e.to_string()))?;
        let content = payload["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| LoanFlowError::Llm("missing message content".into()))?;

        Ok(LlmResponse {
            content: content.to_string(),
            metadata: Some(payload),
        })
    }
}
