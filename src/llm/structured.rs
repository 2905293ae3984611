use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::client::{DynLlmClient, LlmRequest};

/// 结构化生成失败的原因
///
/// 调用方应将其视为可恢复错误，替换为"需人工复核"的默认结果。
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationFailure {
    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("text generation failed: {0}")]
    Upstream(String),
    #[error("could not parse structured output: {0}")]
    Unparsable(String),
}

/// 截取第一个 `{` 到最后一个 `}` 之间的内容
pub fn extract_json(response: &str) -> &str {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &response[start..=end],
        _ => response,
    }
}

/// 结构化输出服务
///
/// 把目标结构（字段名 → 示例值）附在系统提示后面，要求模型按该结构返回 JSON，
/// 再把响应解析为 `T`。
#[derive(Clone)]
pub struct StructuredOutput {
    client: DynLlmClient,
    timeout: Duration,
    temperature: f32,
}

impl StructuredOutput {
    pub fn new(client: DynLlmClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn generate<T>(
        &self,
        prompt: &str,
        system: &str,
        shape: &Value,
    ) -> Result<T, GenerationFailure>
    where
        T: DeserializeOwned,
    {
        let shape_text = serde_json::to_string_pretty(shape)
            .map_err(|e| GenerationFailure::Unparsable(e.to_string()))?;
        let request = LlmRequest::new(prompt)
            .with_system(format!(
                "{}\n\nPlease respond with a JSON object following this structure: {}",
                system.trim(),
                shape_text
            ))
            .with_temperature(self.temperature);

        let response = match tokio::time::timeout(self.timeout, self.client.complete(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(%err, "Structured generation failed");
                return Err(GenerationFailure::Upstream(err.to_string()));
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Structured generation timed out");
                return Err(GenerationFailure::Timeout(self.timeout));
            }
        };

        let candidate = extract_json(&response.content);
        serde_json::from_str::<T>(candidate).map_err(|err| {
            debug!(content = %response.content, "Unparsable structured output");
            GenerationFailure::Unparsable(err.to_string())
        })
    }
}
