use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LoanFlowError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmRequest {
    #[serde(default)]
    pub system: Option<String>,
    pub user: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_temperature() -> f32 {
    0.2
}

impl LlmRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: default_temperature(),
            max_tokens: None,
            metadata: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;
}

pub type DynLlmClient = Arc<dyn LlmClient>;

#[derive(Clone, Debug)]
enum Scripted {
    Reply(String),
    Fail(String),
    Stall(Duration),
}

/// 按脚本依次返回响应的客户端，用于离线运行和测试。
///
/// 脚本耗尽后重复最后一条；收到的请求可通过 `requests()` 查看。
#[derive(Clone, Default)]
pub struct ScriptedLlmClient {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    last: Arc<Mutex<Option<Scripted>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(content: impl Into<String>) -> Self {
        Self::new().then_reply(content)
    }

    pub fn then_reply(self, content: impl Into<String>) -> Self {
        self.script.lock().push_back(Scripted::Reply(content.into()));
        self
    }

    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.script.lock().push_back(Scripted::Fail(reason.into()));
        self
    }

    /// 挂起指定时长后返回空响应
    pub fn then_stall(self, duration: Duration) -> Self {
        self.script.lock().push_back(Scripted::Stall(duration));
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    fn next_step(&self) -> Option<Scripted> {
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        match next {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request);
        match self.next_step() {
            Some(Scripted::Reply(content)) => Ok(LlmResponse {
                content,
                metadata: None,
            }),
            Some(Scripted::Fail(reason)) => Err(LoanFlowError::Llm(reason)),
            Some(Scripted::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(LlmResponse {
                    content: String::new(),
                    metadata: None,
                })
            }
            None => Err(LoanFlowError::Llm("scripted client has no responses".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_client_repeats_last_step() {
        let client = ScriptedLlmClient::replying("one").then_reply("two");
        let first = client.complete(LlmRequest::new("a")).await.unwrap();
        let second = client.complete(LlmRequest::new("b")).await.unwrap();
        let third = client.complete(LlmRequest::new("c")).await.unwrap();
        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert_eq!(third.content, "two");
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn empty_script_is_an_error() {
        let client = ScriptedLlmClient::new();
        assert!(client.complete(LlmRequest::new("a")).await.is_err());
    }
}
