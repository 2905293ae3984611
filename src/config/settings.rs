use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env::EnvConfig;
use crate::error::{LoanFlowError, Result};
use crate::utils::ConfigValidator;

pub const ENV_MODEL: &str = "LOANFLOW_MODEL";
pub const ENV_TEMPERATURE: &str = "LOANFLOW_TEMPERATURE";
pub const ENV_LLM_TIMEOUT: &str = "LOANFLOW_LLM_TIMEOUT_SECS";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

/// 运行配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoanFlowConfig {
    pub model: String,
    pub temperature: f32,
    pub llm_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LoanFlowConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.2,
            llm_timeout_secs: 30,
            api_key: None,
            base_url: None,
        }
    }
}

impl LoanFlowConfig {
    /// 默认值之上叠加环境变量
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(model) = EnvConfig::get_env_optional(ENV_MODEL) {
            config.model = model;
        }
        if let Some(temperature) = EnvConfig::get_parsed::<f32>(ENV_TEMPERATURE)? {
            config.temperature = temperature;
        }
        if let Some(timeout) = EnvConfig::get_parsed::<u64>(ENV_LLM_TIMEOUT)? {
            config.llm_timeout_secs = timeout;
        }
        config.api_key = EnvConfig::get_env_optional(ENV_API_KEY);
        config.base_url = EnvConfig::get_env_optional(ENV_BASE_URL);
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载；`api_key` 支持 `${VAR}` 占位
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            LoanFlowError::Config(format!("failed to read `{}`: {err}", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&raw)?;
        if let Some(api_key) = config.api_key.take() {
            config.api_key = Some(EnvConfig::resolve_secret(&api_key, ENV_API_KEY)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_model_name(&self.model)?;
        ConfigValidator::validate_temperature(self.temperature as f64)?;
        ConfigValidator::validate_timeout(self.llm_timeout_secs)?;
        if let Some(url) = &self.base_url {
            ConfigValidator::validate_url(url)?;
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
