use crate::error::{LoanFlowError, Result};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证 URL 格式
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(LoanFlowError::Config("URL must not be empty".into()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(LoanFlowError::Config(format!(
                "URL `{url}` must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// 验证模型名称
    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(LoanFlowError::Config("model name must not be empty".into()));
        }

        let lower = model.to_lowercase();
        if lower.contains("gpt") && !lower.contains("gpt-") {
            tracing::warn!(
                model = %model,
                "Model name looks unusual; GPT models are usually named like 'gpt-4'"
            );
        }

        Ok(())
    }

    /// 验证温度参数
    pub fn validate_temperature(temperature: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LoanFlowError::Config(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }
        Ok(())
    }

    pub fn validate_timeout(seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(LoanFlowError::Config(
                "llm timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }
}
