use std::env;
use std::str::FromStr;

use crate::error::{LoanFlowError, Result};

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 解析密钥值
    ///
    /// 优先级：
    /// 1. `${VAR_NAME}` 形式时读取对应环境变量
    /// 2. 空字符串时读取 `default_env_var`
    /// 3. 否则原样返回
    pub fn resolve_secret(value: &str, default_env_var: &str) -> Result<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let env_var_name = &value[2..value.len() - 1];
            Self::get_env(env_var_name)
        } else if value.is_empty() {
            Self::get_env(default_env_var)
        } else {
            Ok(value.to_string())
        }
    }

    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            LoanFlowError::Config(format!("environment variable `{key}` is not set"))
        })
    }

    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    /// 读取并解析可选的环境变量，格式错误时报错
    pub fn get_parsed<T>(key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::get_env_optional(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|err| {
                LoanFlowError::Config(format!("invalid value `{raw}` for `{key}`: {err}"))
            }),
        }
    }

    pub fn is_debug_mode() -> bool {
        env::var("LOANFLOW_DEBUG").is_ok()
    }
}
