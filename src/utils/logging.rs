use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// 支持通过环境变量配置：
    /// - RUST_LOG: 设置日志级别（error, warn, info, debug, trace）
    /// - LOANFLOW_DEBUG: 启用详细调试输出
    ///
    /// 重复调用不会 panic，后续调用被忽略。
    ///
    /// ```no_run
    /// use loanflow::utils::LoggingConfig;
    ///
    /// LoggingConfig::init();
    /// tracing::info!("ready");
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Self::default_directives(is_debug)));

        let fmt_layer = if is_debug {
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
        } else {
            fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
        };

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok();

        if installed && is_debug {
            tracing::debug!("Debug logging enabled");
        }
    }

    /// 未设置 RUST_LOG 时的过滤规则；状态转换与任务日志都在 info 级别
    fn default_directives(is_debug: bool) -> &'static str {
        if is_debug {
            "loanflow=debug,info"
        } else {
            "loanflow=info,warn"
        }
    }

    pub fn is_debug() -> bool {
        env::var("LOANFLOW_DEBUG").is_ok()
    }
}
