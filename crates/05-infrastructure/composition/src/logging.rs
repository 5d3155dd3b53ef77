//! 日志初始化

use infrastructure_common::{InfrastructureError, InfrastructureResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 日志配置
///
/// `filter` 使用 `tracing_subscriber::EnvFilter` 的指令语法，例如 `di_impl=debug,info`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub filter: String,
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// 同时输出源文件与行号
    pub show_location: bool,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_location: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境：注册层各 crate 输出调试日志，附带线程与源码位置
    pub fn development() -> Self {
        Self {
            filter: "infrastructure_common=debug,di_impl=debug,di_composition=debug,info"
                .to_string(),
            show_thread_ids: true,
            show_location: true,
            ..Self::default()
        }
    }

    /// 生产环境：JSON 输出，省略目标
    pub fn production() -> Self {
        Self {
            show_target: false,
            json_format: true,
            ..Self::default()
        }
    }

    /// 替换过滤指令
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// 安装全局 `tracing` 订阅者
///
/// 过滤指令无效，或进程内已有全局订阅者时返回 [`InfrastructureError::BootstrapFailed`]。
pub fn init_logging(config: &LoggingConfig) -> InfrastructureResult<()> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志过滤指令无效 '{}': {}", config.filter, e),
        })?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_location)
        .with_line_number(config.show_location);

    if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| InfrastructureError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    info!("日志系统初始化完成: {}", config.filter);
    Ok(())
}
