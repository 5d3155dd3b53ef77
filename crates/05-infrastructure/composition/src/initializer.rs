//! 容器初始化入口
//!
//! 创建接入容器类型索引的构建器，执行配置闭包，组装计划并通过适配器应用到容器。

use crate::logging::{init_logging, LoggingConfig};
use di_abstractions::NativeContainer;
use di_impl::{ApplyReport, ContainerAdapter, RegistryBuilder};
use infrastructure_common::{InfrastructureResult, RegistryOptions};
use tracing::{info, warn};

/// 容器初始化器
#[derive(Debug, Clone, Default)]
pub struct ContainerInitializer {
    options: RegistryOptions,
    logging: Option<LoggingConfig>,
}

impl ContainerInitializer {
    /// 默认注册选项，不初始化日志
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置构建器选项
    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// 初始化前安装日志订阅者
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 配置并应用到容器
    ///
    /// 任何配置期错误都使初始化失败，容器保持不变。
    pub fn initialize<C, F>(&self, container: &C, configure: F) -> InfrastructureResult<ApplyReport>
    where
        C: NativeContainer + ?Sized,
        F: FnOnce(&mut RegistryBuilder),
    {
        if let Some(config) = &self.logging {
            // 订阅者只能安装一次，已安装时沿用现有的
            if let Err(e) = init_logging(config) {
                warn!("跳过日志初始化: {}", e);
            }
        }

        let mut builder = RegistryBuilder::new()
            .with_options(self.options.clone())
            .with_catalog(container.catalog());
        configure(&mut builder);

        let plan = builder.build()?;
        let report = ContainerAdapter::apply(container, plan)?;

        info!("容器初始化完成: 作用域 {}", container.scope().name);
        Ok(report)
    }
}

/// 在容器上直接初始化
pub trait ContainerInitializeExt {
    /// 使用默认选项初始化
    fn initialize<F>(&self, configure: F) -> InfrastructureResult<ApplyReport>
    where
        F: FnOnce(&mut RegistryBuilder);
}

impl<C> ContainerInitializeExt for C
where
    C: NativeContainer + ?Sized,
{
    fn initialize<F>(&self, configure: F) -> InfrastructureResult<ApplyReport>
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        ContainerInitializer::new().initialize(self, configure)
    }
}
