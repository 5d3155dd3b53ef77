//! 错误类型定义

use thiserror::Error;

/// 注册名称的显示形式
fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<默认>")
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("依赖解析失败: {type_name} (名称: {}), 原因: {reason}", display_name(.name))]
    ResolutionFailed {
        type_name: String,
        name: Option<String>,
        reason: String,
    },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("构造函数选择不明确: {type_name} 存在多个 {arity} 参数的构造函数")]
    AmbiguousConstructor { type_name: String, arity: usize },

    #[error("类型没有可用的构造函数: {type_name}")]
    NoConstructor { type_name: String },

    #[error("构造参数类型不符: {type_name} 第 {index} 个参数, 期望 {expected}")]
    ArgumentMismatch {
        type_name: String,
        index: usize,
        expected: String,
    },
}

impl DependencyError {
    /// 创建解析失败错误
    pub fn resolution_failed(
        type_name: impl Into<String>,
        name: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ResolutionFailed {
            type_name: type_name.into(),
            name: name.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: message.into(),
        }
    }
}

/// 注册配置错误类型
///
/// 全部在配置阶段产生，任何一个都会使整个应用过程失败。
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(
        "注册冲突: {abstraction} (名称: {}) 已由 {existing} 注册, 另一次扫描又映射到 {conflicting}",
        display_name(.name)
    )]
    AmbiguousRegistration {
        abstraction: String,
        name: Option<String>,
        existing: String,
        conflicting: String,
    },

    #[error("未找到构造函数: {type_name} {signature}")]
    ConstructorNotFound { type_name: String, signature: String },

    #[error("约定输出无效: {convention} 产生了 {abstraction} -> {implementation}, 原因: {reason}")]
    InvalidConventionOutput {
        convention: String,
        abstraction: String,
        implementation: String,
        reason: String,
    },

    #[error("类型未知: {type_name}")]
    UnknownType { type_name: String },

    #[error("未找到包含类型 {type_name} 的模块")]
    ModuleNotFound { type_name: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("注册错误: {source}")]
    RegistrationError {
        #[from]
        source: RegistrationError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
/// 注册阶段结果类型
pub type RegistrationResult<T> = Result<T, RegistrationError>;
/// 组合层结果类型
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
