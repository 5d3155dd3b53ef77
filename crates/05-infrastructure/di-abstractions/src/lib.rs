//! # Dependency Injection Abstractions
//! 
//! 依赖注入抽象层，定义约定式扫描、注册条目模型和容器边界的核心接口。
//! 
//! ## 核心接口
//! 
//! - [`TypeFilter`] - 类型过滤器接口
//! - [`MappingConvention`] - 映射约定接口
//! - [`RegistrationEntry`] / [`RegistrationPlan`] - 注册条目与注册计划
//! - [`Resolver`] - 组件解析接口
//! - [`NativeContainer`] - 底层容器注册接口

pub mod container;
pub mod factory;
pub mod filter;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use container::*;
pub use factory::*;
pub use filter::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
