//! # Infrastructure Common
//!
//! 这个 crate 提供了约定式注册层的公共类型。
//!
//! ## 核心类型
//!
//! - [`TypeRef`] - 类型引用，区分开放/封闭泛型
//! - [`TypeDescriptor`] - 宿主反射设施提供的只读类型信息
//! - [`Instance`] - 容器创建的类型擦除实例
//! - [`Lifetime`] - 组件生命周期
//! - [`TypeModule`] / [`TypeCatalog`] - 模块与类型索引
//!
//! ## 设计原则
//!
//! - 类型元数据以数据建模，不依赖运行时反射对象
//! - 配置期错误与解析期错误分离
//! - 约定优于配置

pub mod component;
pub mod configuration;
pub mod discovery;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use discovery::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
