//! # 注册组合层
//!
//! 把可复用的注册单元组合进一次容器初始化，并提供日志初始化。
//!
//! ## 主要功能
//!
//! - **注册单元**: [`Registry`] 封装一组注册，通过 [`RegistryBuilderExt::add_registry`] 组合
//! - **初始化入口**: [`ContainerInitializer`] 与 [`ContainerInitializeExt::initialize`]
//! - **日志初始化**: [`LoggingConfig`] 与 [`init_logging`]
//!
//! ## 基本使用
//!
//! ```rust
//! use di_composition::{ContainerInitializeExt, Registry, RegistryBuilderExt};
//! use di_abstractions::Resolver;
//! use di_impl::{InMemoryContainer, RegistryBuilder};
//! use infrastructure_common::{Module, TypeDescriptor, TypeRef};
//! use std::sync::Arc;
//!
//! struct FooService;
//!
//! #[derive(Default)]
//! struct FooRegistry;
//!
//! impl Registry for FooRegistry {
//!     fn configure(&self, registry: &mut RegistryBuilder) {
//!         registry.register("App.IFooService", "App.FooService");
//!     }
//! }
//!
//! let container = InMemoryContainer::new().with_module(Arc::new(
//!     Module::new("app").with_type(
//!         TypeDescriptor::class("App.FooService")
//!             .implements(TypeRef::named("App.IFooService"))
//!             .with_default_constructor(|| FooService),
//!     ),
//! ));
//!
//! container.initialize(|x| {
//!     x.add_registry::<FooRegistry>();
//! })?;
//!
//! assert!(container.resolve(&TypeRef::named("App.IFooService"), None)?.is::<FooService>());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod initializer;
pub mod logging;
pub mod registry;

pub use initializer::{ContainerInitializeExt, ContainerInitializer};
pub use logging::{init_logging, LoggingConfig};
pub use registry::{Registry, RegistryBuilderExt};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
