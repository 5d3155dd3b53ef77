//! # 依赖注入具体实现
//! 
//! 提供约定式扫描、注册构建、计划应用和参考内存容器的具体实现
//!
//! ## 基本使用
//!
//! ```rust
//! use di_impl::{ContainerAdapter, FirstInterfaceConvention, InMemoryContainer, RegistryBuilder};
//! use di_abstractions::Resolver;
//! use infrastructure_common::{Module, TypeDescriptor, TypeRef};
//! use std::sync::Arc;
//!
//! struct FooService;
//!
//! let module = Module::new("doc-example").with_type(
//!     TypeDescriptor::class("App.FooService")
//!         .implements(TypeRef::named("App.IFooService"))
//!         .with_default_constructor(|| FooService),
//! );
//!
//! let mut builder = RegistryBuilder::new();
//! builder.scan(|scan| {
//!     scan.module(Arc::new(module)).with::<FirstInterfaceConvention>();
//! });
//!
//! let container = InMemoryContainer::new();
//! ContainerAdapter::apply(&container, builder.build()?)?;
//!
//! let foo = container.resolve(&TypeRef::named("App.IFooService"), None)?;
//! assert!(foo.is::<FooService>());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod builder;
pub mod container;
pub mod conventions;
pub mod filters;
pub mod plan;
pub mod scanner;

pub use adapter::{ApplyReport, ContainerAdapter};
pub use builder::{RegistrationExpression, RegistryBuilder};
pub use container::InMemoryContainer;
pub use conventions::{AddAllConvention, ExplicitInterfacesConvention, FirstInterfaceConvention};
pub use filters::{ExactTypeFilter, NamespaceFilter, PredicateFilter, TypeFilterSet};
pub use plan::{EntryMerger, MergeOutcome};
pub use scanner::{ModuleScanner, ScanExpression};
