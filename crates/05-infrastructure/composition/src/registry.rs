//! 可复用的注册单元

use di_impl::RegistryBuilder;
use tracing::debug;

/// 注册单元
///
/// 把一组注册、扫描和类型级配置封装为可复用的类型，多个注册单元可以组合进同一次初始化。
///
/// ```rust
/// use di_composition::{Registry, RegistryBuilderExt};
/// use di_impl::RegistryBuilder;
///
/// #[derive(Default)]
/// struct FooRegistry;
///
/// impl Registry for FooRegistry {
///     fn configure(&self, registry: &mut RegistryBuilder) {
///         registry.register("App.IFooService", "App.FooService");
///     }
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_registry::<FooRegistry>();
/// assert_eq!(builder.entries().len(), 1);
/// ```
pub trait Registry {
    fn configure(&self, registry: &mut RegistryBuilder);
}

impl<F> Registry for F
where
    F: Fn(&mut RegistryBuilder),
{
    fn configure(&self, registry: &mut RegistryBuilder) {
        self(registry)
    }
}

/// 在构建器上组合注册单元
pub trait RegistryBuilderExt {
    /// 创建并应用注册单元
    fn add_registry<R>(&mut self) -> &mut Self
    where
        R: Registry + Default;

    /// 应用已有的注册单元
    fn add_registry_instance<R>(&mut self, registry: &R) -> &mut Self
    where
        R: Registry + ?Sized;
}

impl RegistryBuilderExt for RegistryBuilder {
    fn add_registry<R>(&mut self) -> &mut Self
    where
        R: Registry + Default,
    {
        self.add_registry_instance(&R::default())
    }

    fn add_registry_instance<R>(&mut self, registry: &R) -> &mut Self
    where
        R: Registry + ?Sized,
    {
        debug!("应用注册单元: {}", std::any::type_name::<R>());
        registry.configure(self);
        self
    }
}
