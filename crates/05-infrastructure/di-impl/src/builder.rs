//! 注册构建器
//!
//! 累积显式注册、扫描结果和类型级配置，`build()` 时按覆盖规则组装为 [`RegistrationPlan`]。

use crate::plan::{assemble, TypeConfiguration};
use crate::scanner::{ModuleScanner, ScanExpression};
use di_abstractions::{
    factory_fn, instance_factory, typed_action, ConstructorSpec, ContainerExtension, CtorArg,
    EntryId, EntryOrigin, Implementation, RegistrationEntry, RegistrationPlan, Resolver,
};
use infrastructure_common::{
    DependencyResult, Instance, Lifetime, RegistrationError, RegistrationResult, RegistryOptions,
    TypeCatalog, TypeModule, TypeRef,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 注册构建器
pub struct RegistryBuilder {
    options: RegistryOptions,
    catalog: Arc<TypeCatalog>,
    entries: Vec<RegistrationEntry>,
    configuration: TypeConfiguration,
    extensions: Vec<Arc<dyn ContainerExtension>>,
    modules: Vec<Arc<dyn TypeModule>>,
    scan_passes: usize,
    failures: Vec<RegistrationError>,
}

impl RegistryBuilder {
    /// 创建使用默认选项和空类型索引的构建器
    pub fn new() -> Self {
        Self {
            options: RegistryOptions::default(),
            catalog: Arc::new(TypeCatalog::new()),
            entries: Vec::new(),
            configuration: TypeConfiguration::default(),
            extensions: Vec::new(),
            modules: Vec::new(),
            scan_passes: 0,
            failures: Vec::new(),
        }
    }

    /// 设置构建器选项
    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置 `module_containing` 使用的类型目录
    pub fn with_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// 当前注册选项
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    fn next_id(&self) -> EntryId {
        EntryId(self.entries.len())
    }

    fn push_explicit(
        &mut self,
        abstraction: TypeRef,
        implementation: Implementation,
    ) -> RegistrationExpression<'_> {
        let id = self.next_id();
        debug!("显式注册 {}: {} -> {}", id, abstraction, implementation.describe());
        self.entries
            .push(RegistrationEntry::new(id, abstraction, implementation, EntryOrigin::Explicit));
        RegistrationExpression { builder: self, id }
    }

    /// 注册抽象类型到实现类型的映射（瞬时、未命名）
    pub fn register(
        &mut self,
        abstraction: impl Into<TypeRef>,
        implementation: impl Into<TypeRef>,
    ) -> RegistrationExpression<'_> {
        self.push_explicit(abstraction.into(), Implementation::Type(implementation.into()))
    }

    /// 使用工厂委托注册
    pub fn register_factory<F>(
        &mut self,
        abstraction: impl Into<TypeRef>,
        factory: F,
    ) -> RegistrationExpression<'_>
    where
        F: Fn(&dyn Resolver) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.push_explicit(abstraction.into(), Implementation::Factory(factory_fn(factory)))
    }

    /// 注册已有实例，每次解析都返回同一个实例
    pub fn register_instance<T: Any + Send + Sync>(
        &mut self,
        abstraction: impl Into<TypeRef>,
        instance: Arc<T>,
    ) -> RegistrationExpression<'_> {
        self.push_explicit(abstraction.into(), Implementation::Factory(instance_factory(instance)))
    }

    /// 把实现类型为 `concrete` 的所有注册设为单例
    ///
    /// 构建器中没有这样的注册时，作为当前作用域的生命周期策略。
    pub fn make_singleton(&mut self, concrete: impl Into<TypeRef>) -> &mut Self {
        self.configuration.singletons.push(concrete.into());
        self
    }

    /// 指定构造参数，使用参数个数等于 `args` 长度的构造函数
    pub fn configure_ctor_args_for(
        &mut self,
        concrete: impl Into<TypeRef>,
        args: impl IntoIterator<Item = CtorArg>,
    ) -> &mut Self {
        let spec = ConstructorSpec::Arguments(args.into_iter().collect());
        self.set_constructor(concrete.into(), spec);
        self
    }

    /// 按参数类型签名选择构造函数；空列表表示无参构造函数
    pub fn select_constructor(
        &mut self,
        concrete: impl Into<TypeRef>,
        parameters: impl IntoIterator<Item = TypeRef>,
    ) -> &mut Self {
        let spec = ConstructorSpec::Signature(parameters.into_iter().collect());
        self.set_constructor(concrete.into(), spec);
        self
    }

    fn set_constructor(&mut self, concrete: TypeRef, spec: ConstructorSpec) {
        let constructors = &mut self.configuration.constructors;
        constructors.retain(|(known, _)| known != &concrete);
        constructors.push((concrete, spec));
    }

    /// 实例构建完成后、返回调用方之前执行的动作
    pub fn after_build_up<F>(&mut self, target: impl Into<TypeRef>, action: F) -> &mut Self
    where
        F: Fn(&Instance) + Send + Sync + 'static,
    {
        self.configuration.hooks.push((target.into(), Arc::new(action)));
        self
    }

    /// 类型化的构建后动作，实例不是 `T` 时跳过
    pub fn after_build_up_as<T, F>(&mut self, target: impl Into<TypeRef>, action: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.configuration.hooks.push((target.into(), typed_action(action)));
        self
    }

    /// 执行一次扫描
    ///
    /// 扫描结果转为瞬时、未命名的条目；错误记录下来，由 `build()` 报告。
    pub fn scan<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ScanExpression<'_>),
    {
        let pass = self.scan_passes;
        self.scan_passes += 1;

        let catalog = Arc::clone(&self.catalog);
        let mut expression = ScanExpression::new(&catalog);
        configure(&mut expression);

        if let Some(error) = expression.take_error() {
            self.failures.push(error);
            return self;
        }

        let scanner =
            ModuleScanner::global().with_deduplication(self.options.deduplicate_identical_pairs);
        match scanner.scan(&expression) {
            Ok(pairs) => {
                info!("扫描批次 {} 产生 {} 个映射", pass, pairs.len());
                for pair in pairs {
                    let id = self.next_id();
                    let entry = RegistrationEntry::new(
                        id,
                        pair.abstraction,
                        Implementation::Type(pair.implementation),
                        EntryOrigin::Scanned { pass },
                    )
                    .with_membership(pair.membership);
                    self.entries.push(entry);
                }
                for module in expression.modules() {
                    if !self.modules.iter().any(|known| known.name() == module.name()) {
                        self.modules.push(Arc::clone(module));
                    }
                }
            }
            Err(error) => self.failures.push(error),
        }
        self
    }

    /// 添加默认构造的容器扩展
    pub fn add_extension<E>(&mut self) -> &mut Self
    where
        E: ContainerExtension + Default + 'static,
    {
        self.add_extension_instance(E::default())
    }

    /// 添加已构造的容器扩展
    pub fn add_extension_instance(
        &mut self,
        extension: impl ContainerExtension + 'static,
    ) -> &mut Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// 已累积的条目（按创建顺序，未合并）
    pub fn entries(&self) -> &[RegistrationEntry] {
        &self.entries
    }

    /// 按编号查找条目
    pub fn entry(&self, id: EntryId) -> Option<&RegistrationEntry> {
        self.entries.get(id.0)
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut RegistrationEntry> {
        self.entries.get_mut(id.0)
    }

    /// 组装注册计划
    pub fn build(mut self) -> RegistrationResult<RegistrationPlan> {
        if !self.failures.is_empty() {
            return Err(self.failures.remove(0));
        }

        let total = self.entries.len();
        let mut plan = assemble(self.entries, self.configuration, &self.options)?;
        plan.extensions = self.extensions;
        plan.modules = self.modules;

        info!(
            "注册计划组装完成: 条目 {} (合并前 {}), 策略 {}, 钩子 {}, 扩展 {}",
            plan.entries.len(),
            total,
            plan.policies.len(),
            plan.hooks.len(),
            plan.extensions.len()
        );
        Ok(plan)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("options", &self.options)
            .field("entries", &self.entries.len())
            .field("scan_passes", &self.scan_passes)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

/// 注册表达式
///
/// 持有条目标识，修改对应条目的生命周期和名称。
pub struct RegistrationExpression<'b> {
    builder: &'b mut RegistryBuilder,
    id: EntryId,
}

impl RegistrationExpression<'_> {
    /// 条目编号
    pub fn id(&self) -> EntryId {
        self.id
    }

    fn update(self, apply: impl FnOnce(&mut RegistrationEntry)) -> Self {
        if let Some(entry) = self.builder.entry_mut(self.id) {
            apply(entry);
        }
        self
    }

    /// 设为单例
    pub fn as_singleton(self) -> Self {
        self.update(|entry| entry.lifetime = Lifetime::Singleton)
    }

    /// 设为瞬时
    pub fn as_transient(self) -> Self {
        self.update(|entry| entry.lifetime = Lifetime::Transient)
    }

    /// 设置注册名称
    pub fn with_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update(|entry| entry.name = Some(name))
    }
}

impl fmt::Debug for RegistrationExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationExpression")
            .field("id", &self.id)
            .finish()
    }
}
