//! 内存容器
//!
//! 实现 [`NativeContainer`] 边界的参考容器：作用域链、开放泛型匹配、
//! 作用域策略、单例缓存和构建后钩子。

use di_abstractions::{
    ConstructorPlan, ContainerExtension, CtorArg, FactoryFn, Membership, NativeActivation,
    NativeContainer, NativeRegistration, NativeTypePolicy, PostBuildAction, RegistrationKey,
    Resolver,
};
use infrastructure_common::{
    can_satisfy, Activation, ConstructorInfo, ContainerOptions, DependencyError, DependencyResult,
    Instance, Lifetime, ScopeInfo, TypeCatalog, TypeDescriptor, TypeModule, TypeRef,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 注册标识，进程内唯一
static REGISTRATION_IDS: AtomicU64 = AtomicU64::new(1);

struct Registration {
    id: u64,
    native: NativeRegistration,
}

impl Registration {
    fn key(&self) -> RegistrationKey {
        let native = &self.native;
        match native.membership {
            Membership::Keyed => RegistrationKey::Keyed {
                abstraction: native.abstraction.clone(),
                name: native.name.clone(),
            },
            Membership::Collection => RegistrationKey::Member {
                abstraction: native.abstraction.clone(),
                implementation: match native.implementation() {
                    Some(implementation) => implementation.to_string(),
                    None => format!("<factory#{}>", self.id),
                },
            },
        }
    }

    fn is_default_for(&self, name: Option<&str>) -> bool {
        self.native.membership == Membership::Keyed && self.native.name.as_deref() == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SingletonKey {
    /// 注册级单例：每个 (注册, 请求的抽象类型) 一个实例
    Registration { id: u64, abstraction: TypeRef },
    /// 作用域策略单例：每个实现类型一个实例
    Type(TypeRef),
}

/// 作用域状态
struct ScopeState {
    info: ScopeInfo,
    parent: Option<Arc<ScopeState>>,
    registrations: RwLock<Vec<Arc<Registration>>>,
    singletons: Mutex<HashMap<SingletonKey, Instance>>,
    policies: RwLock<HashMap<TypeRef, NativeTypePolicy>>,
    hooks: RwLock<Vec<(TypeRef, PostBuildAction)>>,
    extensions: RwLock<Vec<Arc<dyn ContainerExtension>>>,
    children: AtomicUsize,
}

impl ScopeState {
    fn new(info: ScopeInfo, parent: Option<Arc<ScopeState>>) -> Self {
        Self {
            info,
            parent,
            registrations: RwLock::new(Vec::new()),
            singletons: Mutex::new(HashMap::new()),
            policies: RwLock::new(HashMap::new()),
            hooks: RwLock::new(Vec::new()),
            extensions: RwLock::new(Vec::new()),
            children: AtomicUsize::new(0),
        }
    }
}

/// 从最近作用域到根作用域
fn scope_chain(scope: &Arc<ScopeState>) -> Vec<Arc<ScopeState>> {
    let mut chain = vec![Arc::clone(scope)];
    let mut current = scope.parent.clone();
    while let Some(parent) = current {
        current = parent.parent.clone();
        chain.push(parent);
    }
    chain
}

/// 类型与目标一致，或类型的泛型定义是开放的目标
fn matches_target(target: &TypeRef, type_ref: &TypeRef) -> bool {
    target == type_ref
        || (target.is_open() && type_ref.generic_definition().as_ref() == Some(target))
}

/// 是否为同一个动作（只比较数据指针）
fn same_action(left: &PostBuildAction, right: &PostBuildAction) -> bool {
    std::ptr::eq(Arc::as_ptr(left).cast::<()>(), Arc::as_ptr(right).cast::<()>())
}

/// 开放泛型实现用请求的类型参数封闭
fn close_implementation(implementation: &TypeRef, requested: &TypeRef) -> TypeRef {
    if implementation.is_open() {
        implementation
            .close_with(requested.type_arguments())
            .unwrap_or_else(|| implementation.clone())
    } else {
        implementation.clone()
    }
}

/// 默认构造函数选择：参数最多的构造函数，数量并列时报错
fn select_heuristic<'d>(
    descriptor: &'d TypeDescriptor,
    implementation: &TypeRef,
) -> DependencyResult<&'d ConstructorInfo> {
    let arity = descriptor
        .constructors()
        .iter()
        .map(ConstructorInfo::arity)
        .max()
        .ok_or_else(|| DependencyError::NoConstructor {
            type_name: implementation.to_string(),
        })?;

    let mut candidates = descriptor
        .constructors()
        .iter()
        .filter(|constructor| constructor.arity() == arity);
    match (candidates.next(), candidates.next()) {
        (Some(constructor), None) => Ok(constructor),
        _ => Err(DependencyError::AmbiguousConstructor {
            type_name: implementation.to_string(),
            arity,
        }),
    }
}

/// 合并作用域链后的有效策略
#[derive(Default)]
struct EffectivePolicy {
    lifetime: Option<(Arc<ScopeState>, Lifetime)>,
    constructor: Option<ConstructorPlan>,
}

/// 激活方式
enum Source<'r> {
    Type(ConstructorPlan),
    Factory(&'r FactoryFn),
}

/// 一次实例构建所需的全部信息
struct BuildRequest<'r> {
    requested: &'r TypeRef,
    implementation: Option<TypeRef>,
    source: Source<'r>,
    actions: &'r [PostBuildAction],
    lifetime: Lifetime,
    cache_scope: Arc<ScopeState>,
    cache_key: SingletonKey,
}

/// 内存容器
#[derive(Clone)]
pub struct InMemoryContainer {
    scope: Arc<ScopeState>,
    catalog: Arc<RwLock<Arc<TypeCatalog>>>,
    options: ContainerOptions,
}

impl InMemoryContainer {
    /// 创建根作用域容器
    pub fn new() -> Self {
        Self::with_catalog(TypeCatalog::new())
    }

    /// 使用已有的类型索引创建根作用域
    pub fn with_catalog(catalog: TypeCatalog) -> Self {
        let info = ScopeInfo::root();
        debug!("创建根作用域: {} ({})", info.name, info.id);
        Self {
            scope: Arc::new(ScopeState::new(info, None)),
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            options: ContainerOptions::default(),
        }
    }

    /// 替换容器选项
    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// 添加模块后返回容器
    pub fn with_module(self, module: Arc<dyn TypeModule>) -> Self {
        self.add_module(module);
        self
    }

    /// 容器选项
    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// 当前作用域（不含父作用域）的注册数量
    pub fn registration_count(&self) -> usize {
        self.scope.registrations.read().len()
    }

    /// 按最近作用域优先查找默认注册；同一作用域内精确匹配优先于开放泛型
    fn find_registration(
        &self,
        abstraction: &TypeRef,
        name: Option<&str>,
    ) -> Option<(Arc<ScopeState>, Arc<Registration>)> {
        for scope in scope_chain(&self.scope) {
            let found = {
                let registrations = scope.registrations.read();
                let mut exact = None;
                let mut open = None;
                let defaults = registrations
                    .iter()
                    .filter(|registration| registration.is_default_for(name));
                for registration in defaults {
                    if &registration.native.abstraction == abstraction {
                        exact = Some(registration);
                        break;
                    }
                    if open.is_none()
                        && can_satisfy(abstraction, &registration.native.abstraction)
                    {
                        open = Some(registration);
                    }
                }
                exact.or(open).cloned()
            };
            if let Some(registration) = found {
                return Some((scope, registration));
            }
        }
        None
    }

    /// 合并作用域链上的策略，最近的作用域优先
    fn effective_policy(&self, implementation: &TypeRef) -> EffectivePolicy {
        let definition = implementation.generic_definition();
        let mut effective = EffectivePolicy::default();

        for scope in scope_chain(&self.scope) {
            let policy = {
                let policies = scope.policies.read();
                policies
                    .get(implementation)
                    .or_else(|| definition.as_ref().and_then(|definition| policies.get(definition)))
                    .cloned()
            };
            let Some(policy) = policy else {
                continue;
            };

            if effective.lifetime.is_none() {
                effective.lifetime = policy.lifetime.map(|lifetime| (Arc::clone(&scope), lifetime));
            }
            if effective.constructor.is_none() {
                effective.constructor = policy.constructor;
            }
        }
        effective
    }

    fn build_registered(
        &self,
        owner: &Arc<ScopeState>,
        registration: &Registration,
        requested: &TypeRef,
    ) -> DependencyResult<Instance> {
        let native = &registration.native;
        let registration_key = SingletonKey::Registration {
            id: registration.id,
            abstraction: requested.clone(),
        };

        let request = match &native.activation {
            NativeActivation::Type {
                implementation,
                constructor,
            } => {
                let implementation = close_implementation(implementation, requested);
                let policy = self.effective_policy(&implementation);
                let (lifetime, cache_scope, cache_key) = match policy.lifetime {
                    Some((scope, lifetime)) => {
                        (lifetime, scope, SingletonKey::Type(implementation.clone()))
                    }
                    None => (native.lifetime, Arc::clone(owner), registration_key),
                };
                BuildRequest {
                    requested,
                    source: Source::Type(policy.constructor.unwrap_or_else(|| constructor.clone())),
                    implementation: Some(implementation),
                    actions: &native.post_build_actions,
                    lifetime,
                    cache_scope,
                    cache_key,
                }
            }
            NativeActivation::Factory(factory) => BuildRequest {
                requested,
                implementation: None,
                source: Source::Factory(factory),
                actions: &native.post_build_actions,
                lifetime: native.lifetime,
                cache_scope: Arc::clone(owner),
                cache_key: registration_key,
            },
        };

        self.build(request)
    }

    /// 未注册的具体类按类型策略构建，默认瞬时
    fn build_unregistered(&self, requested: &TypeRef) -> DependencyResult<Instance> {
        let policy = self.effective_policy(requested);
        let (lifetime, cache_scope) = match policy.lifetime {
            Some((scope, lifetime)) => (lifetime, scope),
            None => (Lifetime::Transient, Arc::clone(&self.scope)),
        };

        self.build(BuildRequest {
            requested,
            implementation: Some(requested.clone()),
            source: Source::Type(policy.constructor.unwrap_or_default()),
            actions: &[],
            lifetime,
            cache_scope,
            cache_key: SingletonKey::Type(requested.clone()),
        })
    }

    fn build(&self, request: BuildRequest<'_>) -> DependencyResult<Instance> {
        if !request.lifetime.is_singleton() {
            return self.create(&request);
        }

        let cached = request.cache_scope.singletons.lock().get(&request.cache_key).cloned();
        if let Some(instance) = cached {
            return Ok(instance);
        }

        // 构建期间不持有锁；并发构建时先写入的实例生效
        let instance = self.create(&request)?;
        let mut singletons = request.cache_scope.singletons.lock();
        Ok(singletons
            .entry(request.cache_key.clone())
            .or_insert(instance)
            .clone())
    }

    fn create(&self, request: &BuildRequest<'_>) -> DependencyResult<Instance> {
        let instance = match (&request.source, &request.implementation) {
            (Source::Type(plan), Some(implementation)) => self.activate(implementation, plan)?,
            (Source::Factory(factory), _) => factory(self)?,
            (Source::Type(_), None) => {
                return Err(DependencyError::resolution_failed(
                    request.requested.to_string(),
                    None,
                    "缺少实现类型",
                ))
            }
        };
        debug!("创建实例: {} ({})", request.requested, instance.type_name());

        for action in request.actions {
            action(&instance);
        }
        self.run_scope_hooks(request, &instance);
        Ok(instance)
    }

    fn activate(
        &self,
        implementation: &TypeRef,
        plan: &ConstructorPlan,
    ) -> DependencyResult<Instance> {
        let catalog = self.catalog();
        let descriptor = catalog
            .describe(implementation)
            .filter(|descriptor| descriptor.is_concrete())
            .ok_or_else(|| {
                DependencyError::resolution_failed(
                    implementation.to_string(),
                    None,
                    "类型不在类型索引中或不是具体类",
                )
            })?;

        let (constructor, arguments) = match plan {
            ConstructorPlan::Heuristic => {
                let constructor = select_heuristic(descriptor, implementation)?;
                let arguments = constructor
                    .parameters
                    .iter()
                    .map(|parameter| self.resolve(parameter, None))
                    .collect::<DependencyResult<Vec<_>>>()?;
                (constructor, arguments)
            }
            ConstructorPlan::Selected {
                parameters,
                arguments,
            } => {
                let constructor = descriptor.constructor_matching(parameters).ok_or_else(|| {
                    DependencyError::NoConstructor {
                        type_name: implementation.to_string(),
                    }
                })?;
                let arguments = arguments
                    .iter()
                    .map(|argument| match argument {
                        CtorArg::Value(value) => Ok(value.clone()),
                        CtorArg::Resolve(abstraction) => self.resolve(abstraction, None),
                    })
                    .collect::<DependencyResult<Vec<_>>>()?;
                (constructor, arguments)
            }
        };

        (constructor.activator)(&Activation::new(implementation, &arguments))
    }

    /// 依次执行作用域钩子和扩展回调
    ///
    /// 已作为注册动作执行过的钩子不再执行。
    fn run_scope_hooks(&self, request: &BuildRequest<'_>, instance: &Instance) {
        let requested = request.requested;
        let implementation = request.implementation.as_ref();
        let chain = scope_chain(&self.scope);

        let mut actions = Vec::new();
        let mut extensions = Vec::new();
        for scope in &chain {
            actions.extend(
                scope
                    .hooks
                    .read()
                    .iter()
                    .filter(|(target, _)| {
                        matches_target(target, requested)
                            || implementation.is_some_and(|other| matches_target(target, other))
                    })
                    .filter(|(_, action)| {
                        !request.actions.iter().any(|known| same_action(known, action))
                    })
                    .map(|(_, action)| Arc::clone(action)),
            );
            extensions.extend(scope.extensions.read().iter().cloned());
        }

        for action in actions {
            action(instance);
        }
        for extension in extensions {
            extension.on_build_up(requested, instance);
        }
    }
}

impl Default for InMemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryContainer")
            .field("scope", &self.scope.info.name)
            .field("registrations", &self.registration_count())
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver for InMemoryContainer {
    fn resolve(&self, abstraction: &TypeRef, name: Option<&str>) -> DependencyResult<Instance> {
        if let Some((owner, registration)) = self.find_registration(abstraction, name) {
            return self.build_registered(&owner, &registration, abstraction);
        }

        if name.is_none() && self.options.auto_resolve_concrete_types {
            let auto_resolvable = self.catalog().describe(abstraction).is_some_and(|descriptor| {
                descriptor.is_concrete()
                    && descriptor.is_generic_definition() == abstraction.is_generic()
            });
            if auto_resolvable && !abstraction.is_open() {
                return self.build_unregistered(abstraction);
            }
        }

        Err(DependencyError::resolution_failed(
            abstraction.to_string(),
            name,
            "没有可满足请求的注册",
        ))
    }

    fn resolve_all(&self, abstraction: &TypeRef) -> DependencyResult<Vec<Instance>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for scope in scope_chain(&self.scope) {
            let registrations = scope.registrations.read();
            for registration in registrations.iter() {
                let native = &registration.native;
                let is_member =
                    native.membership == Membership::Collection || native.name.is_some();
                if is_member
                    && can_satisfy(abstraction, &native.abstraction)
                    && seen.insert(registration.key())
                {
                    selected.push((Arc::clone(&scope), Arc::clone(registration)));
                }
            }
        }

        selected
            .iter()
            .map(|(owner, registration)| self.build_registered(owner, registration, abstraction))
            .collect()
    }

    fn is_registered(&self, abstraction: &TypeRef, name: Option<&str>) -> bool {
        self.find_registration(abstraction, name).is_some()
    }
}

impl NativeContainer for InMemoryContainer {
    fn scope(&self) -> &ScopeInfo {
        &self.scope.info
    }

    fn catalog(&self) -> Arc<TypeCatalog> {
        Arc::clone(&self.catalog.read())
    }

    fn add_module(&self, module: Arc<dyn TypeModule>) {
        let mut catalog = self.catalog.write();
        if catalog.modules().iter().any(|known| known.name() == module.name()) {
            return;
        }
        debug!("类型索引添加模块: {}", module.name());
        Arc::make_mut(&mut *catalog).add_module(module);
    }

    fn register(&self, registration: NativeRegistration) {
        let registration = Arc::new(Registration {
            id: REGISTRATION_IDS.fetch_add(1, Ordering::Relaxed),
            native: registration,
        });
        let key = registration.key();

        let mut registrations = self.scope.registrations.write();
        match registrations.iter().position(|known| known.key() == key) {
            Some(position) => registrations[position] = registration,
            None => registrations.push(registration),
        }
    }

    fn set_type_policy(&self, implementation: TypeRef, policy: NativeTypePolicy) {
        let mut policies = self.scope.policies.write();
        let existing = policies.entry(implementation).or_default();
        if policy.lifetime.is_some() {
            existing.lifetime = policy.lifetime;
        }
        if policy.constructor.is_some() {
            existing.constructor = policy.constructor;
        }
    }

    fn add_post_build_action(&self, target: TypeRef, action: PostBuildAction) {
        self.scope.hooks.write().push((target, action));
    }

    fn add_extension(&self, extension: Arc<dyn ContainerExtension>) {
        extension.initialize(&self.scope.info);
        self.scope.extensions.write().push(extension);
    }

    fn create_child_scope(&self) -> Self {
        let index = self.scope.children.fetch_add(1, Ordering::Relaxed) + 1;
        let info = self.scope.info.child(format!("child-{index}"));
        info!("创建子作用域: {} (父作用域: {})", info.name, self.scope.info.name);

        // 子作用域从父作用域当前的类型索引开始，之后添加的模块只对自己可见
        let catalog = Arc::clone(&self.catalog.read());
        Self {
            scope: Arc::new(ScopeState::new(info, Some(Arc::clone(&self.scope)))),
            catalog: Arc::new(RwLock::new(catalog)),
            options: self.options.clone(),
        }
    }
}
