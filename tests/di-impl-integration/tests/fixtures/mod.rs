//! 集成测试使用的夹具类型与模块描述

use di_composition::Registry;
use di_impl::RegistryBuilder;
use infrastructure_common::{Instance, Module, TypeDescriptor, TypeModule, TypeRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const FOO_REGISTRY: &str = "Fixtures.FooRegistry";
pub const BAR_REGISTRY: &str = "Fixtures.BarRegistry";
pub const IFOO_SERVICE: &str = "Fixtures.IFooService";
pub const FOO_SERVICE: &str = "Fixtures.FooService";
pub const IBAR_SERVICE: &str = "Fixtures.IBarService";
pub const BAR_SERVICE: &str = "Fixtures.BarService";
pub const IHAVE_MANY_IMPLEMENTATIONS: &str = "Fixtures.IHaveManyImplementations";
pub const IHANDLER: &str = "Fixtures.IHandler";
pub const IMAPPER: &str = "Fixtures.IMapper";
pub const IREPOSITORY: &str = "Fixtures.IRepository";
pub const MESSAGE: &str = "Fixtures.Message";
pub const ANOTHER_MESSAGE: &str = "Fixtures.AnotherMessage";
pub const ISERVICE_WITH_CTOR_ARGS: &str = "Fixtures.IServiceWithCtorArgs";
pub const SERVICE_WITH_CTOR_ARGS: &str = "Fixtures.ServiceWithCtorArgs";
pub const ISTARTABLE: &str = "Fixtures.IStartable";
pub const STARTABLE_SERVICE_1: &str = "Fixtures.StartableService1";
pub const STARTABLE_SERVICE_2: &str = "Fixtures.StartableService2";
pub const STRING: &str = "System.String";
pub const OTHER_NAMESPACE: &str = "Fixtures.OtherNamespace";
pub const ISERVICE_IN_OTHER_NAMESPACE: &str = "Fixtures.OtherNamespace.IServiceInOtherNamespace";
pub const SERVICE_IN_OTHER_NAMESPACE: &str = "Fixtures.OtherNamespace.ServiceInOtherNamespace";

/// 注册 `IFooService -> FooService`
#[derive(Debug, Default)]
pub struct FooRegistry;

impl Registry for FooRegistry {
    fn configure(&self, registry: &mut RegistryBuilder) {
        registry.register(IFOO_SERVICE, FOO_SERVICE);
    }
}

/// 注册 `IBarService -> BarService`
#[derive(Debug, Default)]
pub struct BarRegistry;

impl Registry for BarRegistry {
    fn configure(&self, registry: &mut RegistryBuilder) {
        registry.register(IBAR_SERVICE, BAR_SERVICE);
    }
}

#[derive(Debug, Default)]
pub struct FooService;

#[derive(Debug, Default)]
pub struct BarService;

#[derive(Debug, Default)]
pub struct Implementation1;

#[derive(Debug, Default)]
pub struct Implementation2;

#[derive(Debug, Default)]
pub struct MessageHandler;

#[derive(Debug, Default)]
pub struct AnotherMessageHandler;

#[derive(Debug, Default)]
pub struct MessageToAnotherMessageMapper;

#[derive(Debug, Default)]
pub struct ServiceInOtherNamespace;

/// 开放泛型仓储，记录封闭时的实体类型
#[derive(Debug)]
pub struct Repository {
    pub entity: TypeRef,
}

/// 三个构造函数：无参、`(IFooService)`、`(System.String, IFooService)`
#[derive(Debug, Default)]
pub struct ServiceWithCtorArgs {
    pub some_string: Option<String>,
    pub foo_service: Option<Instance>,
}

/// `StartableService1` 与 `StartableService2` 共用的实现
#[derive(Debug)]
pub struct StartableService {
    pub kind: &'static str,
    started: AtomicBool,
}

impl StartableService {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            started: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn start_was_called(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

/// 夹具模块
pub fn module() -> Arc<dyn TypeModule> {
    Arc::new(
        Module::new("fixtures").with_types([
            TypeDescriptor::class(FOO_REGISTRY).with_default_constructor(FooRegistry::default),
            TypeDescriptor::class(BAR_REGISTRY).with_default_constructor(BarRegistry::default),
            TypeDescriptor::interface(IFOO_SERVICE),
            TypeDescriptor::class(FOO_SERVICE)
                .implements(named(IFOO_SERVICE))
                .with_default_constructor(FooService::default),
            TypeDescriptor::interface(IBAR_SERVICE),
            TypeDescriptor::class(BAR_SERVICE)
                .implements(named(IBAR_SERVICE))
                .implements(named(IFOO_SERVICE))
                .with_default_constructor(BarService::default),
            TypeDescriptor::interface(IHAVE_MANY_IMPLEMENTATIONS),
            TypeDescriptor::class("Fixtures.Implementation1")
                .implements(named(IHAVE_MANY_IMPLEMENTATIONS))
                .with_default_constructor(Implementation1::default),
            TypeDescriptor::class("Fixtures.Implementation2")
                .implements(named(IHAVE_MANY_IMPLEMENTATIONS))
                .with_default_constructor(Implementation2::default),
            TypeDescriptor::generic_interface(IHANDLER, 1),
            TypeDescriptor::class("Fixtures.MessageHandler")
                .implements(TypeRef::closed(IHANDLER, [named(MESSAGE)]))
                .with_default_constructor(MessageHandler::default),
            TypeDescriptor::class("Fixtures.AnotherMessageHandler")
                .implements(TypeRef::closed(IHANDLER, [named(ANOTHER_MESSAGE)]))
                .with_default_constructor(AnotherMessageHandler::default),
            TypeDescriptor::class(MESSAGE).with_default_constructor(|| ()),
            TypeDescriptor::class(ANOTHER_MESSAGE).with_default_constructor(|| ()),
            TypeDescriptor::generic_interface(IMAPPER, 2),
            TypeDescriptor::class("Fixtures.MessageToAnotherMessageMapper")
                .implements(TypeRef::closed(IMAPPER, [named(MESSAGE), named(ANOTHER_MESSAGE)]))
                .with_default_constructor(MessageToAnotherMessageMapper::default),
            TypeDescriptor::generic_interface(IREPOSITORY, 1),
            TypeDescriptor::generic_class("Fixtures.Repository", 1)
                .implements(TypeRef::open(IREPOSITORY, 1))
                .with_constructor(Vec::new(), |activation| {
                    Ok(Instance::new(Repository {
                        entity: activation.type_arguments()[0].clone(),
                    }))
                }),
            TypeDescriptor::interface(ISERVICE_WITH_CTOR_ARGS),
            TypeDescriptor::class(SERVICE_WITH_CTOR_ARGS)
                .implements(named(ISERVICE_WITH_CTOR_ARGS))
                .with_default_constructor(ServiceWithCtorArgs::default)
                .with_constructor([named(IFOO_SERVICE)], |activation| {
                    Ok(Instance::new(ServiceWithCtorArgs {
                        some_string: None,
                        foo_service: activation.argument(0).cloned(),
                    }))
                })
                .with_constructor([named(STRING), named(IFOO_SERVICE)], |activation| {
                    let some_string = activation.required::<String>(0)?;
                    Ok(Instance::new(ServiceWithCtorArgs {
                        some_string: Some(some_string.as_ref().clone()),
                        foo_service: activation.argument(1).cloned(),
                    }))
                }),
            TypeDescriptor::interface(ISTARTABLE),
            TypeDescriptor::class(STARTABLE_SERVICE_1)
                .implements(named(ISTARTABLE))
                .with_default_constructor(|| StartableService::new("1")),
            TypeDescriptor::class(STARTABLE_SERVICE_2)
                .implements(named(ISTARTABLE))
                .with_default_constructor(|| StartableService::new("2")),
            TypeDescriptor::interface(ISERVICE_IN_OTHER_NAMESPACE),
            TypeDescriptor::class(SERVICE_IN_OTHER_NAMESPACE)
                .implements(named(ISERVICE_IN_OTHER_NAMESPACE))
                .with_default_constructor(ServiceInOtherNamespace::default),
        ]),
    )
}
