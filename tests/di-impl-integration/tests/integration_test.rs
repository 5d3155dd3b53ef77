//! 约定式注册层端到端集成测试

mod fixtures;

use di_abstractions::{NativeContainer, Resolver, ResolverExt};
use di_composition::{
    ContainerInitializeExt, ContainerInitializer, LoggingConfig, RegistryBuilderExt,
};
use di_impl::{AddAllConvention, FirstInterfaceConvention, InMemoryContainer};
use fixtures::*;
use infrastructure_common::{
    DependencyError, InfrastructureError, Module, RegistrationError, RegistryOptions,
    TypeDescriptor, TypeRef,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn container() -> InMemoryContainer {
    InMemoryContainer::new().with_module(module())
}

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

fn assert_unresolvable(container: &InMemoryContainer, abstraction: &str) {
    let error = container.resolve(&named(abstraction), None).unwrap_err();
    assert!(
        matches!(error, DependencyError::ResolutionFailed { .. }),
        "期望解析失败: {abstraction}, 实际: {error}"
    );
}

#[test]
fn test_initialize_with_one_registry() {
    let container = container();

    container.initialize(|x| {
        x.add_registry::<FooRegistry>();
    })
    .unwrap();

    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
}

#[test]
fn test_initialize_with_two_registries() {
    let container = container();

    container.initialize(|x| {
        x.add_registry::<FooRegistry>();
        x.add_registry::<BarRegistry>();
    })
    .unwrap();

    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
    assert!(container.resolve(&named(IBAR_SERVICE), None).unwrap().is::<BarService>());
}

#[test]
fn test_register_type() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE);
    })
    .unwrap();

    assert!(container.resolve(&named(IBAR_SERVICE), None).unwrap().is::<BarService>());
}

#[test]
fn test_register_singleton() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE).as_singleton();
    })
    .unwrap();

    let first = container.resolve(&named(IBAR_SERVICE), None).unwrap();
    let second = container.resolve(&named(IBAR_SERVICE), None).unwrap();
    assert!(first.same_as(&second));
}

#[test]
fn test_transient_instances_are_distinct() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE);
    })
    .unwrap();

    let first = container.resolve(&named(IBAR_SERVICE), None).unwrap();
    let second = container.resolve(&named(IBAR_SERVICE), None).unwrap();
    assert!(!first.same_as(&second));
}

#[test]
fn test_register_named_instance() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE).with_name("name");
    })
    .unwrap();

    assert!(container.resolve(&named(IBAR_SERVICE), Some("name")).unwrap().is::<BarService>());
    // 命名注册不是默认注册
    assert_unresolvable(&container, IBAR_SERVICE);
}

#[test]
fn test_register_named_singleton_instance() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE).with_name("name").as_singleton();
    })
    .unwrap();

    let first = container.resolve(&named(IBAR_SERVICE), Some("name")).unwrap();
    let second = container.resolve(&named(IBAR_SERVICE), Some("name")).unwrap();
    assert!(first.same_as(&second));
}

#[test]
fn test_register_using_factory_delegate() {
    let container = container();
    let my_service = Arc::new(BarService);

    let captured = Arc::clone(&my_service);
    container.initialize(move |x| {
        x.register_factory(IBAR_SERVICE, move |_| {
            Ok(infrastructure_common::Instance::from_arc(Arc::clone(&captured)))
        });
    })
    .unwrap();

    let resolved = container.resolve_as::<BarService>(&named(IBAR_SERVICE), None).unwrap();
    assert!(Arc::ptr_eq(&resolved, &my_service));
}

#[test]
fn test_register_named_instance_using_factory_delegate() {
    let container = container();
    let my_service = Arc::new(BarService);

    let captured = Arc::clone(&my_service);
    container.initialize(move |x| {
        x.register_instance(IBAR_SERVICE, captured).with_name("name");
    })
    .unwrap();

    let resolved = container
        .resolve_as::<BarService>(&named(IBAR_SERVICE), Some("name"))
        .unwrap();
    assert!(Arc::ptr_eq(&resolved, &my_service));
}

#[test]
fn test_scan_using_first_interface_convention() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
    assert!(container.resolve(&named(IBAR_SERVICE), None).unwrap().is::<BarService>());
}

#[test]
fn test_scan_using_add_all_convention() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with_convention(AddAllConvention::new(IHAVE_MANY_IMPLEMENTATIONS));
        });
    })
    .unwrap();

    let all = container.resolve_all(&named(IHAVE_MANY_IMPLEMENTATIONS)).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|instance| instance.is::<Implementation1>()));
    assert!(all.iter().any(|instance| instance.is::<Implementation2>()));
}

#[test]
fn test_scan_using_several_conventions() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.with_convention(AddAllConvention::new(IHAVE_MANY_IMPLEMENTATIONS));
        });
    })
    .unwrap();

    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
    assert!(container.resolve(&named(IBAR_SERVICE), None).unwrap().is::<BarService>());
    assert_eq!(container.resolve_all(&named(IHAVE_MANY_IMPLEMENTATIONS)).unwrap().len(), 2);
}

#[test]
fn test_deduplicated_scan_keeps_collection_members() {
    let container = container();

    ContainerInitializer::new()
        .with_options(RegistryOptions {
            deduplicate_identical_pairs: true,
            ..RegistryOptions::default()
        })
        .initialize(&container, |x| {
            x.scan(|scan| {
                scan.module_containing(FOO_REGISTRY);
                scan.with::<FirstInterfaceConvention>();
                scan.with_convention(AddAllConvention::new(IHAVE_MANY_IMPLEMENTATIONS));
                scan.with_convention(AddAllConvention::new(IFOO_SERVICE));
            });
        })
        .unwrap();

    assert_eq!(container.resolve_all(&named(IHAVE_MANY_IMPLEMENTATIONS)).unwrap().len(), 2);
    let foo_services = container.resolve_all(&named(IFOO_SERVICE)).unwrap();
    assert_eq!(foo_services.len(), 2);
    assert!(foo_services.iter().any(|instance| instance.is::<FooService>()));
    assert!(foo_services.iter().any(|instance| instance.is::<BarService>()));
}

#[test]
fn test_configure_concrete_type_as_singleton() {
    let container = container();

    container.initialize(|x| {
        x.register(IBAR_SERVICE, BAR_SERVICE);
        x.make_singleton(BAR_SERVICE);
    })
    .unwrap();

    let first = container.resolve(&named(IBAR_SERVICE), None).unwrap();
    assert!(first.same_as(&container.resolve(&named(IBAR_SERVICE), None).unwrap()));
}

#[test]
fn test_connect_implementations_to_closed_generic_interfaces() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    let message_handler = TypeRef::closed(IHANDLER, [named(MESSAGE)]);
    let another_handler = TypeRef::closed(IHANDLER, [named(ANOTHER_MESSAGE)]);
    assert!(container.resolve(&message_handler, None).unwrap().is::<MessageHandler>());
    assert!(container.resolve(&another_handler, None).unwrap().is::<AnotherMessageHandler>());
}

#[test]
fn test_connect_implementations_to_two_argument_generic_interface() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    let mapper = TypeRef::closed(IMAPPER, [named(MESSAGE), named(ANOTHER_MESSAGE)]);
    assert!(container
        .resolve(&mapper, None)
        .unwrap()
        .is::<MessageToAnotherMessageMapper>());
}

#[test]
fn test_open_generic_implementation_closes_over_request() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    let request = TypeRef::closed(IREPOSITORY, [named(MESSAGE)]);
    let repository = container.resolve_as::<Repository>(&request, None).unwrap();
    assert_eq!(repository.entity, named(MESSAGE));
}

#[test]
fn test_exclude_type() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.exclude_type(BAR_SERVICE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IBAR_SERVICE);
    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
}

#[test]
fn test_exclude_type_using_predicate() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.exclude(|t: &TypeDescriptor| t.full_name() == BAR_SERVICE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IBAR_SERVICE);
}

#[test]
fn test_exclude_namespace_containing_type() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.exclude_namespace_containing(SERVICE_IN_OTHER_NAMESPACE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, ISERVICE_IN_OTHER_NAMESPACE);
    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<FooService>());
}

#[test]
fn test_include_namespace_containing_type() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.include_namespace_containing(SERVICE_IN_OTHER_NAMESPACE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IFOO_SERVICE);
    assert!(container
        .resolve(&named(ISERVICE_IN_OTHER_NAMESPACE), None)
        .unwrap()
        .is::<ServiceInOtherNamespace>());
}

#[test]
fn test_include_namespace() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.include_namespace(OTHER_NAMESPACE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IFOO_SERVICE);
    assert!(container
        .resolve(&named(ISERVICE_IN_OTHER_NAMESPACE), None)
        .unwrap()
        .is::<ServiceInOtherNamespace>());
}

#[test]
fn test_include_using_predicate() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.include(|t: &TypeDescriptor| t.full_name() == SERVICE_IN_OTHER_NAMESPACE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IFOO_SERVICE);
    assert!(container
        .resolve(&named(ISERVICE_IN_OTHER_NAMESPACE), None)
        .unwrap()
        .is::<ServiceInOtherNamespace>());
}

#[test]
fn test_exclude_wins_over_include() {
    let container = container();

    container.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.include_type(FOO_SERVICE);
            scan.exclude_type(FOO_SERVICE);
        });
    })
    .unwrap();

    assert_unresolvable(&container, IFOO_SERVICE);
}

#[test]
fn test_configure_ctor_arguments_for_type() {
    let container = container();

    container.initialize(|x| {
        x.register(ISERVICE_WITH_CTOR_ARGS, SERVICE_WITH_CTOR_ARGS);
        x.register(IFOO_SERVICE, FOO_SERVICE);
        x.configure_ctor_args_for(
            SERVICE_WITH_CTOR_ARGS,
            [
                di_abstractions::CtorArg::value("some string".to_string()),
                di_abstractions::CtorArg::resolve(IFOO_SERVICE),
            ],
        );
    })
    .unwrap();

    let service = container
        .resolve_as::<ServiceWithCtorArgs>(&named(ISERVICE_WITH_CTOR_ARGS), None)
        .unwrap();
    assert_eq!(service.some_string.as_deref(), Some("some string"));
    assert!(service.foo_service.as_ref().is_some_and(|foo| foo.is::<FooService>()));
}

#[test]
fn test_configure_ctor_arguments_with_bad_arity_fails() {
    let container = container();

    let error = container
        .initialize(|x| {
            x.register(ISERVICE_WITH_CTOR_ARGS, SERVICE_WITH_CTOR_ARGS);
            x.configure_ctor_args_for(
                SERVICE_WITH_CTOR_ARGS,
                [
                    di_abstractions::CtorArg::value(1_u32),
                    di_abstractions::CtorArg::value(2_u32),
                    di_abstractions::CtorArg::value(3_u32),
                ],
            );
        })
        .unwrap_err();

    assert!(matches!(
        error,
        InfrastructureError::RegistrationError {
            source: RegistrationError::ConstructorNotFound { .. }
        }
    ));
    assert!(!container.is_registered(&named(ISERVICE_WITH_CTOR_ARGS), None));
}

#[test]
fn test_select_default_constructor() {
    let container = container();

    container.initialize(|x| {
        x.register(ISERVICE_WITH_CTOR_ARGS, SERVICE_WITH_CTOR_ARGS);
        x.select_constructor(SERVICE_WITH_CTOR_ARGS, Vec::<TypeRef>::new());
    })
    .unwrap();

    let service = container
        .resolve_as::<ServiceWithCtorArgs>(&named(ISERVICE_WITH_CTOR_ARGS), None)
        .unwrap();
    assert!(service.some_string.is_none());
    assert!(service.foo_service.is_none());
}

#[test]
fn test_select_constructor_by_signature() {
    let container = container();

    container.initialize(|x| {
        x.register(ISERVICE_WITH_CTOR_ARGS, SERVICE_WITH_CTOR_ARGS);
        x.register(IFOO_SERVICE, FOO_SERVICE);
        x.select_constructor(SERVICE_WITH_CTOR_ARGS, [named(IFOO_SERVICE)]);
    })
    .unwrap();

    let service = container
        .resolve_as::<ServiceWithCtorArgs>(&named(ISERVICE_WITH_CTOR_ARGS), None)
        .unwrap();
    assert!(service.some_string.is_none());
    assert!(service.foo_service.as_ref().is_some_and(|foo| foo.is::<FooService>()));
}

#[test]
fn test_make_transient_service_singleton_in_child_scope() {
    let container = container();
    container.initialize(|x| {
        x.register(IFOO_SERVICE, FOO_SERVICE);
    })
    .unwrap();

    let child = container.create_child_scope();
    child.initialize(|x| {
        x.make_singleton(FOO_SERVICE);
    })
    .unwrap();

    let resolve = |scope: &InMemoryContainer| scope.resolve(&named(IFOO_SERVICE), None).unwrap();
    assert!(!resolve(&container).same_as(&resolve(&container)));
    assert!(!resolve(&container).same_as(&resolve(&child)));
    assert!(resolve(&child).same_as(&resolve(&child)));

    // 兄弟作用域不受影响
    let sibling = container.create_child_scope();
    assert!(!resolve(&sibling).same_as(&resolve(&sibling)));
}

#[test]
fn test_child_scope_scan_is_invisible_to_parent() {
    #[derive(Debug)]
    struct PluginService;

    let container = container();
    let child = container.create_child_scope();
    child.add_module(Arc::new(Module::new("plugins").with_types([
        TypeDescriptor::interface("Plugins.IPlugin"),
        TypeDescriptor::class("Plugins.PluginService")
            .implements(named("Plugins.IPlugin"))
            .with_default_constructor(|| PluginService),
    ])));

    child.initialize(|x| {
        x.scan(|scan| {
            scan.module_containing("Plugins.PluginService");
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    assert!(child.resolve(&named("Plugins.IPlugin"), None).unwrap().is::<PluginService>());
    assert_unresolvable(&container, "Plugins.IPlugin");

    // 父作用域扫描同一类型名时找不到模块
    let error = container
        .initialize(|x| {
            x.scan(|scan| {
                scan.module_containing("Plugins.PluginService");
                scan.with::<FirstInterfaceConvention>();
            });
        })
        .unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::RegistrationError {
            source: RegistrationError::ModuleNotFound { .. }
        }
    ));
}

#[test]
fn test_call_method_on_concrete_after_build_up() {
    let container = container();

    container.initialize(|x| {
        x.after_build_up_as::<StartableService, _>(STARTABLE_SERVICE_1, StartableService::start);
    })
    .unwrap();

    let service = container
        .resolve_as::<StartableService>(&named(STARTABLE_SERVICE_1), None)
        .unwrap();
    assert!(service.start_was_called());
}

#[test]
fn test_after_build_up_on_concrete_runs_once_per_build() {
    let container = container();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    container.initialize(|x| {
        x.register(IFOO_SERVICE, FOO_SERVICE);
        x.after_build_up(FOO_SERVICE, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    })
    .unwrap();

    container.resolve(&named(IFOO_SERVICE), None).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 直接解析具体类型同样触发
    assert!(container.resolve(&named(FOO_SERVICE), None).unwrap().is::<FooService>());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_call_method_on_interface_after_build_up() {
    let container = container();

    container.initialize(|x| {
        x.register(ISTARTABLE, STARTABLE_SERVICE_1);
        x.after_build_up_as::<StartableService, _>(ISTARTABLE, StartableService::start);
    })
    .unwrap();

    let service = container.resolve_as::<StartableService>(&named(ISTARTABLE), None).unwrap();
    assert!(service.start_was_called());
}

#[test]
fn test_call_method_on_interface_after_build_up_for_named_registrations() {
    let container = container();

    container.initialize(|x| {
        x.register(ISTARTABLE, STARTABLE_SERVICE_1).with_name("1");
        x.register(ISTARTABLE, STARTABLE_SERVICE_2).with_name("2");
        x.after_build_up_as::<StartableService, _>(ISTARTABLE, StartableService::start);
    })
    .unwrap();

    let first = container
        .resolve_as::<StartableService>(&named(ISTARTABLE), Some("1"))
        .unwrap();
    let second = container
        .resolve_as::<StartableService>(&named(ISTARTABLE), Some("2"))
        .unwrap();
    assert_eq!((first.kind, second.kind), ("1", "2"));
    assert!(first.start_was_called());
    assert!(second.start_was_called());
}

#[test]
fn test_explicit_registration_overrides_scan() {
    let container = container();

    container.initialize(|x| {
        x.register(IFOO_SERVICE, BAR_SERVICE);
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
        });
    })
    .unwrap();

    assert!(container.resolve(&named(IFOO_SERVICE), None).unwrap().is::<BarService>());
}

#[test]
fn test_conflicting_scan_passes_are_ambiguous() {
    let configure = |x: &mut di_impl::RegistryBuilder| {
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with::<FirstInterfaceConvention>();
            scan.include_type(FOO_SERVICE);
        });
        x.scan(|scan| {
            scan.module_containing(FOO_REGISTRY);
            scan.with_convention(FirstInterfaceConvention::new().ignoring(IBAR_SERVICE));
            scan.include_type(BAR_SERVICE);
        });
    };

    let strict = container();
    let error = strict.initialize(configure).unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::RegistrationError {
            source: RegistrationError::AmbiguousRegistration { .. }
        }
    ));
    assert!(!strict.is_registered(&named(IFOO_SERVICE), None));

    let lenient = container();
    ContainerInitializer::new()
        .with_options(RegistryOptions {
            allow_scan_overrides: true,
            ..RegistryOptions::default()
        })
        .initialize(&lenient, configure)
        .unwrap();
    assert!(lenient.resolve(&named(IFOO_SERVICE), None).unwrap().is::<BarService>());
}

#[test]
fn test_module_containing_unknown_type_fails() {
    let container = container();

    let error = container
        .initialize(|x| {
            x.scan(|scan| {
                scan.module_containing("Fixtures.Missing");
                scan.with::<FirstInterfaceConvention>();
            });
        })
        .unwrap_err();

    assert!(matches!(
        error,
        InfrastructureError::RegistrationError {
            source: RegistrationError::ModuleNotFound { .. }
        }
    ));
}

#[test]
fn test_initialize_with_logging() {
    let container = container();

    let report = ContainerInitializer::new()
        .with_logging(LoggingConfig::development())
        .initialize(&container, |x| {
            x.add_registry::<FooRegistry>();
            x.add_registry::<BarRegistry>();
        })
        .unwrap();

    assert_eq!(report.registrations, 2);
}
