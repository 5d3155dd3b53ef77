//! 容器适配器
//!
//! 先校验并翻译整个注册计划，全部成功后才向容器发出命令，失败时容器保持不变。

use di_abstractions::{
    ConstructorPlan, ConstructorSpec, CtorArg, Implementation, NativeActivation, NativeContainer,
    NativeRegistration, NativeTypePolicy, RegistrationEntry, RegistrationPlan, TypePolicy,
};
use infrastructure_common::{
    format_signature, RegistrationError, RegistrationResult, TypeCatalog, TypeDescriptor, TypeRef,
};
use tracing::{debug, info};

/// 应用报告
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub registrations: usize,
    pub policies: usize,
    pub hooks: usize,
    pub extensions: usize,
    pub modules: usize,
}

/// 容器适配器
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerAdapter;

impl ContainerAdapter {
    /// 把注册计划应用到容器
    pub fn apply<C>(container: &C, plan: RegistrationPlan) -> RegistrationResult<ApplyReport>
    where
        C: NativeContainer + ?Sized,
    {
        // 校验使用容器已有的类型加上计划扫描过的模块
        let mut catalog = TypeCatalog::clone(&container.catalog());
        for module in &plan.modules {
            catalog.add_module(module.clone());
        }

        let registrations = plan
            .entries
            .iter()
            .map(|entry| translate_entry(&catalog, entry))
            .collect::<RegistrationResult<Vec<_>>>()?;
        let policies = plan
            .policies
            .iter()
            .map(|policy| translate_policy(&catalog, policy))
            .collect::<RegistrationResult<Vec<_>>>()?;

        let report = ApplyReport {
            registrations: registrations.len(),
            policies: policies.len(),
            hooks: plan.hooks.len(),
            extensions: plan.extensions.len(),
            modules: plan.modules.len(),
        };

        for module in plan.modules {
            container.add_module(module);
        }
        for registration in registrations {
            debug!(
                "应用注册: {} (名称: {:?}, 生命周期: {:?})",
                registration.abstraction, registration.name, registration.lifetime
            );
            container.register(registration);
        }
        for (implementation, policy) in policies {
            debug!("应用作用域策略: {}", implementation);
            container.set_type_policy(implementation, policy);
        }
        for hook in plan.hooks {
            container.add_post_build_action(hook.target, hook.action);
        }
        for extension in plan.extensions {
            debug!("添加容器扩展: {}", extension.name());
            container.add_extension(extension);
        }

        info!(
            "注册计划已应用到作用域 {}: 注册 {}, 策略 {}, 钩子 {}, 扩展 {}",
            container.scope().name,
            report.registrations,
            report.policies,
            report.hooks,
            report.extensions
        );
        Ok(report)
    }
}

/// 查找具体实现类型的描述符
fn describe_concrete<'c>(
    catalog: &'c TypeCatalog,
    implementation: &TypeRef,
) -> RegistrationResult<&'c TypeDescriptor> {
    catalog
        .describe(implementation)
        .filter(|descriptor| descriptor.is_concrete())
        .ok_or_else(|| RegistrationError::UnknownType {
            type_name: implementation.to_string(),
        })
}

/// 把构造函数配置翻译为已选定的构造函数
fn translate_constructor(
    descriptor: &TypeDescriptor,
    implementation: &TypeRef,
    spec: &ConstructorSpec,
) -> RegistrationResult<ConstructorPlan> {
    let not_found = |signature: String| RegistrationError::ConstructorNotFound {
        type_name: implementation.to_string(),
        signature,
    };

    match spec {
        ConstructorSpec::Arguments(arguments) => {
            let constructor = descriptor
                .constructor_with_arity(arguments.len())
                .ok_or_else(|| not_found(spec.describe()))?;
            Ok(ConstructorPlan::Selected {
                parameters: constructor.parameters.clone(),
                arguments: arguments.clone(),
            })
        }
        ConstructorSpec::Signature(parameters) => {
            descriptor
                .constructor_matching(parameters)
                .ok_or_else(|| not_found(format_signature(parameters)))?;
            Ok(ConstructorPlan::Selected {
                parameters: parameters.clone(),
                arguments: parameters.iter().cloned().map(CtorArg::Resolve).collect(),
            })
        }
    }
}

fn translate_entry(
    catalog: &TypeCatalog,
    entry: &RegistrationEntry,
) -> RegistrationResult<NativeRegistration> {
    let activation = match &entry.implementation {
        Implementation::Type(implementation) => {
            let descriptor = describe_concrete(catalog, implementation)?;
            let constructor = match &entry.constructor {
                Some(spec) => translate_constructor(descriptor, implementation, spec)?,
                None => ConstructorPlan::Heuristic,
            };
            NativeActivation::Type {
                implementation: implementation.clone(),
                constructor,
            }
        }
        Implementation::Factory(factory) => NativeActivation::Factory(factory.clone()),
    };

    Ok(NativeRegistration {
        abstraction: entry.abstraction.clone(),
        name: entry.name.clone(),
        membership: entry.membership,
        lifetime: entry.lifetime,
        activation,
        post_build_actions: entry.post_build_actions.clone(),
    })
}

fn translate_policy(
    catalog: &TypeCatalog,
    policy: &TypePolicy,
) -> RegistrationResult<(TypeRef, NativeTypePolicy)> {
    let constructor = match &policy.constructor {
        Some(spec) => {
            let descriptor = describe_concrete(catalog, &policy.implementation)?;
            Some(translate_constructor(descriptor, &policy.implementation, spec)?)
        }
        None => None,
    };

    Ok((
        policy.implementation.clone(),
        NativeTypePolicy {
            lifetime: policy.lifetime,
            constructor,
        },
    ))
}
