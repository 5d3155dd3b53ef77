//! 注册计划组装
//!
//! 按覆盖规则合并注册条目，再把类型级配置挂到匹配的条目上。

use di_abstractions::{
    ConstructorSpec, EntryOrigin, Implementation, PostBuildAction, RegistrationEntry,
    RegistrationKey, RegistrationPlan, ScopeHook, TypePolicy,
};
use infrastructure_common::{
    Lifetime, RegistrationError, RegistrationResult, RegistryOptions, TypeRef,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// 合并结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 新键
    Added,
    /// 替换了已有条目
    Replaced,
    /// 保留已有条目，丢弃新条目
    Kept,
}

/// 按覆盖规则合并条目
///
/// - 显式条目替换同键的任何条目
/// - 扫描条目不替换显式条目
/// - 同一次扫描内后者替换前者
/// - 不同扫描之间实现相同视为重复，否则报告注册冲突（除非允许扫描覆盖）
#[derive(Debug, Default)]
pub struct EntryMerger {
    allow_scan_overrides: bool,
    entries: Vec<RegistrationEntry>,
    index: HashMap<RegistrationKey, usize>,
}

impl EntryMerger {
    /// 按注册选项决定跨批次冲突的处理方式
    pub fn new(options: &RegistryOptions) -> Self {
        Self {
            allow_scan_overrides: options.allow_scan_overrides,
            ..Self::default()
        }
    }

    /// 合并一个条目，返回对已有条目的影响
    pub fn merge(&mut self, incoming: RegistrationEntry) -> RegistrationResult<MergeOutcome> {
        let key = incoming.key();
        let Some(&position) = self.index.get(&key) else {
            self.index.insert(key, self.entries.len());
            self.entries.push(incoming);
            return Ok(MergeOutcome::Added);
        };

        let existing = &self.entries[position];
        let replace = match (existing.origin, incoming.origin) {
            (_, EntryOrigin::Explicit) => true,
            (EntryOrigin::Explicit, EntryOrigin::Scanned { .. }) => false,
            (EntryOrigin::Scanned { pass: earlier }, EntryOrigin::Scanned { pass: later }) => {
                if earlier == later {
                    if !same_implementation(&existing.implementation, &incoming.implementation) {
                        warn!(
                            "同一扫描批次内 {} 的映射被替换: {} -> {}",
                            incoming.abstraction,
                            existing.implementation.describe(),
                            incoming.implementation.describe()
                        );
                    }
                    true
                } else if same_implementation(&existing.implementation, &incoming.implementation) {
                    false
                } else if self.allow_scan_overrides {
                    true
                } else {
                    return Err(RegistrationError::AmbiguousRegistration {
                        abstraction: incoming.abstraction.to_string(),
                        name: incoming.name.clone(),
                        existing: existing.implementation.describe(),
                        conflicting: incoming.implementation.describe(),
                    });
                }
            }
        };

        if replace {
            debug!(
                "注册 {} 覆盖 {}: {} -> {}",
                incoming.id,
                existing.id,
                incoming.abstraction,
                incoming.implementation.describe()
            );
            self.entries[position] = incoming;
            Ok(MergeOutcome::Replaced)
        } else {
            debug!(
                "保留注册 {}, 忽略 {}: {} -> {}",
                existing.id,
                incoming.id,
                incoming.abstraction,
                incoming.implementation.describe()
            );
            Ok(MergeOutcome::Kept)
        }
    }

    /// 按首次出现顺序返回合并后的条目
    pub fn into_entries(self) -> Vec<RegistrationEntry> {
        self.entries
    }
}

fn same_implementation(left: &Implementation, right: &Implementation) -> bool {
    match (left.type_ref(), right.type_ref()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// 构建器累积的类型级配置
#[derive(Default)]
pub struct TypeConfiguration {
    pub singletons: Vec<TypeRef>,
    pub constructors: Vec<(TypeRef, ConstructorSpec)>,
    pub hooks: Vec<(TypeRef, PostBuildAction)>,
}

/// 取得指定实现类型的策略，不存在时创建
fn policy_mut<'p>(
    policies: &'p mut Vec<TypePolicy>,
    implementation: &TypeRef,
) -> &'p mut TypePolicy {
    let position = match policies
        .iter()
        .position(|policy| &policy.implementation == implementation)
    {
        Some(position) => position,
        None => {
            policies.push(TypePolicy::new(implementation.clone()));
            policies.len() - 1
        }
    };
    &mut policies[position]
}

/// 把类型级配置挂到条目上，没有匹配条目的配置转为作用域策略；构建后动作总是同时作为作用域钩子
pub fn attach_type_configuration(
    entries: &mut [RegistrationEntry],
    configuration: TypeConfiguration,
) -> (Vec<TypePolicy>, Vec<ScopeHook>) {
    let mut policies = Vec::new();
    let mut hooks = Vec::new();

    for concrete in configuration.singletons {
        let mut matched = false;
        for entry in entries.iter_mut().filter(|entry| entry.implements_type(&concrete)) {
            entry.lifetime = Lifetime::Singleton;
            matched = true;
        }
        if !matched {
            debug!("单例配置没有匹配的注册, 作为作用域策略: {}", concrete);
            policy_mut(&mut policies, &concrete).lifetime = Some(Lifetime::Singleton);
        }
    }

    for (concrete, spec) in configuration.constructors {
        let mut matched = false;
        for entry in entries.iter_mut().filter(|entry| entry.implements_type(&concrete)) {
            entry.constructor = Some(spec.clone());
            matched = true;
        }
        if !matched {
            debug!("构造函数配置没有匹配的注册, 作为作用域策略: {}", concrete);
            policy_mut(&mut policies, &concrete).constructor = Some(spec);
        }
    }

    // 构建后动作同时作为作用域钩子，自动解析或作为依赖构建的实例也会执行；
    // 容器对同一次构建跳过已作为注册动作执行过的钩子
    for (target, action) in configuration.hooks {
        let mut matched = 0;
        for entry in entries.iter_mut().filter(|entry| entry.targets(&target)) {
            entry.post_build_actions.push(action.clone());
            matched += 1;
        }
        debug!("构建后动作 {}: 匹配注册 {}, 同时作为作用域钩子", target, matched);
        hooks.push(ScopeHook { target, action });
    }

    (policies, hooks)
}

/// 组装注册计划
pub fn assemble(
    entries: Vec<RegistrationEntry>,
    configuration: TypeConfiguration,
    options: &RegistryOptions,
) -> RegistrationResult<RegistrationPlan> {
    let mut merger = EntryMerger::new(options);
    for entry in entries {
        merger.merge(entry)?;
    }

    let mut entries = merger.into_entries();
    let (policies, hooks) = attach_type_configuration(&mut entries, configuration);

    Ok(RegistrationPlan {
        entries,
        policies,
        hooks,
        ..RegistrationPlan::default()
    })
}
