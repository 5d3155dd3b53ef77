//! 内置映射约定
//!
//! - [`FirstInterfaceConvention`] - 具体类映射到第一个声明的接口
//! - [`AddAllConvention`] - 目标抽象类型的所有实现作为集合成员
//! - [`ExplicitInterfacesConvention`] - 调用方指定抽象类型列表

use di_abstractions::{MappingConvention, MappingPair};
use infrastructure_common::{TypeDescriptor, TypeRef};
use tracing::debug;

/// 第一个接口约定
///
/// 每个具体类映射到它声明的第一个接口（跳过标记接口），产生默认注册。
/// 开放泛型实现映射到对应接口的开放形态。
#[derive(Debug, Clone, Default)]
pub struct FirstInterfaceConvention {
    ignored: Vec<TypeRef>,
}

impl FirstInterfaceConvention {
    /// 不忽略任何接口
    pub fn new() -> Self {
        Self::default()
    }

    /// 选择第一个接口时跳过指定的标记接口
    pub fn ignoring(mut self, marker: impl Into<TypeRef>) -> Self {
        self.ignored.push(marker.into());
        self
    }

    fn is_ignored(&self, interface: &TypeRef) -> bool {
        self.ignored.iter().any(|marker| {
            marker == interface || interface.generic_definition().as_ref() == Some(marker)
        })
    }

    fn first_interface(&self, candidate: &TypeDescriptor) -> Option<TypeRef> {
        let interface = candidate
            .interfaces()
            .iter()
            .find(|interface| !self.is_ignored(interface))?;

        if !candidate.is_generic_definition() {
            return Some(interface.clone());
        }

        // 开放泛型实现只能按开放形态注册，参数个数必须一致才能代入
        let definition = interface.generic_definition()?;
        (definition.arity() == candidate.type_ref().arity()).then_some(definition)
    }
}

impl MappingConvention for FirstInterfaceConvention {
    fn name(&self) -> &str {
        "FirstInterfaceConvention"
    }

    fn apply(&self, candidates: &[TypeDescriptor]) -> Vec<MappingPair> {
        candidates
            .iter()
            .filter(|candidate| candidate.is_concrete())
            .filter_map(|candidate| match self.first_interface(candidate) {
                Some(abstraction) => {
                    Some(MappingPair::keyed(abstraction, candidate.type_ref().clone()))
                }
                None => {
                    debug!("跳过没有可用接口的类型: {}", candidate.full_name());
                    None
                }
            })
            .collect()
    }
}

/// 确定候选类型作为 `target` 的实现时使用的抽象类型
///
/// 目标为开放泛型而候选是封闭实现时，使用候选声明的封闭接口。
fn abstraction_for(candidate: &TypeDescriptor, target: &TypeRef) -> Option<TypeRef> {
    if candidate.type_ref() == target {
        return Some(target.clone());
    }

    candidate.interfaces().iter().find_map(|interface| {
        if interface == target {
            return Some(target.clone());
        }
        if target.is_open() && interface.generic_definition().as_ref() == Some(target) {
            return Some(if candidate.is_generic_definition() {
                target.clone()
            } else {
                interface.clone()
            });
        }
        None
    })
}

/// 全部实现约定
///
/// 目标抽象类型的每个具体实现都产生一个集合成员，不分配名称。
#[derive(Debug, Clone)]
pub struct AddAllConvention {
    target: TypeRef,
}

impl AddAllConvention {
    /// 收集实现 `target` 的所有具体类；`target` 可以是开放泛型
    pub fn new(target: impl Into<TypeRef>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// 目标抽象类型
    pub fn target(&self) -> &TypeRef {
        &self.target
    }
}

impl MappingConvention for AddAllConvention {
    fn name(&self) -> &str {
        "AddAllConvention"
    }

    fn apply(&self, candidates: &[TypeDescriptor]) -> Vec<MappingPair> {
        candidates
            .iter()
            .filter(|candidate| candidate.is_concrete())
            .filter_map(|candidate| {
                abstraction_for(candidate, &self.target).map(|abstraction| {
                    MappingPair::collection(abstraction, candidate.type_ref().clone())
                })
            })
            .collect()
    }
}

/// 显式接口列表约定
///
/// 与 [`AddAllConvention`] 相同，但一次处理调用方列出的多个抽象类型。
#[derive(Debug, Clone, Default)]
pub struct ExplicitInterfacesConvention {
    interfaces: Vec<TypeRef>,
}

impl ExplicitInterfacesConvention {
    /// 只映射列出的接口
    pub fn new(interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            interfaces: interfaces.into_iter().collect(),
        }
    }

    /// 追加一个接口
    pub fn with_interface(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

impl MappingConvention for ExplicitInterfacesConvention {
    fn name(&self) -> &str {
        "ExplicitInterfacesConvention"
    }

    fn apply(&self, candidates: &[TypeDescriptor]) -> Vec<MappingPair> {
        let mut pairs = Vec::new();
        for candidate in candidates.iter().filter(|candidate| candidate.is_concrete()) {
            for interface in &self.interfaces {
                if let Some(abstraction) = abstraction_for(candidate, interface) {
                    pairs.push(MappingPair::collection(abstraction, candidate.type_ref().clone()));
                }
            }
        }
        pairs
    }
}
