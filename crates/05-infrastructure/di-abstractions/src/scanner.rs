//! 映射约定抽象接口
//!
//! 约定把扫描得到的候选类型映射为 (抽象类型, 实现类型) 对

use infrastructure_common::{TypeDescriptor, TypeRef};
use std::fmt;

/// 注册条目的成员方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// 以 (抽象类型, 名称) 为键的默认注册，同键只保留一个
    Keyed,
    /// 集合成员，以 (抽象类型, 实现类型) 为键，只参与批量解析
    Collection,
}

/// 映射对
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingPair {
    pub abstraction: TypeRef,
    pub implementation: TypeRef,
    pub membership: Membership,
}

impl MappingPair {
    /// 创建默认注册映射
    pub fn keyed(abstraction: TypeRef, implementation: TypeRef) -> Self {
        Self {
            abstraction,
            implementation,
            membership: Membership::Keyed,
        }
    }

    /// 创建集合成员映射
    pub fn collection(abstraction: TypeRef, implementation: TypeRef) -> Self {
        Self {
            abstraction,
            implementation,
            membership: Membership::Collection,
        }
    }

    /// 抽象类型、实现类型和成员方式是否都相同
    ///
    /// 默认注册与集合成员处于不同的键空间，成员方式不同的映射不视为重复。
    pub fn same_mapping(&self, other: &MappingPair) -> bool {
        self.membership == other.membership
            && self.abstraction == other.abstraction
            && self.implementation == other.implementation
    }
}

impl fmt::Display for MappingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.abstraction, self.implementation)
    }
}

/// 映射约定 trait
pub trait MappingConvention: Send + Sync {
    /// 约定名称
    fn name(&self) -> &str;

    /// 对候选类型应用约定，按候选顺序输出映射对
    fn apply(&self, candidates: &[TypeDescriptor]) -> Vec<MappingPair>;
}
