//! 注册条目模型
//!
//! 构建器累积的注册条目、类型级策略和注册计划

use crate::container::ContainerExtension;
use crate::factory::{FactoryFn, PostBuildAction};
use crate::scanner::Membership;
use infrastructure_common::{format_signature, Instance, Lifetime, TypeModule, TypeRef};
use std::fmt;
use std::sync::Arc;

/// 注册条目标识，由构建器按创建顺序分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 注册条目来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryOrigin {
    /// 调用方显式注册
    Explicit,
    /// 第 `pass` 次扫描产生
    Scanned { pass: usize },
}

impl EntryOrigin {
    /// 是否来自显式注册
    pub fn is_explicit(self) -> bool {
        matches!(self, Self::Explicit)
    }
}

/// 实现方式：具体类型或工厂委托
#[derive(Clone)]
pub enum Implementation {
    Type(TypeRef),
    Factory(FactoryFn),
}

impl Implementation {
    /// 具体实现类型；工厂返回 `None`
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(type_ref) => Some(type_ref),
            Self::Factory(_) => None,
        }
    }

    /// 可读描述
    pub fn describe(&self) -> String {
        match self {
            Self::Type(type_ref) => type_ref.to_string(),
            Self::Factory(_) => "<factory>".to_string(),
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_ref) => f.debug_tuple("Type").field(type_ref).finish(),
            Self::Factory(_) => f.write_str("Factory(<function>)"),
        }
    }
}

/// 构造参数
///
/// 字面值原样传入；占位符在构造时从容器解析。
#[derive(Debug, Clone)]
pub enum CtorArg {
    Value(Instance),
    Resolve(TypeRef),
}

impl CtorArg {
    /// 字面值参数
    pub fn value<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Self::Value(Instance::new(value))
    }

    /// 从容器解析的占位参数
    pub fn resolve(abstraction: impl Into<TypeRef>) -> Self {
        Self::Resolve(abstraction.into())
    }
}

impl From<TypeRef> for CtorArg {
    fn from(abstraction: TypeRef) -> Self {
        Self::Resolve(abstraction)
    }
}

impl From<Instance> for CtorArg {
    fn from(value: Instance) -> Self {
        Self::Value(value)
    }
}

/// 构造函数选择
#[derive(Debug, Clone)]
pub enum ConstructorSpec {
    /// 使用参数个数等于参数列表长度的构造函数
    Arguments(Vec<CtorArg>),
    /// 使用签名完全一致的构造函数，参数全部从容器解析
    Signature(Vec<TypeRef>),
}

impl ConstructorSpec {
    /// 可读描述，用于错误信息
    pub fn describe(&self) -> String {
        match self {
            Self::Arguments(arguments) => format!("(参数个数 {})", arguments.len()),
            Self::Signature(parameters) => format_signature(parameters),
        }
    }
}

/// 覆盖规则使用的注册键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistrationKey {
    /// 默认注册：(抽象类型, 名称)
    Keyed {
        abstraction: TypeRef,
        name: Option<String>,
    },
    /// 集合成员：(抽象类型, 实现)
    Member {
        abstraction: TypeRef,
        implementation: String,
    },
}

/// 注册条目
#[derive(Clone)]
pub struct RegistrationEntry {
    pub id: EntryId,
    pub abstraction: TypeRef,
    pub implementation: Implementation,
    pub lifetime: Lifetime,
    pub name: Option<String>,
    pub membership: Membership,
    pub origin: EntryOrigin,
    pub constructor: Option<ConstructorSpec>,
    pub post_build_actions: Vec<PostBuildAction>,
}

impl RegistrationEntry {
    /// 创建瞬时、未命名的默认注册条目
    pub fn new(
        id: EntryId,
        abstraction: TypeRef,
        implementation: Implementation,
        origin: EntryOrigin,
    ) -> Self {
        Self {
            id,
            abstraction,
            implementation,
            lifetime: Lifetime::Transient,
            name: None,
            membership: Membership::Keyed,
            origin,
            constructor: None,
            post_build_actions: Vec::new(),
        }
    }

    /// 设置成员方式
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    /// 具体实现类型
    pub fn implementation_type(&self) -> Option<&TypeRef> {
        self.implementation.type_ref()
    }

    /// 覆盖规则使用的键
    pub fn key(&self) -> RegistrationKey {
        match self.membership {
            Membership::Keyed => RegistrationKey::Keyed {
                abstraction: self.abstraction.clone(),
                name: self.name.clone(),
            },
            Membership::Collection => RegistrationKey::Member {
                abstraction: self.abstraction.clone(),
                implementation: match &self.implementation {
                    Implementation::Type(type_ref) => type_ref.to_string(),
                    Implementation::Factory(_) => format!("<factory{}>", self.id),
                },
            },
        }
    }

    /// 实现类型与 `target` 的泛型定义一致
    pub fn implements_type(&self, target: &TypeRef) -> bool {
        self.implementation_type()
            .is_some_and(|implementation| same_definition(implementation, target))
    }

    /// 抽象类型或实现类型为 `target`
    pub fn targets(&self, target: &TypeRef) -> bool {
        same_definition(&self.abstraction, target) || self.implements_type(target)
    }
}

/// 按类型身份比较；开放泛型与同一定义的开放形态相等
fn same_definition(left: &TypeRef, right: &TypeRef) -> bool {
    left == right
        || (left.is_open() && right.is_open() && left.definition_name() == right.definition_name())
}

impl fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("id", &self.id)
            .field("abstraction", &self.abstraction)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .field("name", &self.name)
            .field("membership", &self.membership)
            .field("origin", &self.origin)
            .field("constructor", &self.constructor)
            .field("post_build_actions", &self.post_build_actions.len())
            .finish()
    }
}

/// 作用域级策略
///
/// 构建器中没有任何条目使用该实现类型时，类型级配置落为策略，由容器在当前作用域内执行。
#[derive(Debug, Clone)]
pub struct TypePolicy {
    pub implementation: TypeRef,
    pub lifetime: Option<Lifetime>,
    pub constructor: Option<ConstructorSpec>,
}

impl TypePolicy {
    /// 不覆盖生命周期与构造函数的策略
    pub fn new(implementation: TypeRef) -> Self {
        Self {
            implementation,
            lifetime: None,
            constructor: None,
        }
    }
}

/// 作用域级构建后钩子
#[derive(Clone)]
pub struct ScopeHook {
    pub target: TypeRef,
    pub action: PostBuildAction,
}

impl fmt::Debug for ScopeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeHook")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// 注册计划
///
/// 构建器 `build()` 的产物，由容器适配器一次性应用。
#[derive(Default)]
pub struct RegistrationPlan {
    pub entries: Vec<RegistrationEntry>,
    pub policies: Vec<TypePolicy>,
    pub hooks: Vec<ScopeHook>,
    pub extensions: Vec<Arc<dyn ContainerExtension>>,
    /// 扫描过的模块，应用时加入容器的类型索引
    pub modules: Vec<Arc<dyn TypeModule>>,
}

impl RegistrationPlan {
    /// 计划是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.modules.is_empty()
            && self.policies.is_empty()
            && self.hooks.is_empty()
            && self.extensions.is_empty()
    }

    /// 查找抽象类型与名称一致的默认注册
    pub fn find(&self, abstraction: &TypeRef, name: Option<&str>) -> Option<&RegistrationEntry> {
        self.entries.iter().find(|entry| {
            entry.membership == Membership::Keyed
                && &entry.abstraction == abstraction
                && entry.name.as_deref() == name
        })
    }

    /// 指定抽象类型的所有条目（按计划顺序）
    pub fn entries_for<'a>(
        &'a self,
        abstraction: &'a TypeRef,
    ) -> impl Iterator<Item = &'a RegistrationEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| &entry.abstraction == abstraction)
    }
}

impl fmt::Debug for RegistrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationPlan")
            .field("entries", &self.entries)
            .field("policies", &self.policies)
            .field("hooks", &self.hooks)
            .field("extensions", &self.extensions.len())
            .field("modules", &self.modules.iter().map(|module| module.name()).collect::<Vec<_>>())
            .finish()
    }
}
