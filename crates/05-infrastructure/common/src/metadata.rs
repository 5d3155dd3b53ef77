//! 类型元数据定义
//!
//! 提供类型引用（含泛型开放/封闭形态）和类型描述符。描述符由宿主的反射设施提供，
//! 注册层只读取，不修改。

use crate::component::{Activation, Instance};
use crate::errors::DependencyResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 类型引用
///
/// 区分非泛型类型、开放泛型定义（未绑定类型参数）和封闭泛型（已绑定具体类型参数）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    /// 非泛型类型
    Named(String),
    /// 开放泛型定义，例如 `IHandler<>`
    Open {
        /// 泛型定义的完整名称
        definition: String,
        /// 类型参数个数
        arity: usize,
    },
    /// 封闭泛型，例如 `IHandler<Message>`
    Closed {
        /// 泛型定义的完整名称
        definition: String,
        /// 具体类型参数
        arguments: Vec<TypeRef>,
    },
}

impl TypeRef {
    /// 创建非泛型类型引用
    pub fn named(full_name: impl Into<String>) -> Self {
        Self::Named(full_name.into())
    }

    /// 创建开放泛型类型引用
    pub fn open(definition: impl Into<String>, arity: usize) -> Self {
        Self::Open {
            definition: definition.into(),
            arity,
        }
    }

    /// 创建封闭泛型类型引用
    pub fn closed(
        definition: impl Into<String>,
        arguments: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        Self::Closed {
            definition: definition.into(),
            arguments: arguments.into_iter().collect(),
        }
    }

    /// 类型（或泛型定义）的完整名称
    pub fn definition_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Open { definition, .. } | Self::Closed { definition, .. } => definition,
        }
    }

    /// 不含命名空间的短名称
    pub fn short_name(&self) -> &str {
        let name = self.definition_name();
        name.rsplit('.').next().unwrap_or(name)
    }

    /// 命名空间（完整名称最后一个 `.` 之前的部分）
    pub fn namespace(&self) -> &str {
        let name = self.definition_name();
        name.rfind('.').map_or("", |index| &name[..index])
    }

    /// 是否为泛型（开放或封闭）
    pub fn is_generic(&self) -> bool {
        !matches!(self, Self::Named(_))
    }

    /// 是否为开放泛型定义
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// 泛型参数个数，非泛型为 0
    pub fn arity(&self) -> usize {
        match self {
            Self::Named(_) => 0,
            Self::Open { arity, .. } => *arity,
            Self::Closed { arguments, .. } => arguments.len(),
        }
    }

    /// 封闭泛型的类型参数
    pub fn type_arguments(&self) -> &[TypeRef] {
        match self {
            Self::Closed { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// 获取泛型定义（开放形态）
    ///
    /// 非泛型类型返回 `None`。
    pub fn generic_definition(&self) -> Option<TypeRef> {
        match self {
            Self::Named(_) => None,
            Self::Open { .. } => Some(self.clone()),
            Self::Closed {
                definition,
                arguments,
            } => Some(Self::open(definition.clone(), arguments.len())),
        }
    }

    /// 用具体类型参数封闭开放泛型；参数个数不符时返回 `None`
    pub fn close_with(&self, arguments: &[TypeRef]) -> Option<TypeRef> {
        match self {
            Self::Open { definition, arity } if *arity == arguments.len() => {
                Some(Self::closed(definition.clone(), arguments.iter().cloned()))
            }
            _ => None,
        }
    }

    /// 以本类型作为注册的抽象类型时，能否满足 `requested` 请求
    pub fn can_satisfy(&self, requested: &TypeRef) -> bool {
        can_satisfy(requested, self)
    }
}

/// 判断注册类型 `registered` 能否满足请求类型 `requested`
///
/// 完全相同时匹配；开放泛型定义匹配同一定义、参数个数一致的任意封闭形态。
pub fn can_satisfy(requested: &TypeRef, registered: &TypeRef) -> bool {
    if requested == registered {
        return true;
    }

    match (requested, registered) {
        (
            TypeRef::Closed {
                definition: requested_definition,
                arguments,
            },
            TypeRef::Open { definition, arity },
        ) => requested_definition == definition && arguments.len() == *arity,
        _ => false,
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Open { definition, arity } => {
                write!(f, "{definition}<{}>", ",".repeat(arity.saturating_sub(1)))
            }
            Self::Closed {
                definition,
                arguments,
            } => {
                write!(f, "{definition}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ">")
            }
        }
    }
}

impl From<&str> for TypeRef {
    fn from(full_name: &str) -> Self {
        Self::named(full_name)
    }
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// 接口（抽象类型）
    Interface,
    /// 可实例化的具体类
    Class,
    /// 抽象类，不可实例化
    AbstractClass,
}

/// 构造函数激活器类型
pub type Activator = Arc<dyn Fn(&Activation<'_>) -> DependencyResult<Instance> + Send + Sync>;

/// 构造函数信息
#[derive(Clone)]
pub struct ConstructorInfo {
    /// 参数类型列表（按声明顺序）
    pub parameters: Vec<TypeRef>,
    /// 实例激活器
    pub activator: Activator,
}

impl ConstructorInfo {
    /// 创建新的构造函数信息
    pub fn new<F>(parameters: impl IntoIterator<Item = TypeRef>, activator: F) -> Self
    where
        F: Fn(&Activation<'_>) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into_iter().collect(),
            activator: Arc::new(activator),
        }
    }

    /// 泛型参数个数；非泛型为 0
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// 构造函数签名的可读形式，例如 `(System.String, IFooService)`
    pub fn signature(&self) -> String {
        format_signature(&self.parameters)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("parameters", &self.parameters)
            .field("activator", &"<function>")
            .finish()
    }
}

/// 格式化参数类型列表
pub fn format_signature(parameters: &[TypeRef]) -> String {
    let parts: Vec<String> = parameters.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

/// 类型描述符
///
/// 宿主反射设施报告的只读类型信息。接口顺序即声明顺序。
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_ref: TypeRef,
    namespace: String,
    kind: TypeKind,
    interfaces: Vec<TypeRef>,
    constructors: Vec<ConstructorInfo>,
}

impl TypeDescriptor {
    fn with_kind(type_ref: TypeRef, kind: TypeKind) -> Self {
        Self {
            namespace: type_ref.namespace().to_string(),
            type_ref,
            kind,
            interfaces: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// 具体类
    pub fn class(full_name: impl Into<String>) -> Self {
        Self::with_kind(TypeRef::named(full_name), TypeKind::Class)
    }

    /// 开放泛型具体类，例如 `Repository<T>`
    pub fn generic_class(full_name: impl Into<String>, arity: usize) -> Self {
        Self::with_kind(TypeRef::open(full_name, arity), TypeKind::Class)
    }

    /// 抽象类
    pub fn abstract_class(full_name: impl Into<String>) -> Self {
        Self::with_kind(TypeRef::named(full_name), TypeKind::AbstractClass)
    }

    /// 接口
    pub fn interface(full_name: impl Into<String>) -> Self {
        Self::with_kind(TypeRef::named(full_name), TypeKind::Interface)
    }

    /// 开放泛型接口
    pub fn generic_interface(full_name: impl Into<String>, arity: usize) -> Self {
        Self::with_kind(TypeRef::open(full_name, arity), TypeKind::Interface)
    }

    /// 追加一个直接实现的接口
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// 覆盖由名称推导出的命名空间
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// 追加构造函数
    pub fn with_constructor<F>(
        mut self,
        parameters: impl IntoIterator<Item = TypeRef>,
        activator: F,
    ) -> Self
    where
        F: Fn(&Activation<'_>) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorInfo::new(parameters, activator));
        self
    }

    /// 追加无参构造函数
    pub fn with_default_constructor<T, F>(self, create: F) -> Self
    where
        T: std::any::Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.with_constructor(Vec::new(), move |_| Ok(Instance::new(create())))
    }

    /// 描述符对应的类型引用；泛型定义为开放形态
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// 包含命名空间的完整名称
    pub fn full_name(&self) -> &str {
        self.type_ref.definition_name()
    }

    /// 去掉命名空间的短名称
    pub fn name(&self) -> &str {
        self.type_ref.short_name()
    }

    /// 命名空间；没有命名空间时为空字符串
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 类型种类
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 是否可实例化
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Class
    }

    /// 是否为开放泛型定义
    pub fn is_generic_definition(&self) -> bool {
        self.type_ref.is_open()
    }

    /// 直接实现的接口（声明顺序）
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// 声明的构造函数
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// 查找参数个数为 `arity` 的第一个构造函数
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&ConstructorInfo> {
        self.constructors.iter().find(|ctor| ctor.arity() == arity)
    }

    /// 查找签名完全一致的构造函数
    pub fn constructor_matching(&self, parameters: &[TypeRef]) -> Option<&ConstructorInfo> {
        self.constructors
            .iter()
            .find(|ctor| ctor.parameters.as_slice() == parameters)
    }

    /// 本类型能否作为 `abstraction` 的实现
    ///
    /// 自身类型、直接声明的接口，或声明接口的泛型定义与开放的 `abstraction` 一致。
    pub fn is_assignable_to(&self, abstraction: &TypeRef) -> bool {
        if &self.type_ref == abstraction {
            return true;
        }

        self.interfaces.iter().any(|interface| {
            interface == abstraction
                || (abstraction.is_open()
                    && interface.generic_definition().as_ref() == Some(abstraction))
        })
    }
}
