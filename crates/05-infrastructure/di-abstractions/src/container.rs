//! 底层容器边界
//!
//! 容器适配器把注册计划翻译为这里定义的原生命令

use crate::factory::{FactoryFn, PostBuildAction};
use crate::registry::CtorArg;
use crate::resolver::Resolver;
use crate::scanner::Membership;
use infrastructure_common::{Instance, Lifetime, ScopeInfo, TypeCatalog, TypeModule, TypeRef};
use std::fmt;
use std::sync::Arc;

/// 构造函数计划
#[derive(Debug, Clone, Default)]
pub enum ConstructorPlan {
    /// 由容器按默认规则选择
    #[default]
    Heuristic,
    /// 已选定的构造函数，参数按位置给出
    Selected {
        parameters: Vec<TypeRef>,
        arguments: Vec<CtorArg>,
    },
}

/// 激活方式
#[derive(Clone)]
pub enum NativeActivation {
    Type {
        implementation: TypeRef,
        constructor: ConstructorPlan,
    },
    Factory(FactoryFn),
}

impl fmt::Debug for NativeActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type {
                implementation,
                constructor,
            } => f
                .debug_struct("Type")
                .field("implementation", implementation)
                .field("constructor", constructor)
                .finish(),
            Self::Factory(_) => f.write_str("Factory(<function>)"),
        }
    }
}

/// 原生注册命令
#[derive(Clone)]
pub struct NativeRegistration {
    pub abstraction: TypeRef,
    pub name: Option<String>,
    pub membership: Membership,
    pub lifetime: Lifetime,
    pub activation: NativeActivation,
    pub post_build_actions: Vec<PostBuildAction>,
}

impl NativeRegistration {
    /// 具体实现类型；工厂注册返回 `None`
    pub fn implementation(&self) -> Option<&TypeRef> {
        match &self.activation {
            NativeActivation::Type { implementation, .. } => Some(implementation),
            NativeActivation::Factory(_) => None,
        }
    }
}

impl fmt::Debug for NativeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRegistration")
            .field("abstraction", &self.abstraction)
            .field("name", &self.name)
            .field("membership", &self.membership)
            .field("lifetime", &self.lifetime)
            .field("activation", &self.activation)
            .field("post_build_actions", &self.post_build_actions.len())
            .finish()
    }
}

/// 作用域级类型策略
#[derive(Debug, Clone, Default)]
pub struct NativeTypePolicy {
    pub lifetime: Option<Lifetime>,
    pub constructor: Option<ConstructorPlan>,
}

/// 容器扩展 trait
///
/// 添加到容器时调用 `initialize`，每个实例构建完成后调用 `on_build_up`。
pub trait ContainerExtension: Send + Sync {
    /// 扩展名称
    fn name(&self) -> &str;

    fn initialize(&self, _scope: &ScopeInfo) {}

    fn on_build_up(&self, _abstraction: &TypeRef, _instance: &Instance) {}
}

/// 底层容器 trait
pub trait NativeContainer: Resolver {
    /// 当前作用域信息
    fn scope(&self) -> &ScopeInfo;

    /// 容器可见的类型索引
    fn catalog(&self) -> Arc<TypeCatalog>;

    /// 向类型索引添加模块
    fn add_module(&self, module: Arc<dyn TypeModule>);

    /// 在当前作用域写入注册
    fn register(&self, registration: NativeRegistration);

    /// 设置当前作用域的类型策略，与已有策略合并
    fn set_type_policy(&self, implementation: TypeRef, policy: NativeTypePolicy);

    /// 添加当前作用域的构建后钩子
    fn add_post_build_action(&self, target: TypeRef, action: PostBuildAction);

    /// 添加扩展
    fn add_extension(&self, extension: Arc<dyn ContainerExtension>);

    /// 创建子作用域
    fn create_child_scope(&self) -> Self
    where
        Self: Sized;
}
