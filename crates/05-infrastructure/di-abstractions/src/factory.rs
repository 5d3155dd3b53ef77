//! 组件工厂与构建后动作
//!
//! 工厂委托替代类型构造；构建后动作在实例构造完成、返回调用方之前执行

use crate::resolver::Resolver;
use infrastructure_common::{DependencyResult, Instance};
use std::any::Any;
use std::sync::Arc;

/// 组件工厂函数类型
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> DependencyResult<Instance> + Send + Sync>;

/// 构建后动作类型
pub type PostBuildAction = Arc<dyn Fn(&Instance) + Send + Sync>;

/// 包装工厂闭包
pub fn factory_fn<F>(factory: F) -> FactoryFn
where
    F: Fn(&dyn Resolver) -> DependencyResult<Instance> + Send + Sync + 'static,
{
    Arc::new(factory)
}

/// 总是返回同一个实例的工厂
pub fn instance_factory<T: Any + Send + Sync>(instance: Arc<T>) -> FactoryFn {
    Arc::new(move |_| Ok(Instance::from_arc(instance.clone())))
}

/// 类型化的构建后动作
///
/// 实例不是 `T` 时不执行。
pub fn typed_action<T, F>(action: F) -> PostBuildAction
where
    T: Any + Send + Sync,
    F: Fn(&T) + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance| {
        if let Some(value) = instance.downcast_ref::<T>() {
            action(value);
        }
    })
}
