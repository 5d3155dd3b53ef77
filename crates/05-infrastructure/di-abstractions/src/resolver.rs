//! 组件解析器抽象接口
//!
//! 提供按抽象类型和名称解析组件实例的能力

use infrastructure_common::{DependencyError, DependencyResult, Instance, TypeRef};
use std::any::Any;
use std::sync::Arc;

/// 组件解析器 trait
pub trait Resolver: Send + Sync {
    /// 解析指定抽象类型（和名称）的组件
    fn resolve(&self, abstraction: &TypeRef, name: Option<&str>) -> DependencyResult<Instance>;

    /// 解析指定抽象类型的所有命名注册和集合成员
    fn resolve_all(&self, abstraction: &TypeRef) -> DependencyResult<Vec<Instance>>;

    /// 检查是否存在可满足请求的注册
    fn is_registered(&self, abstraction: &TypeRef, name: Option<&str>) -> bool;
}

/// 类型化解析扩展
pub trait ResolverExt: Resolver {
    /// 解析并转换为具体类型
    fn resolve_as<T: Any + Send + Sync>(
        &self,
        abstraction: &TypeRef,
        name: Option<&str>,
    ) -> DependencyResult<Arc<T>> {
        let instance = self.resolve(abstraction, name)?;
        instance.downcast::<T>().ok_or_else(|| {
            DependencyError::resolution_failed(
                abstraction.to_string(),
                name,
                format!("实例类型为 {}, 期望 {}", instance.type_name(), std::any::type_name::<T>()),
            )
        })
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}
