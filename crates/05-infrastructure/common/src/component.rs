//! 组件实例与激活上下文
//!
//! 容器创建的所有实例都以 [`Instance`] 传递，激活器通过 [`Activation`] 读取构造参数。

use crate::errors::{DependencyError, DependencyResult};
use crate::metadata::TypeRef;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的组件实例
///
/// 克隆只增加引用计数，[`Instance::same_as`] 用于比较是否为同一实例。
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// 包装一个新值
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// 包装一个已共享的值
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// 实例的 Rust 类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 实例的具体类型是否为 `T`
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.value.is::<T>()
    }

    /// 以 `T` 借用实例
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 转换为具体类型的共享指针
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// 是否与另一个实例指向同一对象
    pub fn same_as(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.value) as *const (),
            Arc::as_ptr(&other.value) as *const (),
        )
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("ptr", &(Arc::as_ptr(&self.value) as *const ()))
            .finish()
    }
}

/// 激活上下文
///
/// 提供被构建的（已封闭的）实现类型和按构造函数参数顺序排列的实参。
#[derive(Debug, Clone, Copy)]
pub struct Activation<'a> {
    implementation: &'a TypeRef,
    arguments: &'a [Instance],
}

impl<'a> Activation<'a> {
    /// 为一次构造创建激活上下文
    pub fn new(implementation: &'a TypeRef, arguments: &'a [Instance]) -> Self {
        Self {
            implementation,
            arguments,
        }
    }

    /// 正在构建的实现类型；开放泛型已用请求的类型参数封闭
    pub fn implementation(&self) -> &'a TypeRef {
        self.implementation
    }

    /// 泛型类型参数
    pub fn type_arguments(&self) -> &'a [TypeRef] {
        self.implementation.type_arguments()
    }

    /// 按构造函数参数顺序排列的实参
    pub fn arguments(&self) -> &'a [Instance] {
        self.arguments
    }

    /// 指定位置的参数；位置超出参数个数时返回 `None`
    pub fn argument(&self, index: usize) -> Option<&'a Instance> {
        self.arguments.get(index)
    }

    /// 读取指定位置的实参并转换为具体类型
    pub fn argument_as<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.argument(index).and_then(Instance::downcast::<T>)
    }

    /// 读取必需的实参，缺失或类型不符时返回错误
    pub fn required<T: Any + Send + Sync>(&self, index: usize) -> DependencyResult<Arc<T>> {
        self.argument_as::<T>(index)
            .ok_or_else(|| DependencyError::ArgumentMismatch {
                type_name: self.implementation.to_string(),
                index,
                expected: std::any::type_name::<T>().to_string(),
            })
    }
}
