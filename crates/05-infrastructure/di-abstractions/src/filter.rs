//! 类型过滤器抽象接口

use infrastructure_common::TypeDescriptor;

/// 类型过滤器 trait
///
/// 判断一个类型是否符合过滤条件，求值必须无副作用。
pub trait TypeFilter: Send + Sync {
    /// 检查类型是否通过过滤条件
    fn matches(&self, descriptor: &TypeDescriptor) -> bool;

    /// 过滤器名称
    fn name(&self) -> &str;
}
