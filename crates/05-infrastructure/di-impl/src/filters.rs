//! 类型过滤器实现
//!
//! 包含具体类型、命名空间和自定义谓词三类过滤器，以及组合它们的 [`TypeFilterSet`]。

use di_abstractions::TypeFilter;
use infrastructure_common::{TypeDescriptor, TypeRef};
use std::fmt;

/// 指定类型过滤器
///
/// 匹配类型自身；过滤条件为封闭泛型时也匹配它的泛型定义。
#[derive(Debug, Clone)]
pub struct ExactTypeFilter {
    target: TypeRef,
    name: String,
}

impl ExactTypeFilter {
    /// 按类型身份精确匹配
    pub fn new(target: TypeRef) -> Self {
        Self {
            name: format!("Type({target})"),
            target,
        }
    }
}

impl TypeFilter for ExactTypeFilter {
    fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.type_ref() == &self.target
            || self.target.generic_definition().as_ref() == Some(descriptor.type_ref())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 命名空间过滤器
///
/// 命名空间等于 `ns` 或以 `ns.` 开头时匹配。
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    namespace: String,
    name: String,
}

impl NamespaceFilter {
    /// 匹配命名空间本身及其子命名空间
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            name: format!("Namespace({namespace})"),
            namespace,
        }
    }

    /// 以指定类型所在的命名空间为条件
    pub fn containing(type_ref: &TypeRef) -> Self {
        Self::new(type_ref.namespace())
    }

    /// 匹配的命名空间
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl TypeFilter for NamespaceFilter {
    fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor
            .namespace()
            .strip_prefix(self.namespace.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 自定义谓词过滤器
pub struct PredicateFilter<F> {
    predicate: F,
    name: String,
}

impl<F> PredicateFilter<F>
where
    F: Fn(&TypeDescriptor) -> bool + Send + Sync,
{
    /// 匿名谓词过滤器
    pub fn new(predicate: F) -> Self {
        Self::named("Predicate", predicate)
    }

    /// 带名称的谓词过滤器，名称用于日志
    pub fn named(name: impl Into<String>, predicate: F) -> Self {
        Self {
            predicate,
            name: name.into(),
        }
    }
}

impl<F> TypeFilter for PredicateFilter<F>
where
    F: Fn(&TypeDescriptor) -> bool + Send + Sync,
{
    fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        (self.predicate)(descriptor)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 类型过滤器集合
///
/// 存在包含条件时只保留至少满足其一的类型；任一排除条件匹配即排除。
#[derive(Default)]
pub struct TypeFilterSet {
    includes: Vec<Box<dyn TypeFilter>>,
    excludes: Vec<Box<dyn TypeFilter>>,
}

impl TypeFilterSet {
    /// 空过滤器集合，接受所有类型
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加包含条件
    pub fn include(&mut self, filter: Box<dyn TypeFilter>) {
        self.includes.push(filter);
    }

    /// 添加排除条件
    pub fn exclude(&mut self, filter: Box<dyn TypeFilter>) {
        self.excludes.push(filter);
    }

    /// 判断类型是否可参与扫描
    pub fn is_eligible(&self, descriptor: &TypeDescriptor) -> bool {
        let included = self.includes.is_empty()
            || self.includes.iter().any(|filter| filter.matches(descriptor));

        included && !self.excludes.iter().any(|filter| filter.matches(descriptor))
    }

    /// 是否存在包含过滤器
    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    /// 是否没有任何过滤器
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

impl fmt::Debug for TypeFilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let includes: Vec<&str> = self.includes.iter().map(|filter| filter.name()).collect();
        let excludes: Vec<&str> = self.excludes.iter().map(|filter| filter.name()).collect();
        f.debug_struct("TypeFilterSet")
            .field("includes", &includes)
            .field("excludes", &excludes)
            .finish()
    }
}
