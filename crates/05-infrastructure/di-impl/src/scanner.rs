//! 模块扫描器
//!
//! [`ScanExpression`] 收集一次扫描的模块、过滤条件和约定，[`ModuleScanner`] 执行扫描并校验约定输出。

use crate::filters::{ExactTypeFilter, NamespaceFilter, PredicateFilter, TypeFilterSet};
use di_abstractions::{MappingConvention, MappingPair, TypeFilter};
use infrastructure_common::{
    RegistrationError, RegistrationResult, TypeCatalog, TypeDescriptor, TypeMetadataCache,
    TypeModule, TypeRef,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 扫描配置表达式
pub struct ScanExpression<'c> {
    catalog: &'c TypeCatalog,
    modules: Vec<Arc<dyn TypeModule>>,
    filters: TypeFilterSet,
    conventions: Vec<Box<dyn MappingConvention>>,
    errors: Vec<RegistrationError>,
}

impl<'c> ScanExpression<'c> {
    /// 创建扫描表达式，`module_containing` 在 `catalog` 中查找模块
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self {
            catalog,
            modules: Vec::new(),
            filters: TypeFilterSet::new(),
            conventions: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// 扫描指定模块
    pub fn module(&mut self, module: Arc<dyn TypeModule>) -> &mut Self {
        if !self.modules.iter().any(|known| known.name() == module.name()) {
            self.modules.push(module);
        }
        self
    }

    /// 扫描定义了指定类型的模块
    pub fn module_containing(&mut self, type_ref: impl Into<TypeRef>) -> &mut Self {
        let type_ref = type_ref.into();
        match self.catalog.module_containing(&type_ref) {
            Some(module) => {
                self.module(module);
            }
            None => self.errors.push(RegistrationError::ModuleNotFound {
                type_name: type_ref.to_string(),
            }),
        }
        self
    }

    /// 使用默认构造的约定
    pub fn with<C>(&mut self) -> &mut Self
    where
        C: MappingConvention + Default + 'static,
    {
        self.with_convention(C::default())
    }

    /// 使用约定实例
    pub fn with_convention(&mut self, convention: impl MappingConvention + 'static) -> &mut Self {
        self.conventions.push(Box::new(convention));
        self
    }

    /// 添加包含过滤器
    pub fn include_filter(&mut self, filter: impl TypeFilter + 'static) -> &mut Self {
        self.filters.include(Box::new(filter));
        self
    }

    /// 添加排除过滤器
    pub fn exclude_filter(&mut self, filter: impl TypeFilter + 'static) -> &mut Self {
        self.filters.exclude(Box::new(filter));
        self
    }

    /// 包含满足谓词的类型
    pub fn include<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.include_filter(PredicateFilter::new(predicate))
    }

    /// 排除满足谓词的类型
    pub fn exclude<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.exclude_filter(PredicateFilter::new(predicate))
    }

    /// 只包含指定类型
    pub fn include_type(&mut self, type_ref: impl Into<TypeRef>) -> &mut Self {
        self.include_filter(ExactTypeFilter::new(type_ref.into()))
    }

    /// 排除指定类型
    pub fn exclude_type(&mut self, type_ref: impl Into<TypeRef>) -> &mut Self {
        self.exclude_filter(ExactTypeFilter::new(type_ref.into()))
    }

    /// 只包含命名空间（含子命名空间）内的类型
    pub fn include_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.include_filter(NamespaceFilter::new(namespace))
    }

    /// 排除命名空间（含子命名空间）内的类型
    pub fn exclude_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.exclude_filter(NamespaceFilter::new(namespace))
    }

    /// 包含指定类型所在的命名空间
    pub fn include_namespace_containing(&mut self, type_ref: impl Into<TypeRef>) -> &mut Self {
        self.include_filter(NamespaceFilter::containing(&type_ref.into()))
    }

    /// 排除指定类型所在的命名空间
    pub fn exclude_namespace_containing(&mut self, type_ref: impl Into<TypeRef>) -> &mut Self {
        self.exclude_filter(NamespaceFilter::containing(&type_ref.into()))
    }

    /// 已选择的模块（按添加顺序）
    pub fn modules(&self) -> &[Arc<dyn TypeModule>] {
        &self.modules
    }

    /// 已添加的过滤器
    pub fn filters(&self) -> &TypeFilterSet {
        &self.filters
    }

    /// 已添加的约定（按执行顺序）
    pub fn conventions(&self) -> &[Box<dyn MappingConvention>] {
        &self.conventions
    }

    /// 配置过程中记录的第一个错误
    pub fn take_error(&mut self) -> Option<RegistrationError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }
}

impl fmt::Debug for ScanExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<&str> = self.modules.iter().map(|module| module.name()).collect();
        let conventions: Vec<&str> = self
            .conventions
            .iter()
            .map(|convention| convention.name())
            .collect();
        f.debug_struct("ScanExpression")
            .field("modules", &modules)
            .field("filters", &self.filters)
            .field("conventions", &conventions)
            .field("errors", &self.errors)
            .finish()
    }
}

/// 模块扫描器
///
/// 按模块顺序、模块内声明顺序枚举类型，结果是确定的。
#[derive(Debug, Clone, Copy)]
pub struct ModuleScanner<'a> {
    cache: &'a TypeMetadataCache,
    deduplicate: bool,
}

impl ModuleScanner<'static> {
    /// 使用进程级元数据缓存
    pub fn global() -> Self {
        Self::new(TypeMetadataCache::global())
    }
}

impl<'a> ModuleScanner<'a> {
    /// 使用指定的元数据缓存创建扫描器
    pub fn new(cache: &'a TypeMetadataCache) -> Self {
        Self {
            cache,
            deduplicate: false,
        }
    }

    /// 同一次扫描中丢弃重复的 (抽象类型, 实现类型) 映射
    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// 执行扫描表达式
    pub fn scan(&self, expression: &ScanExpression<'_>) -> RegistrationResult<Vec<MappingPair>> {
        self.scan_modules(expression.modules(), expression.filters(), expression.conventions())
    }

    /// 扫描模块，过滤候选类型后依次应用约定
    pub fn scan_modules(
        &self,
        modules: &[Arc<dyn TypeModule>],
        filters: &TypeFilterSet,
        conventions: &[Box<dyn MappingConvention>],
    ) -> RegistrationResult<Vec<MappingPair>> {
        let mut candidates = Vec::new();
        for module in modules {
            let types = self.cache.types_of(module.as_ref());
            let before = candidates.len();
            candidates.extend(
                types
                    .iter()
                    .filter(|descriptor| filters.is_eligible(descriptor))
                    .cloned(),
            );
            debug!(
                "扫描模块: {} (类型 {}, 候选 {})",
                module.name(),
                types.len(),
                candidates.len() - before
            );
        }

        let index: HashMap<&TypeRef, &TypeDescriptor> = candidates
            .iter()
            .map(|descriptor| (descriptor.type_ref(), descriptor))
            .collect();

        let mut pairs: Vec<MappingPair> = Vec::new();
        for convention in conventions {
            let produced = convention.apply(&candidates);
            debug!("约定 {} 产生 {} 个映射", convention.name(), produced.len());

            for pair in produced {
                validate_pair(convention.name(), &pair, &index)?;

                if self.deduplicate && pairs.iter().any(|known| known.same_mapping(&pair)) {
                    debug!("丢弃重复映射: {}", pair);
                    continue;
                }
                pairs.push(pair);
            }
        }

        info!(
            "扫描完成: 模块 {}, 候选类型 {}, 映射 {}",
            modules.len(),
            candidates.len(),
            pairs.len()
        );
        Ok(pairs)
    }
}

/// 校验约定输出：实现类型必须是候选中的具体类，且可赋值给抽象类型
fn validate_pair(
    convention: &str,
    pair: &MappingPair,
    candidates: &HashMap<&TypeRef, &TypeDescriptor>,
) -> RegistrationResult<()> {
    let invalid = |reason: &str| RegistrationError::InvalidConventionOutput {
        convention: convention.to_string(),
        abstraction: pair.abstraction.to_string(),
        implementation: pair.implementation.to_string(),
        reason: reason.to_string(),
    };

    let descriptor = candidates
        .get(&pair.implementation)
        .ok_or_else(|| invalid("实现类型不在候选类型中"))?;

    if !descriptor.is_concrete() {
        return Err(invalid("实现类型不是具体类"));
    }
    if !descriptor.is_assignable_to(&pair.abstraction) {
        return Err(invalid("实现类型不能赋值给抽象类型"));
    }
    if pair.implementation.is_open() {
        if !pair.abstraction.is_open() {
            return Err(invalid("开放泛型实现只能映射到开放泛型抽象类型"));
        }
        if pair.abstraction.arity() != pair.implementation.arity() {
            return Err(invalid("开放泛型参数个数不一致"));
        }
    }
    Ok(())
}
