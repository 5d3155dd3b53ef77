//! 模块与类型元数据发现
//!
//! [`TypeModule`] 是宿主反射设施的边界，[`TypeMetadataCache`] 按模块名缓存描述结果，
//! [`TypeCatalog`] 为容器和扫描器提供按类型查找描述符的索引。

use crate::metadata::{TypeDescriptor, TypeRef};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 类型模块 trait
///
/// 一个模块是一组类型定义的编译单元，扫描器以模块为单位枚举类型。
pub trait TypeModule: Send + Sync {
    /// 模块名称，同时作为元数据缓存的键
    fn name(&self) -> &str;

    /// 按声明顺序列出模块内的所有类型
    fn describe_types(&self) -> Vec<TypeDescriptor>;
}

/// 由描述符列表直接构成的模块
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    types: Vec<TypeDescriptor>,
}

impl Module {
    /// 创建空模块；名称在类型索引内唯一
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// 追加类型定义
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// 批量追加类型定义
    pub fn with_types(mut self, descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.types.extend(descriptors);
        self
    }
}

impl TypeModule for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe_types(&self) -> Vec<TypeDescriptor> {
        self.types.clone()
    }
}

/// 全局类型元数据缓存
static GLOBAL_TYPE_CACHE: Lazy<TypeMetadataCache> = Lazy::new(TypeMetadataCache::new);

/// 类型元数据缓存
///
/// 进程级、惰性填充、以模块名为键。重新扫描同一模块不会再次调用反射设施，
/// 直到调用 [`invalidate`](Self::invalidate) 或 [`reset`](Self::reset)。
#[derive(Default)]
pub struct TypeMetadataCache {
    entries: DashMap<String, Arc<[TypeDescriptor]>>,
}

impl TypeMetadataCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取全局缓存
    pub fn global() -> &'static TypeMetadataCache {
        &GLOBAL_TYPE_CACHE
    }

    /// 获取模块的类型列表，首次访问时填充
    pub fn types_of(&self, module: &dyn TypeModule) -> Arc<[TypeDescriptor]> {
        if let Some(cached) = self.entries.get(module.name()) {
            return cached.clone();
        }

        let described: Arc<[TypeDescriptor]> = module.describe_types().into();
        debug!("缓存模块类型元数据: {} ({} 个类型)", module.name(), described.len());

        self.entries
            .entry(module.name().to_string())
            .or_insert(described)
            .clone()
    }

    /// 是否已加载指定名称的模块
    pub fn contains(&self, module_name: &str) -> bool {
        self.entries.contains_key(module_name)
    }

    /// 使指定模块的缓存失效
    pub fn invalidate(&self, module_name: &str) -> bool {
        self.entries.remove(module_name).is_some()
    }

    /// 清空缓存
    pub fn reset(&self) {
        self.entries.clear();
    }

    /// 已缓存的模块数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TypeMetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadataCache")
            .field("modules", &self.entries.len())
            .finish()
    }
}

/// 类型目录
///
/// 汇总一组模块，按类型定义名称查找描述符以及定义它的模块。
#[derive(Clone, Default)]
pub struct TypeCatalog {
    modules: Vec<Arc<dyn TypeModule>>,
    types: HashMap<String, (usize, TypeDescriptor)>,
}

impl TypeCatalog {
    /// 创建不含任何模块的类型索引
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加模块（经由全局元数据缓存读取）
    pub fn with_module(mut self, module: Arc<dyn TypeModule>) -> Self {
        self.add_module(module);
        self
    }

    /// 添加模块；同名模块只添加一次
    pub fn add_module(&mut self, module: Arc<dyn TypeModule>) {
        if self.modules.iter().any(|known| known.name() == module.name()) {
            return;
        }

        let index = self.modules.len();
        for descriptor in TypeMetadataCache::global().types_of(module.as_ref()).iter() {
            self.types
                .insert(descriptor.full_name().to_string(), (index, descriptor.clone()));
        }
        self.modules.push(module);
    }

    /// 按类型（或其泛型定义）查找描述符
    pub fn describe(&self, type_ref: &TypeRef) -> Option<&TypeDescriptor> {
        self.types
            .get(type_ref.definition_name())
            .map(|(_, descriptor)| descriptor)
    }

    /// 查找定义了指定类型的模块
    pub fn module_containing(&self, type_ref: &TypeRef) -> Option<Arc<dyn TypeModule>> {
        self.types
            .get(type_ref.definition_name())
            .and_then(|(index, _)| self.modules.get(*index).cloned())
    }

    /// 已加载的模块（按加载顺序）
    pub fn modules(&self) -> &[Arc<dyn TypeModule>] {
        &self.modules
    }

    /// 已索引的类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 是否未索引任何类型
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<&str> = self.modules.iter().map(|module| module.name()).collect();
        f.debug_struct("TypeCatalog")
            .field("modules", &modules)
            .field("types", &self.types.len())
            .finish()
    }
}
