//! 注册层配置选项
//!
//! 选项结构均可从宿主配置文档反序列化，缺失字段取默认值。

use serde::{Deserialize, Serialize};

/// 注册构建器选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// 不同扫描批次映射到同一注册键时，允许后者覆盖前者（否则报告注册冲突）
    pub allow_scan_overrides: bool,
    /// 同一扫描批次内丢弃重复的 (抽象类型, 实现类型, 成员方式) 映射
    pub deduplicate_identical_pairs: bool,
}

/// 容器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 未注册的具体类按瞬时模式自动解析
    pub auto_resolve_concrete_types: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            auto_resolve_concrete_types: true,
        }
    }
}
