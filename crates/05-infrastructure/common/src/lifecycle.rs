//! 组件生命周期与作用域

use serde::{Deserialize, Serialize};

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
    /// 单例模式 - 每个 (抽象类型, 名称, 作用域) 只创建一个实例
    Singleton,
}

impl Lifetime {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        self == Self::Singleton
    }
}

/// 容器作用域信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
    pub id: uuid::Uuid,
    pub name: String,
    pub parent: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ScopeInfo {
    /// 创建根作用域
    pub fn root() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: "root".to_string(),
            parent: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建子作用域
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: format!("{}.{}", self.name, name.into()),
            parent: Some(self.id),
            created_at: chrono::Utc::now(),
        }
    }

    /// 是否为根作用域
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
