//! 产品存储抽象

use async_trait::async_trait;

use super::filter::ProductFilter;
use super::model::{InventoryReport, NewProduct, Product};

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 违反唯一约束（产品名称或编号重复）
    #[error("唯一约束冲突: {0}")]
    Conflict(String),
    #[error("存储错误: {0}")]
    Backend(String),
}

/// 产品集合的数据访问接口
///
/// 所有处理器共享同一个实现，由存储自身负责并发同步。
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 按过滤条件列出产品，按 `id` 升序
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// 插入新产品并在同一步内分配 `max(id) + 1`，名称重复时返回 [`StoreError::Conflict`]
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// 批量插入已分配编号的产品，返回插入数量
    async fn insert_many(&self, products: &[Product]) -> Result<u64, StoreError>;

    /// 整体替换指定 `id` 的产品，返回是否有记录被更新
    async fn update(&self, product: &Product) -> Result<bool, StoreError>;

    /// 删除指定 `id` 的产品，返回是否有记录被删除
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// 清空集合，返回删除数量
    async fn clear(&self) -> Result<u64, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn report(&self) -> Result<InventoryReport, StoreError>;
}
