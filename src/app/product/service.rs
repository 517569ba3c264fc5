//! 产品业务服务

use std::sync::Arc;

use tracing::{info, warn};

use super::filter::ProductFilter;
use super::model::{InventoryReport, NewProduct, Product, UpdateProductRequest};
use super::repository::{ProductRepository, StoreError};
use crate::core::error::CoreError;

/// 业务层错误
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("产品名称已存在: {0}")]
    NameTaken(String),
    #[error("产品不存在: {0}")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ServiceError> for CoreError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NameTaken(_) => CoreError::BadRequest("产品名称已存在".to_string()),
            ServiceError::NotFound(_) => CoreError::NotFound("指定编号的产品不存在".to_string()),
            ServiceError::Store(e) => CoreError::InternalServerError(e.to_string()),
        }
    }
}

/// 更新结果
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Product),
    Unchanged(Product),
}

/// 删除结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// 存在性检查之后、删除之前记录已被移除
    Unchanged,
}

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn ProductRepository> {
        &self.repo
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ServiceError> {
        Ok(self.repo.list(filter).await?)
    }

    /// 创建产品，名称唯一性由存储层约束保证
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        let name = product.name.clone();
        match self.repo.insert(product).await {
            Ok(created) => {
                info!("新增产品: {} (id={})", created.name, created.id);
                Ok(created)
            }
            Err(StoreError::Conflict(_)) => {
                warn!("产品名称已存在: {}", name);
                Err(ServiceError::NameTaken(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 部分更新产品；合并结果与原记录一致时不写入
    pub async fn update_product(
        &self,
        id: i64,
        request: &UpdateProductRequest,
    ) -> Result<UpdateOutcome, ServiceError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        let merged = request.apply_to(&existing);
        if merged == existing {
            info!("产品未发生变化: id={}", id);
            return Ok(UpdateOutcome::Unchanged(existing));
        }

        match self.repo.update(&merged).await {
            Ok(true) => {
                info!("已更新产品: id={}", id);
                Ok(UpdateOutcome::Updated(merged))
            }
            Ok(false) => Err(ServiceError::NotFound(id)),
            Err(StoreError::Conflict(_)) => Err(ServiceError::NameTaken(merged.name)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_product(&self, id: i64) -> Result<DeleteOutcome, ServiceError> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound(id));
        }

        if self.repo.delete(id).await? {
            info!("已删除产品: id={}", id);
            Ok(DeleteOutcome::Deleted)
        } else {
            info!("产品未发生变化: id={}", id);
            Ok(DeleteOutcome::Unchanged)
        }
    }

    pub async fn inventory_report(&self) -> Result<InventoryReport, ServiceError> {
        Ok(self.repo.report().await?)
    }
}
