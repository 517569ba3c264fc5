//! 内存存储实现，与数据库实现遵循相同的约束语义

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::app::product::{
    InventoryReport, NewProduct, Product, ProductFilter, ProductRepository, StoreError,
};

#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_conflict(name: &str) -> StoreError {
    StoreError::Conflict(format!("name={}", name))
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.name == product.name) {
            return Err(name_conflict(&product.name));
        }

        let next_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let product = product.with_id(next_id);
        products.push(product.clone());
        Ok(product)
    }

    async fn insert_many(&self, batch: &[Product]) -> Result<u64, StoreError> {
        let mut products = self.products.write().await;
        for (i, product) in batch.iter().enumerate() {
            let taken = products
                .iter()
                .chain(&batch[..i])
                .any(|p| p.id == product.id || p.name == product.name);
            if taken {
                return Err(StoreError::Conflict(format!(
                    "id={} name={}",
                    product.id, product.name
                )));
            }
        }

        products.extend_from_slice(batch);
        Ok(batch.len() as u64)
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        if products
            .iter()
            .any(|p| p.id != product.id && p.name == product.name)
        {
            return Err(name_conflict(&product.name));
        }

        match products.iter_mut().find(|p| p.id == product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut products = self.products.write().await;
        let deleted = products.len() as u64;
        products.clear();
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn report(&self) -> Result<InventoryReport, StoreError> {
        let products = self.products.read().await;
        InventoryReport::from_products(products.iter())
            .ok_or_else(|| StoreError::Backend("库存总数量超出整数范围".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            price: 1.0,
            description: String::new(),
            quantity: 1,
            unit: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_many_rejects_duplicates_atomically() {
        let repo = InMemoryProductRepository::new();
        let err = repo
            .insert_many(&[product(1, "a"), product(2, "a")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_report_overflow_is_a_store_error() {
        let repo = InMemoryProductRepository::new();
        let mut big = product(1, "big");
        big.quantity = i64::MAX;
        let mut small = product(2, "small");
        small.quantity = 5;
        repo.insert_many(&[big, small]).await.unwrap();

        let err = repo.report().await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let repo = InMemoryProductRepository::new();
        assert!(!repo.update(&product(5, "x")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let repo = InMemoryProductRepository::new();
        repo.insert_many(&[product(3, "c"), product(1, "a"), product(2, "b")])
            .await
            .unwrap();

        let ids: Vec<i64> = repo
            .list(&ProductFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
