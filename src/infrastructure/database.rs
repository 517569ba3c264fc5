//! 数据库基础设施
//!
//! 产品集合保存在 PostgreSQL 的 `products` 表中：
//! - `id` 为主键，新建时在表锁内取 `MAX(id) + 1`，并发创建不会拿到相同编号
//! - `name` 上的唯一约束负责名称去重，冲突映射为 [`StoreError::Conflict`]

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, QueryBuilder,
};

use crate::app::product::{
    InventoryReport, NewProduct, Product, ProductFilter, ProductRepository, StoreError,
};
use crate::config::DatabaseConfig;

const PRODUCT_COLUMNS: &str = "id, name, price, description, quantity, unit";

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// 建表（已存在时跳过）
    pub async fn create_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                price DOUBLE PRECISION NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                quantity BIGINT NOT NULL,
                unit TEXT NOT NULL DEFAULT '',
                CONSTRAINT products_name_key UNIQUE (name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn product_repository(&self) -> PgProductRepository {
        PgProductRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// 将 SQLx 错误转换为存储层错误
pub fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_string(),
            )
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(name) = &filter.name {
        // 按字面量匹配子串，不解释通配符
        builder
            .push(" AND strpos(lower(name), lower(")
            .push_bind(name.clone())
            .push(")) > 0");
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(min) = filter.min_quantity {
        builder.push(" AND quantity >= ").push_bind(min);
    }
    if let Some(max) = filter.max_quantity {
        builder.push(" AND quantity <= ").push_bind(max);
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM products WHERE TRUE",
            PRODUCT_COLUMNS
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY id");

        builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // 表锁让编号计算与写入对其他创建请求串行化，读请求不受影响
        sqlx::query("LOCK TABLE products IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let created = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products ({columns})
            SELECT COALESCE(MAX(id), 0) + 1, $1, $2, $3, $4, $5 FROM products
            RETURNING {columns}
            "#,
            columns = PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.unit)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(created)
    }

    async fn insert_many(&self, products: &[Product]) -> Result<u64, StoreError> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO products ({}) ",
            PRODUCT_COLUMNS
        ));
        builder.push_values(products, |mut row, product| {
            row.push_bind(product.id)
                .push_bind(product.name.clone())
                .push_bind(product.price)
                .push_bind(product.description.clone())
                .push_bind(product.quantity)
                .push_bind(product.unit.clone());
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, price = $3, description = $4, quantity = $5, unit = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.unit)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }

    async fn report(&self) -> Result<InventoryReport, StoreError> {
        let (total_quantity, total_value): (i64, f64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(quantity), 0)::BIGINT,
                COALESCE(SUM(quantity * price), 0)::DOUBLE PRECISION
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(InventoryReport {
            total_quantity,
            total_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgConnectOptions;
    use std::collections::HashSet;
    use uuid::Uuid;

    const NEEDS_DATABASE: &str = "需要 DATABASE_URL 指向可用的 PostgreSQL";

    /// 每个测试使用独立的 schema，结束后删除
    struct TestDatabase {
        admin: PgPool,
        schema: String,
        manager: DatabaseManager,
    }

    impl TestDatabase {
        async fn new() -> Self {
            let url = std::env::var("DATABASE_URL").expect(NEEDS_DATABASE);
            let admin = PgPool::connect(&url).await.unwrap();
            let schema = format!("inventory_test_{}", Uuid::new_v4().simple());
            sqlx::query(&format!("CREATE SCHEMA {}", schema))
                .execute(&admin)
                .await
                .unwrap();

            let options = url
                .parse::<PgConnectOptions>()
                .unwrap()
                .options([("search_path", schema.as_str())]);
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect_with(options)
                .await
                .unwrap();

            let manager = DatabaseManager { pool };
            manager.create_tables().await.unwrap();
            Self {
                admin,
                schema,
                manager,
            }
        }

        fn repo(&self) -> PgProductRepository {
            self.manager.product_repository()
        }

        async fn cleanup(self) {
            self.manager.close().await;
            sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
                .execute(&self.admin)
                .await
                .unwrap();
        }
    }

    fn new_product(name: &str, price: f64, quantity: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            description: String::new(),
            quantity,
            unit: "kg".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "需要 DATABASE_URL 指向可用的 PostgreSQL"]
    async fn test_insert_assigns_sequential_ids_and_restarts_after_clear() {
        let db = TestDatabase::new().await;
        let repo = db.repo();

        for (expected, name) in [(1, "a"), (2, "b"), (3, "c")] {
            let created = repo.insert(new_product(name, 1.0, 1)).await.unwrap();
            assert_eq!(created.id, expected);
        }

        assert_eq!(repo.clear().await.unwrap(), 3);
        assert_eq!(repo.count().await.unwrap(), 0);
        let created = repo.insert(new_product("d", 1.0, 1)).await.unwrap();
        assert_eq!(created.id, 1);

        db.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "需要 DATABASE_URL 指向可用的 PostgreSQL"]
    async fn test_duplicate_names_conflict_on_insert_and_rename() {
        let db = TestDatabase::new().await;
        let repo = db.repo();

        repo.insert(new_product("apple", 1.0, 1)).await.unwrap();
        let banana = repo.insert(new_product("banana", 2.0, 2)).await.unwrap();

        let err = repo.insert(new_product("apple", 3.0, 3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref c) if c == "products_name_key"));
        assert_eq!(repo.count().await.unwrap(), 2);

        let renamed = Product {
            name: "apple".to_string(),
            ..banana.clone()
        };
        let err = repo.update(&renamed).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref c) if c == "products_name_key"));
        assert_eq!(repo.find_by_id(banana.id).await.unwrap(), Some(banana));

        db.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "需要 DATABASE_URL 指向可用的 PostgreSQL"]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let db = TestDatabase::new().await;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let repo = db.repo();
                let product = new_product(&format!("p{i}"), 1.0, 1);
                tokio::spawn(async move { repo.insert(product).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap().unwrap().id);
        }
        assert_eq!(ids, (1..=20).collect::<HashSet<i64>>());

        db.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "需要 DATABASE_URL 指向可用的 PostgreSQL"]
    async fn test_insert_many_report_and_filtered_list() {
        let db = TestDatabase::new().await;
        let repo = db.repo();

        let empty = repo.report().await.unwrap();
        assert_eq!(empty, InventoryReport::default());

        let batch = [
            new_product("Mleko", 5.0, 2).with_id(1),
            new_product("Chleb", 10.0, 3).with_id(2),
        ];
        assert_eq!(repo.insert_many(&batch).await.unwrap(), 2);
        assert_eq!(repo.insert_many(&[]).await.unwrap(), 0);

        let report = repo.report().await.unwrap();
        assert_eq!(report.total_quantity, 5);
        assert_eq!(report.total_value, 40.0);

        let filter = ProductFilter {
            name: Some("LEB".to_string()),
            min_quantity: Some(3),
            ..Default::default()
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found, vec![batch[1].clone()]);

        let created = repo.insert(new_product("Ser", 1.0, 1)).await.unwrap();
        assert_eq!(created.id, 3);
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());

        db.cleanup().await;
    }

    #[test]
    fn test_non_constraint_errors_are_backend_errors() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));

        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_filter_sql() {
        let filter = ProductFilter {
            name: Some("an".to_string()),
            min_price: Some(15.0),
            max_quantity: Some(10),
            ..Default::default()
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM products WHERE TRUE");
        push_filter(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            "SELECT id FROM products WHERE TRUE AND strpos(lower(name), lower($1)) > 0 \
             AND price >= $2 AND quantity <= $3"
        );
    }
}
