//! 产品模块：模型、过滤器、存储接口、业务服务、种子导入与处理器

pub mod filter;
pub mod handler;
pub mod model;
pub mod repository;
pub mod seed;
pub mod service;

pub use filter::ProductFilter;
pub use model::{InventoryReport, NewProduct, Product, UpdateProductRequest};
pub use repository::{ProductRepository, StoreError};
pub use service::ProductService;
