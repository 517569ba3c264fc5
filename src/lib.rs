//! # 库存管理服务
//!
//! 基于 Axum 的产品库存 CRUD 服务，包括：
//! - 启动时从种子文件重建产品集合
//! - 产品的条件查询、创建、部分更新和删除
//! - 库存总量与总价值报表
//!
//! 分层结构：
//! - `app`: 应用层，处理器、业务服务与数据模型
//! - `core`: 核心层，统一错误、响应与中间件
//! - `infrastructure`: 基础设施层，数据库、内存存储与日志
//! - `config`: 配置文件加载与校验

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::{router, AppState};
pub use config::{Config, ConfigError};
