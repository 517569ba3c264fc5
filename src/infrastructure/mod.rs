//! 基础设施层：数据库、内存存储与日志

#[cfg(feature = "database")]
pub mod database;
pub mod logger;
pub mod memory;
