//! 启动时的种子数据导入
//!
//! 每次启动都会清空产品集合，再按文件顺序写入种子记录，编号为 `索引 + 1`。
//! 种子文件缺失、格式错误或名称重复属于致命错误，服务不会以空数据启动。
//! 这些检查都在清空集合之前完成。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::model::{NewProduct, Product};
use super::repository::{ProductRepository, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("无法读取种子文件 {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("种子文件 {path} 格式错误: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("种子文件 {path} 中的产品名称重复: {name}")]
    DuplicateName { path: PathBuf, name: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 读取种子文件：产品记录组成的 JSON 数组，不含 `id`，名称不得重复
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<NewProduct>, SeedError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let seed: Vec<NewProduct> = serde_json::from_str(&data).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(name) = first_duplicate_name(&seed) {
        return Err(SeedError::DuplicateName {
            path: path.to_path_buf(),
            name,
        });
    }

    Ok(seed)
}

fn first_duplicate_name(seed: &[NewProduct]) -> Option<String> {
    let mut names = HashSet::new();
    seed.iter()
        .find(|p| !names.insert(p.name.as_str()))
        .map(|p| p.name.clone())
}

/// 清空集合并写入种子记录，返回写入数量
pub async fn seed_products(
    repo: &dyn ProductRepository,
    seed: Vec<NewProduct>,
) -> Result<u64, SeedError> {
    let deleted = repo.clear().await?;
    info!("{} 个产品已从集合中删除", deleted);

    let count = repo.count().await?;
    if count > 0 {
        info!("集合中仍有 {} 个产品，跳过种子导入", count);
        return Ok(0);
    }

    let products: Vec<Product> = seed
        .into_iter()
        .enumerate()
        .map(|(index, product)| product.with_id(index as i64 + 1))
        .collect();

    let inserted = repo.insert_many(&products).await?;
    info!("{} 个产品已添加到集合", inserted);

    Ok(inserted)
}
