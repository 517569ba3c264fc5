//! 产品数据模型

use serde::{de, Deserialize, Deserializer, Serialize};

/// 产品
///
/// `id` 是应用层的顺序编号，与存储内部的主键无关。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub quantity: i64,
    pub unit: String,
}

/// 尚未分配 `id` 的产品，种子文件中的记录与创建请求都归结为它
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(deserialize_with = "deserialize_f64")]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_i64")]
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
}

impl NewProduct {
    pub fn with_id(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            description: self.description,
            quantity: self.quantity,
            unit: self.unit,
        }
    }
}

/// 部分更新请求
///
/// 字段缺失或为 `null` 表示保留原值；出现即覆盖，包括 `0` 与空字符串。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl UpdateProductRequest {
    /// 把请求合并到现有产品上，返回合并后的新记录
    pub fn apply_to(&self, existing: &Product) -> Product {
        Product {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            price: self.price.unwrap_or(existing.price),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            quantity: self.quantity.unwrap_or(existing.quantity),
            unit: self.unit.clone().unwrap_or_else(|| existing.unit.clone()),
        }
    }
}

/// 列表查询参数，数值边界在过滤器构建时再解析
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_quantity: Option<String>,
    pub max_quantity: Option<String>,
}

/// 库存报表
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_quantity: i64,
    pub total_value: f64,
}

impl InventoryReport {
    /// 一次遍历累加数量与价值，总数量超出 `i64` 范围时返回 `None`
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Option<Self> {
        products
            .into_iter()
            .try_fold(Self::default(), |report, product| {
                Some(Self {
                    total_quantity: report.total_quantity.checked_add(product.quantity)?,
                    total_value: report.total_value + product.quantity as f64 * product.price,
                })
            })
    }
}

/// 数值字段既可以是 JSON 数字，也可以是数字字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    fn into_f64(self) -> Option<f64> {
        let value = match self {
            NumberLike::Int(v) => v as f64,
            NumberLike::Float(v) => v,
            NumberLike::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }

    fn into_i64(self) -> Option<i64> {
        match self {
            NumberLike::Int(v) => Some(v),
            NumberLike::Float(v) => truncate(v),
            NumberLike::Text(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(truncate))
            }
        }
    }
}

/// 把字符串按与请求体相同的规则转换为整数：允许小数，向零截断
pub fn coerce_i64(s: &str) -> Option<i64> {
    NumberLike::Text(s.to_string()).into_i64()
}

fn truncate(v: f64) -> Option<i64> {
    (v.is_finite() && v.abs() < i64::MAX as f64).then(|| v.trunc() as i64)
}

pub fn deserialize_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberLike::deserialize(deserializer)?
        .into_f64()
        .ok_or_else(|| de::Error::custom("期望数值类型的价格"))
}

pub fn deserialize_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    NumberLike::deserialize(deserializer)?
        .into_i64()
        .ok_or_else(|| de::Error::custom("期望整数类型的数量"))
}

pub fn deserialize_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    match Option::<NumberLike>::deserialize(deserializer)? {
        Some(value) => value
            .into_f64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("期望数值类型的价格")),
        None => Ok(None),
    }
}

pub fn deserialize_opt_i64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    match Option::<NumberLike>::deserialize(deserializer)? {
        Some(value) => value
            .into_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("期望整数类型的数量")),
        None => Ok(None),
    }
}
