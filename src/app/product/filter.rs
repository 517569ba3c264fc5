//! 查询过滤器：把可选查询参数转换为产品谓词

use super::model::{coerce_i64, Product, ProductQuery};

/// 产品过滤条件，所有条件彼此独立，缺省即不限制
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// 名称子串，大小写不敏感
    pub name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
}

/// 查询参数无法解析为数值
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("查询参数 {param} 的值无效: {value}")]
pub struct FilterError {
    pub param: &'static str,
    pub value: String,
}

impl ProductFilter {
    /// 从查询参数构建过滤器，空字符串视为未提供
    pub fn from_query(query: &ProductQuery) -> Result<Self, FilterError> {
        Ok(Self {
            name: non_empty(query.name.as_deref()).map(str::to_string),
            min_price: parse_price("minPrice", query.min_price.as_deref())?,
            max_price: parse_price("maxPrice", query.max_price.as_deref())?,
            min_quantity: parse_quantity("minQuantity", query.min_quantity.as_deref())?,
            max_quantity: parse_quantity("maxQuantity", query.max_quantity.as_deref())?,
        })
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = &self.name {
            if !product.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.min_quantity.is_some_and(|min| product.quantity < min) {
            return false;
        }
        if self.max_quantity.is_some_and(|max| product.quantity > max) {
            return false;
        }
        true
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(param: &'static str, value: Option<&str>) -> Result<Option<f64>, FilterError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(FilterError {
            param,
            value: raw.to_string(),
        }),
    }
}

fn parse_quantity(param: &'static str, value: Option<&str>) -> Result<Option<i64>, FilterError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    coerce_i64(raw).map(Some).ok_or_else(|| FilterError {
        param,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, price: f64, quantity: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            description: String::new(),
            quantity,
            unit: "szt".to_string(),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> ProductQuery {
        let mut query = ProductQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "name" => query.name = value,
                "minPrice" => query.min_price = value,
                "maxPrice" => query.max_price = value,
                "minQuantity" => query.min_quantity = value,
                "maxQuantity" => query.max_quantity = value,
                other => panic!("unknown key {other}"),
            }
        }
        query
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filter = ProductFilter::from_query(&ProductQuery::default()).unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert!(filter.matches(&product(1, "apple", 10.0, 1)));
    }

    #[test]
    fn test_empty_strings_impose_no_constraint() {
        let filter =
            ProductFilter::from_query(&query(&[("name", ""), ("minPrice", " ")])).unwrap();
        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_min_price() {
        let filter = ProductFilter::from_query(&query(&[("minPrice", "15")])).unwrap();
        assert!(!filter.matches(&product(1, "apple", 10.0, 1)));
        assert!(filter.matches(&product(2, "banana", 20.0, 1)));
    }

    #[test]
    fn test_name_is_case_insensitive_substring() {
        let filter = ProductFilter::from_query(&query(&[("name", "AN")])).unwrap();
        assert!(!filter.matches(&product(1, "apple", 10.0, 1)));
        assert!(filter.matches(&product(2, "Banana", 20.0, 1)));
    }

    #[test]
    fn test_bounds_are_inclusive_and_compose() {
        let filter = ProductFilter::from_query(&query(&[
            ("minPrice", "10"),
            ("maxPrice", "20"),
            ("minQuantity", "5"),
            ("maxQuantity", "5"),
        ]))
        .unwrap();

        assert!(filter.matches(&product(1, "a", 10.0, 5)));
        assert!(filter.matches(&product(2, "b", 20.0, 5)));
        assert!(!filter.matches(&product(3, "c", 20.5, 5)));
        assert!(!filter.matches(&product(4, "d", 15.0, 6)));

        // 数量边界与请求体采用相同的取整规则
        let filter = ProductFilter::from_query(&query(&[("minQuantity", "1.5")])).unwrap();
        assert_eq!(filter.min_quantity, Some(1));
        assert!(filter.matches(&product(5, "e", 1.0, 1)));
        assert!(!filter.matches(&product(6, "f", 1.0, 0)));
    }

    #[test]
    fn test_non_numeric_bound_is_rejected() {
        let err = ProductFilter::from_query(&query(&[("maxQuantity", "many")])).unwrap_err();
        assert_eq!(err.param, "maxQuantity");
        assert_eq!(err.value, "many");

        assert!(ProductFilter::from_query(&query(&[("minPrice", "NaN")])).is_err());
    }
}
