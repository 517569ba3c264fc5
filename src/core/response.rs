//! 核心响应处理模块

use serde::Serialize;

/// 变更类接口的响应结构：提示信息，可附带受影响的产品
#[derive(Debug, Serialize)]
pub struct MessageResponse<T = ()> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<T>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            product: None,
        }
    }
}

impl<T> MessageResponse<T> {
    pub fn with_product(message: impl Into<String>, product: T) -> Self {
        Self {
            message: message.into(),
            product: Some(product),
        }
    }
}
