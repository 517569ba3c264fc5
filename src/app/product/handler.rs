//! 产品处理器

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::{
    filter::ProductFilter,
    model::{InventoryReport, NewProduct, Product, ProductQuery, UpdateProductRequest},
    service::{DeleteOutcome, UpdateOutcome},
};
use crate::app::AppState;
use crate::core::{error::CoreError, response::MessageResponse};

fn bad_json(rejection: JsonRejection) -> CoreError {
    CoreError::BadRequest(format!("请求体无效: {}", rejection.body_text()))
}

fn bad_id(rejection: PathRejection) -> CoreError {
    CoreError::BadRequest(format!("产品编号无效: {}", rejection.body_text()))
}

/// 获取产品列表，支持 name、minPrice、maxPrice、minQuantity、maxQuantity 过滤
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, CoreError> {
    let Query(query) = query.map_err(|e| CoreError::BadRequest(e.body_text()))?;
    let filter =
        ProductFilter::from_query(&query).map_err(|e| CoreError::BadRequest(e.to_string()))?;

    let products = state.product_service.list_products(&filter).await?;
    Ok(Json(products))
}

/// 创建产品
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<Product>>), CoreError> {
    let Json(payload) = payload.map_err(bad_json)?;

    let product = state.product_service.create_product(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_product("产品添加成功", product)),
    ))
}

/// 解析更新请求体，空请求体等同于 `{}`
fn parse_update_body(body: &[u8]) -> Result<UpdateProductRequest, CoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateProductRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| CoreError::BadRequest(format!("请求体无效: {}", e)))
}

/// 部分更新产品
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<MessageResponse<Product>>, CoreError> {
    let Path(id) = id.map_err(bad_id)?;
    let payload = parse_update_body(&body)?;

    let (message, product) = match state.product_service.update_product(id, &payload).await? {
        UpdateOutcome::Updated(product) => ("产品更新成功", product),
        UpdateOutcome::Unchanged(product) => ("产品未发生变化", product),
    };
    Ok(Json(MessageResponse::with_product(message, product)))
}

/// 删除产品
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, CoreError> {
    let Path(id) = id.map_err(bad_id)?;

    let message = match state.product_service.delete_product(id).await? {
        DeleteOutcome::Deleted => "产品删除成功",
        DeleteOutcome::Unchanged => "产品未发生变化",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// 库存报表：总数量与总价值
pub async fn inventory_report(
    State(state): State<AppState>,
) -> Result<Json<InventoryReport>, CoreError> {
    let report = state.product_service.inventory_report().await?;
    Ok(Json(report))
}

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, CoreError> {
    let count = state
        .product_service
        .repository()
        .count()
        .await
        .map_err(|e| CoreError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "products": count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
