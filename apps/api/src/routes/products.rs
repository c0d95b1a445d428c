//! Catalogue endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use promoweb_core::Product;

use crate::error::ApiResult;
use crate::services::catalog_service::{
    CatalogService, CreateProductRequest, ListProductsQuery, ProductPage, RestockRequest,
};
use crate::AppState;

/// POST /products
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = CatalogService::new(state).create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<ProductPage>> {
    Ok(Json(CatalogService::new(state).list(query).await?))
}

/// GET /products/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(CatalogService::new(state).get(&id).await?))
}

/// POST /products/{id}/restock
pub async fn restock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> ApiResult<Json<Product>> {
    Ok(Json(CatalogService::new(state).restock(&id, req).await?))
}
