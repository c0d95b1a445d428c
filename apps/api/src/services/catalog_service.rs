//! Product catalogue and inbound stock.
//!
//! Products are created with their opening stock; afterwards stock only
//! grows through `restock` and shrinks when a shipment leaves.

use std::sync::Arc;

use chrono::Utc;
use promoweb_core::validation::{
    validate_price_xaf, validate_product_name, validate_restock_quantity, validate_sku,
    validate_weight_grams,
};
use promoweb_core::{CoreError, Product, ProductStatus, ValidationError};
use promoweb_db::repository::{inventory, product};
use promoweb_db::DbError;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub price_xaf: i64,
    pub weight_grams: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub status: Option<ProductStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

pub struct CatalogService {
    state: Arc<AppState>,
}

impl CatalogService {
    pub fn new(state: Arc<AppState>) -> Self {
        CatalogService { state }
    }

    pub async fn create(&self, req: CreateProductRequest) -> ApiResult<Product> {
        validate_sku(&req.sku)?;
        validate_product_name(&req.name)?;
        validate_price_xaf(req.price_xaf)?;
        validate_weight_grams(req.weight_grams)?;
        if req.stock_quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "stockQuantity".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let sku = req.sku.trim().to_uppercase();
        let created = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.clone(),
            name: req.name.trim().to_string(),
            brand: req.brand.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
            image_url: req.image_url.filter(|u| !u.trim().is_empty()),
            price_xaf: req.price_xaf,
            weight_grams: req.weight_grams,
            stock_quantity: req.stock_quantity,
            reserved_quantity: 0,
            status: req.status,
            created_at: now,
            updated_at: now,
        };

        self.state
            .db
            .products()
            .insert(&created)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => DbError::duplicate("sku", &sku),
                other => other,
            })?;

        info!(sku = %created.sku, stock = created.stock_quantity, "Product created");
        Ok(created)
    }

    pub async fn get(&self, product_id: &str) -> ApiResult<Product> {
        self.state
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    pub async fn list(&self, query: ListProductsQuery) -> ApiResult<ProductPage> {
        let limit = query.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let repo = self.state.db.products();
        let products = repo.list(query.status, limit, offset).await?;
        let total = repo.count_by_status(query.status).await?;

        Ok(ProductPage {
            products,
            total,
            limit,
            offset,
        })
    }

    /// Adds an inbound delivery to the on-hand stock.
    pub async fn restock(&self, product_id: &str, req: RestockRequest) -> ApiResult<Product> {
        validate_restock_quantity(req.quantity)?;

        let mut tx = self.state.db.begin().await?;
        if !inventory::restock(&mut tx, product_id, req.quantity).await? {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }
        let updated = product::find_by_id(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        tx.commit().await?;

        info!(
            sku = %updated.sku,
            added = req.quantity,
            stock = updated.stock_quantity,
            "Product restocked"
        );
        Ok(updated)
    }
}
