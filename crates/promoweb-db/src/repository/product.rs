//! # Product Repository
//!
//! Catalogue reads and writes. Stock movements live in the inventory
//! ledger ([`super::inventory`]).
//!
//! ## Read Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront listing      list(status, limit, offset)  → pool            │
//! │  Product page            get_by_id(id)                → pool            │
//! │  Checkout (in tx)        find_by_id(&mut tx, id)      → snapshot source │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use promoweb_core::{Product, ProductStatus};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, sku, name, brand, image_url, price_xaf, weight_grams, \
     stock_quantity, reserved_quantity, status, created_at, updated_at";

// =============================================================================
// Connection-level queries (usable inside a transaction)
// =============================================================================

/// Loads a product on the given connection.
pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = ?1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Inserts a product on the given connection.
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, brand, image_url, price_xaf, weight_grams,
            stock_quantity, reserved_quantity, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.brand)
    .bind(&product.image_url)
    .bind(product.price_xaf)
    .bind(product.weight_grams)
    .bind(product.stock_quantity)
    .bind(product.reserved_quantity)
    .bind(product.status)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } if field.ends_with("sku") => {
            DbError::duplicate("sku", product.sku.clone())
        }
        other => other,
    })?;

    debug!(sku = %product.sku, "Inserted product");
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let page = repo.list(Some(ProductStatus::Active), 20, 0).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE sku = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by name, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<ProductStatus>,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY name
            LIMIT ?2 OFFSET ?3
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, product).await
    }

    /// Counts all products.
    ///
    /// ## Usage
    /// The seed binary skips seeding when the catalogue is not empty.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts products with the given status (all when `None`).
    pub async fn count_by_status(&self, status: Option<ProductStatus>) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
