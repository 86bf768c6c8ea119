//! # Product Repository
//!
//! Database operations for products and the Stock Ledger.
//!
//! ## Stock Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Who may write products.stock?                          │
//! │                                                                         │
//! │  Sale Transaction Processor ──► stock = stock - qty   (sale.rs, in tx) │
//! │  Ticket Workflow Engine ──────► set / += / -=        (ticket.rs, in tx)│
//! │                                                                         │
//! │  Everything else reads. The CHECK constraint and the guard trigger     │
//! │  abort any statement that would leave stock negative, so even a race  │
//! │  between the two writers cannot corrupt the ledger.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use botigest_core::validation::{validate_amount, validate_name, validate_product_code};
use botigest_core::{LowStockProduct, NewProduct, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the inserted row with its assigned id
    /// * `Err(StoreError::UniqueViolation)` - code already exists
    pub async fn create(&self, new: &NewProduct) -> StoreResult<Product> {
        validate_product_code(&new.code)?;
        validate_name(&new.name)?;
        validate_amount("price", new.price)?;
        if let Some(cost) = new.cost {
            validate_amount("cost", cost)?;
        }
        if new.stock < 0 {
            return Err(botigest_core::ValidationError::MustBeNonNegative {
                field: "stock".to_string(),
            }
            .into());
        }

        debug!(code = %new.code, "inserting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (code, name, description, price, cost, stock, category_id, image_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(new.code.trim())
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price)
        .bind(new.cost)
        .bind(new.stock)
        .bind(new.category_id)
        .bind(&new.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its unique code (barcode scan path).
    pub async fn get_by_code(&self, code: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE code = ?1")
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Updates an existing product's catalog fields.
    ///
    /// Deliberately does NOT touch `stock`: the ledger is only written by
    /// the sale and ticket transactions.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        validate_product_code(&product.code)?;
        validate_name(&product.name)?;
        validate_amount("price", product.price)?;

        debug!(id = product.id, "updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                price = ?5,
                cost = ?6,
                category_id = ?7,
                image_url = ?8
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(product.code.trim())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.cost)
        .bind(product.category_id)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Deletes a product. Fails with `ForeignKeyViolation` while sale items
    /// still reference it.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        debug!(id, "deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }

        Ok(())
    }

    /// Products at or below the given stock threshold, lowest first.
    /// Backs the `/alertas` command and the dashboard warning.
    pub async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<LowStockProduct>> {
        let products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT id, code, name, stock
            FROM products
            WHERE stock <= ?1
            ORDER BY stock ASC, name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts all products (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botigest_core::Money;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn bebida(code: &str, stock: i64) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            name: format!("Bebida {code}"),
            description: None,
            price: Money::from_units(1500),
            cost: Some(Money::from_units(900)),
            stock,
            category_id: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let db = db().await;
        let created = db.products().create(&bebida("COCA-350", 10)).await.unwrap();

        let fetched = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.code, "COCA-350");
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.price, Money::from_units(1500));

        let by_code = db.products().get_by_code("COCA-350").await.unwrap();
        assert_eq!(by_code.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn duplicate_code_is_unique_violation() {
        let db = db().await;
        db.products().create(&bebida("DUP-1", 5)).await.unwrap();

        let err = db.products().create(&bebida("DUP-1", 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }), "{err}");
    }

    #[tokio::test]
    async fn negative_initial_stock_rejected_before_write() {
        let db = db().await;
        let err = db.products().create(&bebida("NEG-1", -3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{err}");
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn guard_trigger_blocks_raw_negative_update() {
        let db = db().await;
        let p = db.products().create(&bebida("GUARD-1", 3)).await.unwrap();

        // Bypass every application check on purpose.
        let err: StoreError = sqlx::query("UPDATE products SET stock = stock - 5 WHERE id = ?1")
            .bind(p.id)
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, StoreError::StockWouldGoNegative(_)), "{err}");

        let after = db.products().get_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 3);
    }

    #[tokio::test]
    async fn low_stock_listing() {
        let db = db().await;
        db.products().create(&bebida("LOW-1", 2)).await.unwrap();
        db.products().create(&bebida("LOW-2", 10)).await.unwrap();
        db.products().create(&bebida("HIGH-1", 50)).await.unwrap();

        let low = db.products().low_stock(10).await.unwrap();
        let codes: Vec<_> = low.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["LOW-1", "LOW-2"]);
    }

    #[tokio::test]
    async fn update_does_not_touch_stock() {
        let db = db().await;
        let mut p = db.products().create(&bebida("UPD-1", 7)).await.unwrap();

        p.name = "Bebida nueva".to_string();
        p.price = Money::from_units(1990);
        p.stock = 999; // must be ignored
        db.products().update(&p).await.unwrap();

        let after = db.products().get_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(after.name, "Bebida nueva");
        assert_eq!(after.price, Money::from_units(1990));
        assert_eq!(after.stock, 7);
    }
}
