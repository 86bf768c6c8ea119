//! # Customer Repository
//!
//! Loyalty customers. Points are written by the Sale Transaction Processor
//! at sale time; here they can also be adjusted manually (redemptions).
//! Purchase history figures are derived from the sales table at query time.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use botigest_core::validation::validate_name;
use botigest_core::{Customer, Money, NewCustomer};

/// Derived purchase figures for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct PurchaseSummary {
    pub total_spent: Money,
    pub sale_count: i64,
    pub last_visit: Option<DateTime<Utc>>,
}

/// Repository for customer operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer with zero points.
    ///
    /// ## Errors
    /// * `Validation` - empty or overlong name
    /// * `UniqueViolation` - duplicate RUT
    pub async fn create(&self, new_customer: &NewCustomer) -> StoreResult<Customer> {
        validate_name(&new_customer.name)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO customers (rut, name, email, phone, address, points, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            "#,
        )
        .bind(&new_customer.rut)
        .bind(new_customer.name.trim())
        .bind(&new_customer.email)
        .bind(&new_customer.phone)
        .bind(&new_customer.address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(customer_id = id, "customer created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Customer", id))
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Gets a customer by RUT.
    pub async fn get_by_rut(&self, rut: &str) -> StoreResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE rut = ?1")
            .bind(rut)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// All customers, alphabetical.
    pub async fn list(&self) -> StoreResult<Vec<Customer>> {
        let customers =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;

        Ok(customers)
    }

    /// Updates contact fields. Points are not touched here.
    pub async fn update(&self, customer: &Customer) -> StoreResult<Customer> {
        validate_name(&customer.name)?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET rut = ?2, name = ?3, email = ?4, phone = ?5, address = ?6
            WHERE id = ?1
            "#,
        )
        .bind(customer.id)
        .bind(&customer.rut)
        .bind(customer.name.trim())
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", customer.id));
        }

        self.get_by_id(customer.id)
            .await?
            .ok_or_else(|| StoreError::not_found("Customer", customer.id))
    }

    /// Adjusts loyalty points by a signed delta (negative for redemptions).
    /// The `points >= 0` CHECK turns an over-redemption into a Conflict.
    pub async fn add_points(&self, customer_id: i64, delta: i64) -> StoreResult<i64> {
        let result = sqlx::query("UPDATE customers SET points = points + ?2 WHERE id = ?1")
            .bind(customer_id)
            .bind(delta)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::QueryFailed(msg) if msg.contains("CHECK constraint failed") => {
                    StoreError::Conflict("points cannot go negative".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", customer_id));
        }

        let points: i64 = sqlx::query_scalar("SELECT points FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(points)
    }

    /// Lifetime spend, sale count and last visit, derived from sale history.
    pub async fn purchase_summary(&self, customer_id: i64) -> StoreResult<PurchaseSummary> {
        if self.get_by_id(customer_id).await?.is_none() {
            return Err(StoreError::not_found("Customer", customer_id));
        }

        let summary = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT
                COALESCE(SUM(total), 0) AS total_spent,
                COUNT(*) AS sale_count,
                MAX(created_at) AS last_visit
            FROM sales
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Deletes a customer. Past sales keep their `customer_id` reference, so
    /// deletion fails with a foreign key error while history exists.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
