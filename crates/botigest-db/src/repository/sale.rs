//! # Sale Repository (Sale Transaction Processor)
//!
//! Turns a validated cart into a persisted sale: one sale row, one item row
//! per cart line, one stock decrement per line, optional loyalty points.
//! All of it inside a single transaction.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create(NewSale)                                     │
//! │                                                                         │
//! │  validate cart (pure, before any I/O)                                   │
//! │       │                                                                 │
//! │       ▼   BEGIN                                                         │
//! │  ┌─ shift gate: shift exists and is open? ──── no ──► error, rollback  │
//! │  │                                                                      │
//! │  ├─ INSERT sale (total = Σ line subtotals)                              │
//! │  │                                                                      │
//! │  ├─ per line: UPDATE products SET stock = stock - qty                   │
//! │  │            (guard trigger aborts on underflow ──► error, rollback)   │
//! │  │            INSERT sale_item (price snapshot, subtotal)               │
//! │  │                                                                      │
//! │  ├─ customer? UPDATE customers SET points = points + ⌊total/1000⌋      │
//! │  │                                                                      │
//! │  └─ COMMIT  — all-or-nothing: a failure at any step leaves no trace    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use botigest_core::validation::validate_cart;
use botigest_core::{
    points_for_total, DailyStats, Money, NewSale, Sale, SaleItem, SaleStatus, ShiftStatus,
};

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale atomically.
    ///
    /// The whole write set (sale, items, stock decrements, loyalty points)
    /// commits together or not at all: a stock underflow on the third line
    /// of a cart rolls back the decrements already applied for lines one
    /// and two, and no sale row survives.
    ///
    /// ## Errors
    /// * `Validation` - empty cart, non-positive quantity, negative price
    /// * `NotFound` - shift, product or customer does not exist
    /// * `State` - shift exists but is closed
    /// * `StockWouldGoNegative` - a line asks for more than is on hand
    pub async fn create(&self, new_sale: &NewSale) -> StoreResult<Sale> {
        validate_cart(&new_sale.lines)?;

        let total = new_sale.total();
        debug!(
            shift_id = new_sale.shift_id,
            lines = new_sale.lines.len(),
            total = %total,
            "recording sale"
        );

        let mut tx = self.pool.begin().await?;

        // Shift gate: sales only land on an open shift.
        let shift_status: Option<ShiftStatus> =
            sqlx::query_scalar("SELECT status FROM cash_shifts WHERE id = ?1")
                .bind(new_sale.shift_id)
                .fetch_optional(&mut *tx)
                .await?;

        match shift_status {
            None => return Err(StoreError::not_found("CashShift", new_sale.shift_id)),
            Some(ShiftStatus::Closed) => {
                return Err(StoreError::state("CashShift", new_sale.shift_id, "closed"))
            }
            Some(ShiftStatus::Open) => {}
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO sales (user_id, customer_id, shift_id, total, payment_method, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new_sale.user_id)
        .bind(new_sale.customer_id)
        .bind(new_sale.shift_id)
        .bind(total)
        .bind(new_sale.payment_method)
        .bind(SaleStatus::Completed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let sale_id = result.last_insert_rowid();

        for line in &new_sale.lines {
            // Decrement first: the guard trigger turns an underflow into an
            // abort here, before the item row exists.
            let updated = sqlx::query("UPDATE products SET stock = stock - ?2 WHERE id = ?1")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::not_found("Product", line.product_id));
            }

            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, price, subtotal)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal())
            .execute(&mut *tx)
            .await?;
        }

        if let Some(customer_id) = new_sale.customer_id {
            let points = points_for_total(total);
            let updated = sqlx::query("UPDATE customers SET points = points + ?2 WHERE id = ?1")
                .bind(customer_id)
                .bind(points)
                .execute(&mut *tx)
                .await?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::not_found("Customer", customer_id));
            }
        }

        tx.commit().await?;

        info!(sale_id, total = %total, "sale recorded");

        self.get_by_id(sale_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Sale", sale_id))
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Line items of a sale, in insertion order.
    pub async fn items(&self, sale_id: i64) -> StoreResult<Vec<SaleItem>> {
        let items =
            sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY id")
                .bind(sale_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(items)
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: i64) -> StoreResult<Vec<Sale>> {
        let sales =
            sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY created_at DESC, id DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(sales)
    }

    /// Today's figures with trend percentages vs. yesterday.
    pub async fn daily_stats(&self) -> StoreResult<DailyStats> {
        let today_start = Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        let tomorrow_start = today_start + Duration::days(1);
        let yesterday_start = today_start - Duration::days(1);

        let (count, total) = self.sum_between(today_start, tomorrow_start).await?;
        let (prev_count, prev_total) = self.sum_between(yesterday_start, today_start).await?;

        let average = if count > 0 {
            Money::from_units(total.units() / count)
        } else {
            Money::zero()
        };
        let prev_average = if prev_count > 0 {
            Money::from_units(prev_total.units() / prev_count)
        } else {
            Money::zero()
        };

        Ok(DailyStats {
            count,
            total,
            average,
            trend: trend_pct(total.units(), prev_total.units()),
            count_trend: trend_pct(count, prev_count),
            average_trend: trend_pct(average.units(), prev_average.units()),
        })
    }

    async fn sum_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<(i64, Money)> {
        let row: (i64, Money) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Percentage change vs. a baseline; 0.0 when there is no baseline.
fn trend_pct(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (current - previous) as f64 / previous as f64 * 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botigest_core::{CartLine, NewCustomer, NewProduct, PaymentMethod};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, code: &str, price: i64, stock: i64) -> i64 {
        db.products()
            .create(&NewProduct {
                code: code.to_string(),
                name: format!("Product {code}"),
                description: None,
                price: Money::from_units(price),
                cost: None,
                stock,
                category_id: None,
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn open_shift(db: &Database) -> (i64, i64) {
        let user = db.users().find_admin().await.unwrap().id;
        let shift = db.shifts().open(user, Money::from_units(10_000)).await.unwrap();
        (user, shift.id)
    }

    fn cart(lines: Vec<CartLine>, shift_id: i64, user_id: i64) -> NewSale {
        NewSale {
            lines,
            payment_method: PaymentMethod::Cash,
            user_id: Some(user_id),
            customer_id: None,
            shift_id,
        }
    }

    #[tokio::test]
    async fn successful_sale_decrements_stock_and_persists_lines() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let coke = seed_product(&db, "COKE", 1500, 10).await;
        let bread = seed_product(&db, "BREAD", 990, 5).await;

        let sale = db
            .sales()
            .create(&cart(
                vec![
                    CartLine { product_id: coke, quantity: 2, unit_price: Money::from_units(1500) },
                    CartLine { product_id: bread, quantity: 1, unit_price: Money::from_units(990) },
                ],
                shift_id,
                user,
            ))
            .await
            .unwrap();

        assert_eq!(sale.total, Money::from_units(3990));
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.shift_id, Some(shift_id));

        let items = db.sales().items(sale.id).await.unwrap();
        assert_eq!(items.len(), 2);
        let item_sum: Money = items.iter().map(|i| i.subtotal).sum();
        assert_eq!(item_sum, sale.total);
        assert_eq!(items[0].price, Money::from_units(1500));

        assert_eq!(db.products().get_by_id(coke).await.unwrap().unwrap().stock, 8);
        assert_eq!(db.products().get_by_id(bread).await.unwrap().unwrap().stock, 4);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_everything() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let first = seed_product(&db, "FIRST", 1000, 10).await;
        let scarce = seed_product(&db, "SCARCE", 2000, 1).await;

        // Second line underflows; the first line's decrement must not stick.
        let err = db
            .sales()
            .create(&cart(
                vec![
                    CartLine { product_id: first, quantity: 3, unit_price: Money::from_units(1000) },
                    CartLine { product_id: scarce, quantity: 5, unit_price: Money::from_units(2000) },
                ],
                shift_id,
                user,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::StockWouldGoNegative(_)), "{err}");

        assert_eq!(db.products().get_by_id(first).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.products().get_by_id(scarce).await.unwrap().unwrap().stock, 1);
        assert!(db.sales().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sale_against_closed_shift_is_rejected() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let product = seed_product(&db, "P1", 1000, 10).await;

        db.shifts()
            .close(shift_id, Money::zero(), Money::zero(), None, user)
            .await
            .unwrap();

        let err = db
            .sales()
            .create(&cart(
                vec![CartLine { product_id: product, quantity: 1, unit_price: Money::from_units(1000) }],
                shift_id,
                user,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::State { .. }), "{err}");
        assert_eq!(db.products().get_by_id(product).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn sale_against_missing_shift_is_not_found() {
        let db = db().await;
        let user = db.users().find_admin().await.unwrap().id;
        let product = seed_product(&db, "P1", 1000, 10).await;

        let err = db
            .sales()
            .create(&cart(
                vec![CartLine { product_id: product, quantity: 1, unit_price: Money::from_units(1000) }],
                404,
                user,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { .. }), "{err}");
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_io() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;

        let err = db.sales().create(&cart(vec![], shift_id, user)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn loyalty_points_accrue_per_thousand() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let product = seed_product(&db, "P1", 1990, 10).await;

        let customer = db
            .customers()
            .create(&NewCustomer { name: "Ana".to_string(), ..Default::default() })
            .await
            .unwrap();

        let mut sale = cart(
            vec![CartLine { product_id: product, quantity: 2, unit_price: Money::from_units(1990) }],
            shift_id,
            user,
        );
        sale.customer_id = Some(customer.id);

        db.sales().create(&sale).await.unwrap();

        // total 3980 → 3 points
        let customer = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(customer.points, 3);
    }

    #[tokio::test]
    async fn shift_totals_split_by_payment_method() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let product = seed_product(&db, "P1", 1000, 100).await;

        db.sales()
            .create(&cart(
                vec![CartLine { product_id: product, quantity: 3, unit_price: Money::from_units(1000) }],
                shift_id,
                user,
            ))
            .await
            .unwrap();

        let mut card_sale = cart(
            vec![CartLine { product_id: product, quantity: 2, unit_price: Money::from_units(1000) }],
            shift_id,
            user,
        );
        card_sale.payment_method = PaymentMethod::Card;
        db.sales().create(&card_sale).await.unwrap();

        let totals = db.shifts().totals(shift_id).await.unwrap();
        assert_eq!(totals.total_sales, Money::from_units(5000));
        assert_eq!(totals.cash_sales, Money::from_units(3000));
        assert_eq!(totals.card_sales, Money::from_units(2000));

        let expected = db.shifts().expected_amount(shift_id).await.unwrap();
        assert_eq!(expected, Money::from_units(13_000));
    }

    #[tokio::test]
    async fn daily_stats_count_todays_sales() {
        let db = db().await;
        let (user, shift_id) = open_shift(&db).await;
        let product = seed_product(&db, "P1", 2000, 100).await;

        for _ in 0..3 {
            db.sales()
                .create(&cart(
                    vec![CartLine { product_id: product, quantity: 1, unit_price: Money::from_units(2000) }],
                    shift_id,
                    user,
                ))
                .await
                .unwrap();
        }

        let stats = db.sales().daily_stats().await.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total, Money::from_units(6000));
        assert_eq!(stats.average, Money::from_units(2000));
        // No sales yesterday, so trends stay at the 0.0 baseline.
        assert_eq!(stats.trend, 0.0);
    }

    #[tokio::test]
    async fn full_register_day() {
        let db = db().await;
        let user = db.users().find_admin().await.unwrap().id;
        let product = seed_product(&db, "P1", 1500, 20).await;

        // Morning: open with a 10.000 float.
        let shift = db.shifts().open(user, Money::from_units(10_000)).await.unwrap();

        // One cash sale of 2 × 1.500.
        let sale = db
            .sales()
            .create(&cart(
                vec![CartLine { product_id: product, quantity: 2, unit_price: Money::from_units(1500) }],
                shift.id,
                user,
            ))
            .await
            .unwrap();
        assert_eq!(sale.total, Money::from_units(3000));
        assert_eq!(db.products().get_by_id(product).await.unwrap().unwrap().stock, 18);

        let totals = db.shifts().totals(shift.id).await.unwrap();
        assert_eq!(totals.cash_sales, Money::from_units(3000));
        assert_eq!(totals.card_sales, Money::zero());

        // Evening: drawer counted at exactly float + cash sales.
        let closed = db
            .shifts()
            .close(
                shift.id,
                Money::from_units(13_000),
                Money::from_units(13_000),
                None,
                user,
            )
            .await
            .unwrap();
        assert_eq!(closed.status, botigest_core::ShiftStatus::Closed);
        assert_eq!(closed.variance(), Some(Money::zero()));

        // Totals stay queryable after close.
        let totals = db.shifts().totals(shift.id).await.unwrap();
        assert_eq!(totals.total_sales, Money::from_units(3000));
    }

    #[test]
    fn trend_math() {
        assert_eq!(trend_pct(150, 100), 50.0);
        assert_eq!(trend_pct(50, 100), -50.0);
        assert_eq!(trend_pct(10, 0), 0.0);
    }
}
