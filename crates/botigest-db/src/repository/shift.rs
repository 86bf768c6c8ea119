//! # Cash Shift Repository (Cash Shift Manager)
//!
//! Register open/close lifecycle. Sales are gated on an open shift: the
//! Sale Transaction Processor refuses to record a sale against a shift
//! that is missing or closed.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shift Lifecycle                                   │
//! │                                                                         │
//! │  open(user, float)                                                      │
//! │       │  fails Conflict if ANY shift is currently open (system-wide     │
//! │       │  policy: this is a one-register store)                          │
//! │       ▼                                                                 │
//! │  ┌────────┐   sales recorded against shift_id    ┌──────────┐          │
//! │  │  OPEN  │ ────────────────────────────────────►│  CLOSED  │          │
//! │  └────────┘   close(end, expected, notes, user)  └──────────┘          │
//! │                                                                         │
//! │  Closing is irreversible and exactly-once: a second close fails with   │
//! │  a State error. Historical sales stay queryable for totals forever.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use botigest_core::validation::validate_amount;
use botigest_core::{CashShift, Money, ShiftTotals};

/// Repository for cash shift operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a new shift with the given opening float.
    ///
    /// ## Policy: system-wide single open shift
    /// This is a one-register store; at most one shift may be open at any
    /// time regardless of user. The conflict check and the insert run in
    /// one transaction so two concurrent opens cannot both succeed.
    ///
    /// ## Errors
    /// * `Validation` - negative float amount
    /// * `Conflict` - a shift is already open
    pub async fn open(&self, user_id: i64, start_amount: Money) -> StoreResult<CashShift> {
        validate_amount("start_amount", start_amount)?;

        let mut tx = self.pool.begin().await?;

        let open_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM cash_shifts WHERE status = 'open' LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(id) = open_id {
            return Err(StoreError::Conflict(format!(
                "shift {id} is already open; close it before opening another"
            )));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO cash_shifts (user_id, start_amount, start_time, status)
            VALUES (?1, ?2, ?3, 'open')
            "#,
        )
        .bind(user_id)
        .bind(start_amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        info!(shift_id = id, user_id, start = %start_amount, "shift opened");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("CashShift", id))
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<CashShift>> {
        let shift = sqlx::query_as::<_, CashShift>("SELECT * FROM cash_shifts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Returns the currently open shift, if any (most recent wins, though
    /// by policy there is never more than one).
    pub async fn current_open(&self) -> StoreResult<Option<CashShift>> {
        let shift = sqlx::query_as::<_, CashShift>(
            "SELECT * FROM cash_shifts WHERE status = 'open' ORDER BY start_time DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Closes a shift, recording the counted and expected drawer amounts.
    ///
    /// Atomic and exactly-once: the UPDATE is guarded on `status = 'open'`,
    /// so a duplicate close (double click, replayed request) fails with a
    /// State error instead of silently overwriting the first count.
    ///
    /// ## Errors
    /// * `Validation` - negative amounts
    /// * `NotFound` - no such shift
    /// * `State` - shift is not open
    pub async fn close(
        &self,
        shift_id: i64,
        end_amount: Money,
        expected_amount: Money,
        notes: Option<&str>,
        closed_by_user_id: i64,
    ) -> StoreResult<CashShift> {
        validate_amount("end_amount", end_amount)?;
        validate_amount("expected_amount", expected_amount)?;

        debug!(shift_id, end = %end_amount, expected = %expected_amount, "closing shift");

        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE cash_shifts
            SET end_amount = ?2,
                expected_amount = ?3,
                status = 'closed',
                end_time = ?4,
                notes = ?5,
                closed_by_user_id = ?6
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(shift_id)
        .bind(end_amount)
        .bind(expected_amount)
        .bind(now)
        .bind(notes)
        .bind(closed_by_user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish "never existed" from "already closed".
            let status: Option<String> =
                sqlx::query_scalar("SELECT status FROM cash_shifts WHERE id = ?1")
                    .bind(shift_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return match status {
                None => Err(StoreError::not_found("CashShift", shift_id)),
                Some(actual) => Err(StoreError::state("CashShift", shift_id, actual)),
            };
        }

        tx.commit().await?;

        info!(shift_id, closed_by = closed_by_user_id, "shift closed");

        self.get_by_id(shift_id)
            .await?
            .ok_or_else(|| StoreError::not_found("CashShift", shift_id))
    }

    /// Aggregates sale totals for a shift, split by payment method.
    /// Pure read, valid for open and closed shifts alike.
    pub async fn totals(&self, shift_id: i64) -> StoreResult<ShiftTotals> {
        if self.get_by_id(shift_id).await?.is_none() {
            return Err(StoreError::not_found("CashShift", shift_id));
        }

        let totals = sqlx::query_as::<_, ShiftTotals>(
            r#"
            SELECT
                COALESCE(SUM(total), 0) AS total_sales,
                COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total ELSE 0 END), 0) AS cash_sales,
                COALESCE(SUM(CASE WHEN payment_method = 'card' THEN total ELSE 0 END), 0) AS card_sales
            FROM sales
            WHERE shift_id = ?1
            "#,
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Theoretical cash-in-drawer right now: opening float + cash sales.
    /// The close dialog pre-fills `expected_amount` with this.
    pub async fn expected_amount(&self, shift_id: i64) -> StoreResult<Money> {
        let shift = self
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| StoreError::not_found("CashShift", shift_id))?;

        let totals = self.totals(shift_id).await?;
        Ok(shift.start_amount + totals.cash_sales)
    }

    /// Shift history, newest first.
    pub async fn history(&self, limit: i64) -> StoreResult<Vec<CashShift>> {
        let shifts = sqlx::query_as::<_, CashShift>(
            "SELECT * FROM cash_shifts ORDER BY start_time DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botigest_core::ShiftStatus;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn admin_id(db: &Database) -> i64 {
        db.users().find_admin().await.unwrap().id
    }

    #[tokio::test]
    async fn open_and_current() {
        let db = db().await;
        let user = admin_id(&db).await;

        let shift = db.shifts().open(user, Money::from_units(10_000)).await.unwrap();
        assert_eq!(shift.status, ShiftStatus::Open);
        assert_eq!(shift.start_amount, Money::from_units(10_000));

        let current = db.shifts().current_open().await.unwrap().unwrap();
        assert_eq!(current.id, shift.id);
    }

    #[tokio::test]
    async fn second_open_conflicts_system_wide() {
        let db = db().await;
        let user = admin_id(&db).await;

        db.shifts().open(user, Money::zero()).await.unwrap();

        // Same outcome for a different user: the policy is system-wide.
        let err = db.shifts().open(user + 1, Money::zero()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }

    #[tokio::test]
    async fn negative_float_rejected() {
        let db = db().await;
        let user = admin_id(&db).await;

        let err = db
            .shifts()
            .open(user, Money::from_units(-100))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{err}");
        assert!(db.shifts().current_open().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_is_exactly_once() {
        let db = db().await;
        let user = admin_id(&db).await;
        let shift = db.shifts().open(user, Money::from_units(5000)).await.unwrap();

        let closed = db
            .shifts()
            .close(
                shift.id,
                Money::from_units(5000),
                Money::from_units(5000),
                Some("sin novedades"),
                user,
            )
            .await
            .unwrap();

        assert_eq!(closed.status, ShiftStatus::Closed);
        assert_eq!(closed.variance(), Some(Money::zero()));
        assert!(closed.end_time.is_some());
        assert_eq!(closed.closed_by_user_id, Some(user));

        // Second close must fail, not silently succeed.
        let err = db
            .shifts()
            .close(shift.id, Money::zero(), Money::zero(), None, user)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::State { .. }), "{err}");

        // And a new shift can be opened afterwards.
        db.shifts().open(user, Money::zero()).await.unwrap();
    }

    #[tokio::test]
    async fn close_missing_shift_is_not_found() {
        let db = db().await;
        let user = admin_id(&db).await;

        let err = db
            .shifts()
            .close(987, Money::zero(), Money::zero(), None, user)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "{err}");
    }

    #[tokio::test]
    async fn totals_empty_shift_are_zero() {
        let db = db().await;
        let user = admin_id(&db).await;
        let shift = db.shifts().open(user, Money::from_units(10_000)).await.unwrap();

        let totals = db.shifts().totals(shift.id).await.unwrap();
        assert_eq!(totals.total_sales, Money::zero());
        assert_eq!(totals.cash_sales, Money::zero());
        assert_eq!(totals.card_sales, Money::zero());

        let expected = db.shifts().expected_amount(shift.id).await.unwrap();
        assert_eq!(expected, Money::from_units(10_000));
    }

    #[tokio::test]
    async fn totals_unknown_shift_not_found() {
        let db = db().await;
        let err = db.shifts().totals(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "{err}");
    }
}
