//! # Category Repository
//!
//! Flat product categories. Deletion is blocked by the foreign key while
//! any product still references the category.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use botigest_core::validation::validate_name;
use botigest_core::Category;

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category.
    pub async fn create(&self, name: &str, description: Option<&str>) -> StoreResult<Category> {
        validate_name(name)?;

        let result = sqlx::query("INSERT INTO categories (name, description) VALUES (?1, ?2)")
            .bind(name.trim())
            .bind(description)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(category_id = id, name, "category created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Category", id))
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// All categories, alphabetical.
    pub async fn list(&self) -> StoreResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Deletes a category. Fails with a foreign key error while any
    /// product still belongs to it.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::ForeignKeyViolation(_) => {
                    StoreError::Conflict("category is still in use by products".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Category", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botigest_core::{Money, NewProduct};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn create_list_delete() {
        let db = db().await;

        let bebidas = db.categories().create("Bebidas", None).await.unwrap();
        db.categories().create("Abarrotes", Some("secos")).await.unwrap();

        let all = db.categories().list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Abarrotes");

        db.categories().delete(bebidas.id).await.unwrap();
        assert_eq!(db.categories().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_in_use_is_conflict() {
        let db = db().await;
        let category = db.categories().create("Bebidas", None).await.unwrap();

        db.products()
            .create(&NewProduct {
                code: "COKE".to_string(),
                name: "Coca Cola".to_string(),
                description: None,
                price: Money::from_units(1500),
                cost: None,
                stock: 10,
                category_id: Some(category.id),
                image_url: None,
            })
            .await
            .unwrap();

        let err = db.categories().delete(category.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }
}
