//! Inventory ledger service
//!
//! Movements are append-only: every stock-affecting operation writes
//! exactly one row per product inside the surrounding transaction, with
//! before/after snapshots. Nothing here updates or deletes history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::MovementType;
use shared::types::{PageQuery, Paginated};
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};

use crate::error::{AppError, AppResult};

/// Inventory service
#[derive(Clone)]
pub struct InventoryService {
    db: MySqlPool,
}

/// A ledger entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A movement about to be appended
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

/// Listing filters
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilters {
    pub product_id: Option<i64>,
    pub movement_type: Option<MovementType>,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: i64,
    pub new_stock: i32,
    pub notes: Option<String>,
}

/// Product row in the low-stock report
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub min_stock: i32,
}

impl InventoryService {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    /// Append one movement inside an open transaction
    pub async fn record_tx(tx: &mut Transaction<'_, MySql>, m: NewMovement) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_movements
                (product_id, movement_type, quantity, previous_stock, new_stock,
                 unit_cost, reference_type, reference_id, notes, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(m.product_id)
        .bind(m.movement_type.as_str())
        .bind(m.quantity)
        .bind(m.previous_stock)
        .bind(m.new_stock)
        .bind(m.unit_cost)
        .bind(&m.reference_type)
        .bind(m.reference_id)
        .bind(&m.notes)
        .bind(m.created_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// List movements, newest first
    pub async fn list(
        &self,
        filters: MovementFilters,
        page: PageQuery,
    ) -> AppResult<Paginated<InventoryMovement>> {
        let pagination = page.clamp();

        let mut count_qb = QueryBuilder::<MySql>::new(
            "SELECT COUNT(*) FROM inventory_movements m WHERE 1=1",
        );
        Self::push_filters(&mut count_qb, &filters);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name, m.movement_type, m.quantity,
                   m.previous_stock, m.new_stock, m.unit_cost, m.reference_type,
                   m.reference_id, m.notes, m.created_by, m.created_at
            FROM inventory_movements m
            LEFT JOIN products p ON p.id = m.product_id
            WHERE 1=1
            "#,
        );
        Self::push_filters(&mut qb, &filters);
        qb.push(" ORDER BY m.created_at DESC, m.id DESC LIMIT ");
        qb.push_bind(pagination.limit);
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let movements = qb
            .build_query_as::<InventoryMovement>()
            .fetch_all(&self.db)
            .await?;

        Ok(Paginated::new(movements, pagination, total as u64))
    }

    fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filters: &MovementFilters) {
        if let Some(product_id) = filters.product_id {
            qb.push(" AND m.product_id = ");
            qb.push_bind(product_id);
        }
        if let Some(movement_type) = filters.movement_type {
            qb.push(" AND m.movement_type = ");
            qb.push_bind(movement_type.as_str());
        }
    }

    /// Movements for one product, newest first
    pub async fn for_product(
        &self,
        product_id: i64,
        page: PageQuery,
    ) -> AppResult<Paginated<InventoryMovement>> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE id = ?",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;
        if exists == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        self.list(
            MovementFilters {
                product_id: Some(product_id),
                movement_type: None,
            },
            page,
        )
        .await
    }

    /// Manual absolute stock correction. Writes one `adjustment` movement
    /// and the new stock atomically.
    pub async fn adjust_stock(
        &self,
        input: AdjustStockInput,
        user_id: i64,
    ) -> AppResult<InventoryMovement> {
        if input.new_stock < 0 {
            return Err(AppError::validation(
                "new_stock",
                "Stock cannot be negative",
            ));
        }

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM products WHERE id = ? FOR UPDATE",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if current == input.new_stock {
            return Err(AppError::conflict("Stock already at the requested value"));
        }

        sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
            .bind(input.new_stock)
            .bind(input.product_id)
            .execute(&mut *tx)
            .await?;

        Self::record_tx(
            &mut tx,
            NewMovement {
                product_id: input.product_id,
                movement_type: MovementType::Adjustment,
                quantity: (input.new_stock - current).abs(),
                previous_stock: current,
                new_stock: input.new_stock,
                unit_cost: None,
                reference_type: Some("manual_adjustment".to_string()),
                reference_id: None,
                notes: input.notes.clone(),
                created_by: Some(user_id),
            },
        )
        .await?;

        tx.commit().await?;

        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name, m.movement_type, m.quantity,
                   m.previous_stock, m.new_stock, m.unit_cost, m.reference_type,
                   m.reference_id, m.notes, m.created_by, m.created_at
            FROM inventory_movements m
            LEFT JOIN products p ON p.id = m.product_id
            WHERE m.product_id = ?
            ORDER BY m.id DESC
            LIMIT 1
            "#,
        )
        .bind(input.product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(movement)
    }

    /// Active products at or below their minimum stock threshold
    pub async fn low_stock(&self) -> AppResult<Vec<LowStockProduct>> {
        let products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT id, name, sku, stock, min_stock
            FROM products
            WHERE status = 'active' AND stock <= min_stock
            ORDER BY stock ASC, name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }
}
