//! Product catalog service
//!
//! CRUD over the product entity with derived stock status, JSON
//! specification blobs, soft/hard delete with dependency checks, and
//! bulk operations.
//! Every stock change appends one inventory movement in the same
//! transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{EntityStatus, MovementType, StockStatus};
use shared::types::{BulkItemOutcome, BulkSummary, PageQuery, Paginated};
use shared::validation::{slugify, validate_price};
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldError};
use crate::services::inventory::{InventoryService, NewMovement};

const PRODUCT_COLUMNS: &str = r#"p.id, p.name, p.slug, p.category_id, c.name AS category_name,
       p.brand, p.sku, p.part_number, p.price, p.cost_price, p.stock, p.min_stock,
       p.max_stock, p.specifications, p.compatibility, p.dimensions, p.status,
       p.featured, p.created_by, p.created_at, p.updated_at"#;

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: MySqlPool,
}

/// Product record with its category name and derived stock status
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub brand: Option<String>,
    pub sku: String,
    pub part_number: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub compatibility: Option<serde_json::Value>,
    pub dimensions: Option<serde_json::Value>,
    pub status: String,
    pub featured: bool,
    pub created_by: Option<i64>,
    #[sqlx(skip)]
    pub stock_status: Option<StockStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    fn with_stock_status(mut self) -> Self {
        self.stock_status = Some(StockStatus::classify(self.stock, self.min_stock));
        self
    }
}

/// Listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub stock_status: Option<StockStatus>,
    pub featured: Option<bool>,
    pub include_stats: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Aggregate statistics over the filtered catalog
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CatalogStats {
    pub total_products: i64,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub price_avg: Option<Decimal>,
    pub inventory_value: Decimal,
    pub out_of_stock: i64,
    pub low_stock: i64,
    pub normal_stock: i64,
}

/// Listing response: one page plus optional aggregates
#[derive(Debug, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub page: Paginated<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CatalogStats>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub category_id: i64,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub slug: Option<String>,
    pub part_number: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub compatibility: Option<serde_json::Value>,
    pub dimensions: Option<serde_json::Value>,
    pub featured: Option<bool>,
}

/// Input for a full update: core fields are mandatory
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: String,
    pub category_id: i64,
    pub price: Decimal,
    pub stock: i32,
    pub brand: Option<String>,
    pub part_number: Option<String>,
    pub cost_price: Option<Decimal>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub compatibility: Option<serde_json::Value>,
    pub dimensions: Option<serde_json::Value>,
    pub featured: Option<bool>,
}

/// Input for a partial update: any subset of the whitelisted fields
#[derive(Debug, Default, Deserialize)]
pub struct PatchProductInput {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub part_number: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub compatibility: Option<serde_json::Value>,
    pub dimensions: Option<serde_json::Value>,
    pub featured: Option<bool>,
    pub status: Option<EntityStatus>,
}

/// One entry in a bulk stock update
#[derive(Debug, Deserialize)]
pub struct BulkStockEntry {
    pub product_id: i64,
    pub stock: i32,
}

impl ProductService {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    /// List active products with filters, pagination and optional stats
    pub async fn list(
        &self,
        filters: ProductFilters,
        page: PageQuery,
    ) -> AppResult<ProductListing> {
        let pagination = page.clamp();

        let mut count_qb =
            QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM products p WHERE p.status = 'active'");
        Self::push_filters(&mut count_qb, &filters);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<MySql>::new(format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.status = 'active'
            "#
        ));
        Self::push_filters(&mut qb, &filters);

        let sort_col = match filters.sort_by.as_deref() {
            Some("name") => "p.name",
            Some("price") => "p.price",
            Some("stock") => "p.stock",
            _ => "p.created_at",
        };
        let sort_dir = match filters.sort_dir.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        };
        qb.push(format!(" ORDER BY {} {} LIMIT ", sort_col, sort_dir));
        qb.push_bind(pagination.limit);
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let products: Vec<Product> = qb
            .build_query_as::<Product>()
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(Product::with_stock_status)
            .collect();

        let stats = if filters.include_stats.unwrap_or(false) {
            let mut stats_qb = QueryBuilder::<MySql>::new(
                r#"
                SELECT COUNT(*) AS total_products,
                       MIN(p.price) AS price_min,
                       MAX(p.price) AS price_max,
                       AVG(p.price) AS price_avg,
                       COALESCE(SUM(p.stock * p.price), 0) AS inventory_value,
                       CAST(COALESCE(SUM(p.stock <= 0), 0) AS SIGNED) AS out_of_stock,
                       CAST(COALESCE(SUM(p.stock > 0 AND p.stock <= p.min_stock), 0) AS SIGNED) AS low_stock,
                       CAST(COALESCE(SUM(p.stock > p.min_stock), 0) AS SIGNED) AS normal_stock
                FROM products p
                WHERE p.status = 'active'
                "#,
            );
            Self::push_filters(&mut stats_qb, &filters);
            Some(
                stats_qb
                    .build_query_as::<CatalogStats>()
                    .fetch_one(&self.db)
                    .await?,
            )
        } else {
            None
        };

        Ok(ProductListing {
            page: Paginated::new(products, pagination, total as u64),
            stats,
        })
    }

    fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filters: &ProductFilters) {
        if let Some(category_id) = filters.category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let like = format!("%{}%", search.trim());
            qb.push(" AND (p.name LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR p.sku LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR p.part_number LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR p.brand LIKE ");
            qb.push_bind(like);
            qb.push(")");
        }
        if let Some(price_min) = filters.price_min {
            qb.push(" AND p.price >= ");
            qb.push_bind(price_min);
        }
        if let Some(price_max) = filters.price_max {
            qb.push(" AND p.price <= ");
            qb.push_bind(price_max);
        }
        match filters.stock_status {
            Some(StockStatus::OutOfStock) => {
                qb.push(" AND p.stock <= 0");
            }
            Some(StockStatus::LowStock) => {
                qb.push(" AND p.stock > 0 AND p.stock <= p.min_stock");
            }
            Some(StockStatus::Normal) => {
                qb.push(" AND p.stock > p.min_stock");
            }
            None => {}
        }
        if let Some(featured) = filters.featured {
            qb.push(" AND p.featured = ");
            qb.push_bind(featured);
        }
    }

    /// Get one product by id, regardless of status
    pub async fn get(&self, id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Product::with_stock_status)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Get an active product by slug
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.slug = ? AND p.status = 'active'
            "#
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await?
        .map(Product::with_stock_status)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Get an active product by part number
    pub async fn get_by_part_number(&self, part_number: &str) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.part_number = ? AND p.status = 'active'
            "#
        ))
        .bind(part_number)
        .fetch_optional(&self.db)
        .await?
        .map(Product::with_stock_status)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Create a product. Slug and SKU are generated when absent; initial
    /// stock is recorded in the ledger.
    pub async fn create(&self, input: CreateProductInput, user_id: i64) -> AppResult<Product> {
        let mut errors = Vec::new();

        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if let Err(msg) = validate_price(input.price) {
            errors.push(FieldError::new("price", msg));
        }
        let stock = input.stock.unwrap_or(0);
        if stock < 0 {
            errors.push(FieldError::new("stock", "Stock cannot be negative"));
        }
        let min_stock = input.min_stock.unwrap_or(0);
        if min_stock < 0 {
            errors.push(FieldError::new("min_stock", "Minimum stock cannot be negative"));
        }

        match self.category_status(input.category_id).await? {
            None => errors.push(FieldError::new("category_id", "Category does not exist")),
            Some(status) if status != "active" => {
                errors.push(FieldError::new("category_id", "Category is not active"));
            }
            Some(_) => {}
        }

        if let Some(sku) = input.sku.as_deref().filter(|s| !s.trim().is_empty()) {
            if self.sku_taken(sku.trim(), None).await? {
                errors.push(FieldError::new("sku", "SKU already in use"));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let name = input.name.trim().to_string();
        let slug_base = match input.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => s.trim().to_string(),
            None => slugify(&name),
        };
        let slug = self.unique_slug(&slug_base).await?;
        let sku = match input.sku.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => s.trim().to_string(),
            None => self.generate_sku().await?,
        };

        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO products
                (name, slug, category_id, brand, sku, part_number, price, cost_price,
                 stock, min_stock, max_stock, specifications, compatibility, dimensions,
                 featured, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(input.category_id)
        .bind(&input.brand)
        .bind(&sku)
        .bind(&input.part_number)
        .bind(input.price)
        .bind(input.cost_price)
        .bind(stock)
        .bind(min_stock)
        .bind(input.max_stock)
        .bind(&input.specifications)
        .bind(&input.compatibility)
        .bind(&input.dimensions)
        .bind(input.featured.unwrap_or(false))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let product_id = result.last_insert_id() as i64;

        if stock > 0 {
            InventoryService::record_tx(
                &mut tx,
                NewMovement {
                    product_id,
                    movement_type: MovementType::Initial,
                    quantity: stock,
                    previous_stock: 0,
                    new_stock: stock,
                    unit_cost: input.cost_price,
                    reference_type: Some("product_creation".to_string()),
                    reference_id: Some(product_id),
                    notes: None,
                    created_by: Some(user_id),
                },
            )
            .await?;
        }

        tx.commit().await?;

        self.get(product_id).await
    }

    /// Full update: all core fields required
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProductInput,
        user_id: i64,
    ) -> AppResult<Product> {
        let patch = PatchProductInput {
            name: Some(input.name),
            category_id: Some(input.category_id),
            price: Some(input.price),
            stock: Some(input.stock),
            brand: input.brand,
            part_number: input.part_number,
            cost_price: input.cost_price,
            min_stock: input.min_stock,
            max_stock: input.max_stock,
            specifications: input.specifications,
            compatibility: input.compatibility,
            dimensions: input.dimensions,
            featured: input.featured,
            ..Default::default()
        };
        self.patch(id, patch, user_id).await
    }

    /// Partial update over the whitelisted fields. A stock change appends
    /// one movement typed by the delta sign.
    pub async fn patch(
        &self,
        id: i64,
        input: PatchProductInput,
        user_id: i64,
    ) -> AppResult<Product> {
        let mut errors = Vec::new();

        if let Some(name) = input.name.as_deref() {
            if name.trim().is_empty() {
                errors.push(FieldError::new("name", "Name cannot be empty"));
            }
        }
        if let Some(price) = input.price {
            if let Err(msg) = validate_price(price) {
                errors.push(FieldError::new("price", msg));
            }
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                errors.push(FieldError::new("stock", "Stock cannot be negative"));
            }
        }
        if let Some(min_stock) = input.min_stock {
            if min_stock < 0 {
                errors.push(FieldError::new("min_stock", "Minimum stock cannot be negative"));
            }
        }
        if let Some(category_id) = input.category_id {
            match self.category_status(category_id).await? {
                None => errors.push(FieldError::new("category_id", "Category does not exist")),
                Some(status) if status != "active" => {
                    errors.push(FieldError::new("category_id", "Category is not active"));
                }
                Some(_) => {}
            }
        }
        if let Some(sku) = input.sku.as_deref() {
            if sku.trim().is_empty() {
                errors.push(FieldError::new("sku", "SKU cannot be empty"));
            } else if self.sku_taken(sku.trim(), Some(id)).await? {
                errors.push(FieldError::new("sku", "SKU already in use"));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = ?
            FOR UPDATE
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| current.name.clone());
        let category_id = input.category_id.unwrap_or(current.category_id);
        let sku = input
            .sku
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| current.sku.clone());
        let price = input.price.unwrap_or(current.price);
        let cost_price = input.cost_price.or(current.cost_price);
        let new_stock = input.stock.unwrap_or(current.stock);
        let min_stock = input.min_stock.unwrap_or(current.min_stock);
        let max_stock = input.max_stock.or(current.max_stock);
        let status = input
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| current.status.clone());

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, category_id = ?, brand = ?, sku = ?, part_number = ?,
                price = ?, cost_price = ?, stock = ?, min_stock = ?, max_stock = ?,
                specifications = ?, compatibility = ?, dimensions = ?,
                status = ?, featured = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(category_id)
        .bind(input.brand.or(current.brand.clone()))
        .bind(&sku)
        .bind(input.part_number.or(current.part_number.clone()))
        .bind(price)
        .bind(cost_price)
        .bind(new_stock)
        .bind(min_stock)
        .bind(max_stock)
        .bind(input.specifications.or(current.specifications.clone()))
        .bind(input.compatibility.or(current.compatibility.clone()))
        .bind(input.dimensions.or(current.dimensions.clone()))
        .bind(&status)
        .bind(input.featured.unwrap_or(current.featured))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some((movement_type, quantity)) =
            MovementType::for_stock_delta(current.stock, new_stock)
        {
            InventoryService::record_tx(
                &mut tx,
                NewMovement {
                    product_id: id,
                    movement_type,
                    quantity,
                    previous_stock: current.stock,
                    new_stock,
                    unit_cost: cost_price,
                    reference_type: Some("product_update".to_string()),
                    reference_id: Some(id),
                    notes: None,
                    created_by: Some(user_id),
                },
            )
            .await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Soft delete: status flips to inactive, stock is zeroed with one
    /// compensating `out` movement. Hard delete (admin) reconciles
    /// dependent records first.
    pub async fn delete(
        &self,
        id: i64,
        hard: bool,
        force: bool,
        user_id: i64,
    ) -> AppResult<()> {
        if !hard {
            return self.soft_delete(id, user_id).await;
        }

        let sale_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sale_items WHERE product_id = ?",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        let movements = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_movements WHERE product_id = ?",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let has_dependencies = sale_items > 0 || movements > 0 || stock != 0;
        if has_dependencies && !force {
            return Err(AppError::Conflict {
                message: "Product has dependent records; pass force=1 to delete anyway"
                    .to_string(),
                details: Some(serde_json::json!({
                    "sale_items": sale_items,
                    "movements": movements,
                    "stock": stock,
                })),
            });
        }

        let mut tx = self.db.begin().await?;

        // Sale history survives: snapshots are annotated, not deleted
        sqlx::query(
            r#"
            UPDATE sale_items
            SET product_name = CONCAT(product_name, ' [ELIMINADO]'), product_id = NULL
            WHERE product_id = ?
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM inventory_movements WHERE product_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn soft_delete(&self, id: i64, user_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let outcome = Self::soft_delete_tx(&mut tx, id, user_id).await;
        match outcome {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Soft-delete steps inside an open transaction; shared with the
    /// bulk path.
    async fn soft_delete_tx(
        tx: &mut Transaction<'_, MySql>,
        id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        let row = sqlx::query_as::<_, (i32, String)>(
            "SELECT stock, status FROM products WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let (stock, status) = row;
        if status == "inactive" {
            return Err(AppError::conflict("Product is already inactive"));
        }

        if stock > 0 {
            InventoryService::record_tx(
                tx,
                NewMovement {
                    product_id: id,
                    movement_type: MovementType::Out,
                    quantity: stock,
                    previous_stock: stock,
                    new_stock: 0,
                    unit_cost: None,
                    reference_type: Some("product_deletion".to_string()),
                    reference_id: Some(id),
                    notes: None,
                    created_by: Some(user_id),
                },
            )
            .await?;
        }

        sqlx::query("UPDATE products SET status = 'inactive', stock = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Bring a soft-deleted product back, optionally restocking it
    pub async fn restore(
        &self,
        id: i64,
        stock: Option<i32>,
        user_id: i64,
    ) -> AppResult<Product> {
        if let Some(stock) = stock {
            if stock < 0 {
                return Err(AppError::validation("stock", "Stock cannot be negative"));
            }
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, (i32, String)>(
            "SELECT stock, status FROM products WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let (current_stock, status) = row;
        if status != "inactive" {
            return Err(AppError::conflict("Product is not in the trash"));
        }

        let new_stock = current_stock + stock.unwrap_or(0);
        sqlx::query("UPDATE products SET status = 'active', stock = ? WHERE id = ?")
            .bind(new_stock)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if new_stock > current_stock {
            InventoryService::record_tx(
                &mut tx,
                NewMovement {
                    product_id: id,
                    movement_type: MovementType::In,
                    quantity: new_stock - current_stock,
                    previous_stock: current_stock,
                    new_stock,
                    unit_cost: None,
                    reference_type: Some("product_restore".to_string()),
                    reference_id: Some(id),
                    notes: None,
                    created_by: Some(user_id),
                },
            )
            .await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Soft-deleted products, newest first
    pub async fn trash(&self, page: PageQuery) -> AppResult<Paginated<Product>> {
        let pagination = page.clamp();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE status = 'inactive'",
        )
        .fetch_one(&self.db)
        .await?;

        let products: Vec<Product> = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.status = 'inactive'
            ORDER BY p.updated_at DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(Product::with_stock_status)
        .collect();

        Ok(Paginated::new(products, pagination, total as u64))
    }

    /// Soft-delete many products in one transaction. Per-item failures
    /// are collected; the successful subset commits.
    pub async fn bulk_delete(&self, ids: Vec<i64>, user_id: i64) -> AppResult<BulkSummary> {
        if ids.is_empty() {
            return Err(AppError::validation("ids", "At least one product id is required"));
        }

        let mut tx = self.db.begin().await?;
        let mut results = Vec::with_capacity(ids.len());

        for id in ids {
            match Self::soft_delete_tx(&mut tx, id, user_id).await {
                Ok(()) => results.push(BulkItemOutcome::ok(id)),
                Err(AppError::Database(e)) => return Err(AppError::Database(e)),
                Err(e) => results.push(BulkItemOutcome::failed(id, e.to_string())),
            }
        }

        tx.commit().await?;
        Ok(BulkSummary::from_results(results))
    }

    /// Set absolute stock for many products in one transaction, one
    /// movement per changed product. Per-item failures are collected.
    pub async fn bulk_stock_update(
        &self,
        entries: Vec<BulkStockEntry>,
        user_id: i64,
    ) -> AppResult<BulkSummary> {
        if entries.is_empty() {
            return Err(AppError::validation("items", "At least one entry is required"));
        }

        let mut tx = self.db.begin().await?;
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.stock < 0 {
                results.push(BulkItemOutcome::failed(
                    entry.product_id,
                    "Stock cannot be negative",
                ));
                continue;
            }

            let current = sqlx::query_scalar::<_, i32>(
                "SELECT stock FROM products WHERE id = ? FOR UPDATE",
            )
            .bind(entry.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let current = match current {
                Some(stock) => stock,
                None => {
                    results.push(BulkItemOutcome::failed(entry.product_id, "Product not found"));
                    continue;
                }
            };

            if let Some((movement_type, quantity)) =
                MovementType::for_stock_delta(current, entry.stock)
            {
                sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
                    .bind(entry.stock)
                    .bind(entry.product_id)
                    .execute(&mut *tx)
                    .await?;

                InventoryService::record_tx(
                    &mut tx,
                    NewMovement {
                        product_id: entry.product_id,
                        movement_type,
                        quantity,
                        previous_stock: current,
                        new_stock: entry.stock,
                        unit_cost: None,
                        reference_type: Some("bulk_stock_update".to_string()),
                        reference_id: None,
                        notes: None,
                        created_by: Some(user_id),
                    },
                )
                .await?;
            }

            results.push(BulkItemOutcome::ok(entry.product_id));
        }

        tx.commit().await?;
        Ok(BulkSummary::from_results(results))
    }

    async fn category_status(&self, category_id: i64) -> AppResult<Option<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT status FROM categories WHERE id = ?",
        )
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?)
    }

    async fn sku_taken(&self, sku: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let count = match exclude_id {
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM products WHERE sku = ? AND id <> ?",
                )
                .bind(sku)
                .bind(id)
                .fetch_one(&self.db)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE sku = ?")
                    .bind(sku)
                    .fetch_one(&self.db)
                    .await?
            }
        };
        Ok(count > 0)
    }

    /// Probe for a free slug, appending -2, -3, ... when taken
    async fn unique_slug(&self, base: &str) -> AppResult<String> {
        let base = if base.is_empty() { "product" } else { base };
        let mut candidate = base.to_string();
        let mut suffix = 2;
        loop {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE slug = ?",
            )
            .bind(&candidate)
            .fetch_one(&self.db)
            .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }

    /// Generate a unique SKU of the form PT-XXXXXXXX
    async fn generate_sku(&self) -> AppResult<String> {
        loop {
            let candidate = Self::sku_candidate();
            if !self.sku_taken(&candidate, None).await? {
                return Ok(candidate);
            }
        }
    }

    fn sku_candidate() -> String {
        let uuid = Uuid::new_v4().simple().to_string();
        format!("PT-{}", uuid[..8].to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_candidate_format() {
        let sku = ProductService::sku_candidate();
        assert!(sku.starts_with("PT-"));
        assert_eq!(sku.len(), 11);
        assert!(sku[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn sku_candidates_differ() {
        assert_ne!(ProductService::sku_candidate(), ProductService::sku_candidate());
    }
}
