//! Customer management service
//!
//! Customers are resolved or created by the sale flow; their running
//! purchase totals are only ever incremented there.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CustomerType, EntityStatus};
use shared::types::{PageQuery, Paginated};
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use validator::Validate;

use crate::error::{AppError, AppResult, FieldError};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: MySqlPool,
}

/// Customer record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub customer_type: String,
    pub credit_limit: Decimal,
    pub total_purchases: Decimal,
    pub total_orders: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub credit_limit: Option<Decimal>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub credit_limit: Option<Decimal>,
    pub status: Option<EntityStatus>,
}

/// Listing filters
#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilters {
    pub search: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub include_inactive: Option<bool>,
}

/// Flatten `validator` errors into the shared field-error shape
fn collect_validator_errors(e: validator::ValidationErrors) -> Vec<FieldError> {
    e.field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string());
                FieldError::new(*field, message)
            })
        })
        .collect()
}

impl CustomerService {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    /// List customers with optional search and type filters
    pub async fn list(
        &self,
        filters: CustomerFilters,
        page: PageQuery,
    ) -> AppResult<Paginated<Customer>> {
        let pagination = page.clamp();

        let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM customers WHERE 1=1");
        Self::push_filters(&mut count_qb, &filters);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT id, name, email, phone, address, city, postal_code, customer_type,
                   credit_limit, total_purchases, total_orders, status, created_at, updated_at
            FROM customers WHERE 1=1
            "#,
        );
        Self::push_filters(&mut qb, &filters);
        qb.push(" ORDER BY name ASC LIMIT ");
        qb.push_bind(pagination.limit);
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let customers = qb.build_query_as::<Customer>().fetch_all(&self.db).await?;

        Ok(Paginated::new(customers, pagination, total as u64))
    }

    fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filters: &CustomerFilters) {
        if !filters.include_inactive.unwrap_or(false) {
            qb.push(" AND status = 'active'");
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let like = format!("%{}%", search.trim());
            qb.push(" AND (name LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR email LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR phone LIKE ");
            qb.push_bind(like);
            qb.push(")");
        }
        if let Some(ct) = filters.customer_type {
            qb.push(" AND customer_type = ");
            qb.push_bind(ct.as_str());
        }
    }

    /// Get one customer by id
    pub async fn get(&self, id: i64) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, address, city, postal_code, customer_type,
                   credit_limit, total_purchases, total_orders, status, created_at, updated_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// Create a customer
    pub async fn create(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        input
            .validate()
            .map_err(|e| AppError::Validation(collect_validator_errors(e)))?;

        let customer_type = input.customer_type.unwrap_or_default();
        let result = sqlx::query(
            r#"
            INSERT INTO customers (name, email, phone, address, city, postal_code,
                                   customer_type, credit_limit)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(customer_type.as_str())
        .bind(input.credit_limit.unwrap_or(Decimal::ZERO))
        .execute(&self.db)
        .await?;

        self.get(result.last_insert_id() as i64).await
    }

    /// Update a customer in place. Purchase totals are not updatable here.
    pub async fn update(&self, id: i64, input: UpdateCustomerInput) -> AppResult<Customer> {
        input
            .validate()
            .map_err(|e| AppError::Validation(collect_validator_errors(e)))?;

        let existing = self.get(id).await?;

        let name = match input.name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            Some(_) => return Err(AppError::validation("name", "Name cannot be empty")),
            None => existing.name.clone(),
        };
        let customer_type = input
            .customer_type
            .map(|t| t.as_str().to_string())
            .unwrap_or(existing.customer_type);
        let status = input
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(existing.status);

        sqlx::query(
            r#"
            UPDATE customers
            SET name = ?, email = ?, phone = ?, address = ?, city = ?, postal_code = ?,
                customer_type = ?, credit_limit = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(input.email.or(existing.email))
        .bind(input.phone.or(existing.phone))
        .bind(input.address.or(existing.address))
        .bind(input.city.or(existing.city))
        .bind(input.postal_code.or(existing.postal_code))
        .bind(&customer_type)
        .bind(input.credit_limit.unwrap_or(existing.credit_limit))
        .bind(&status)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    /// Soft-delete a customer; sale history keeps its snapshots
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let _ = self.get(id).await?;
        sqlx::query("UPDATE customers SET status = 'inactive' WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Resolve a customer for a sale inside the sale's transaction:
    /// match by email, then phone; create one when contact info was given.
    /// Returns `None` for walk-in sales with no contact info.
    pub async fn resolve_for_sale_tx(
        tx: &mut Transaction<'_, MySql>,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> AppResult<Option<i64>> {
        if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM customers WHERE email = ? LIMIT 1",
            )
            .bind(email.trim())
            .fetch_optional(&mut **tx)
            .await?;
            if let Some(id) = found {
                return Ok(Some(id));
            }
        }

        if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM customers WHERE phone = ? LIMIT 1",
            )
            .bind(phone.trim())
            .fetch_optional(&mut **tx)
            .await?;
            if let Some(id) = found {
                return Ok(Some(id));
            }
        }

        let has_contact = email.map_or(false, |e| !e.trim().is_empty())
            || phone.map_or(false, |p| !p.trim().is_empty());
        if !has_contact {
            return Ok(None);
        }

        let result = sqlx::query(
            "INSERT INTO customers (name, email, phone) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(email.map(str::trim))
        .bind(phone.map(str::trim))
        .execute(&mut **tx)
        .await?;

        Ok(Some(result.last_insert_id() as i64))
    }

    /// Increment a customer's running totals after a completed sale.
    /// These counters are monotonic; cancellations never decrement them.
    pub async fn record_purchase_tx(
        tx: &mut Transaction<'_, MySql>,
        customer_id: i64,
        total: Decimal,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET total_purchases = total_purchases + ?, total_orders = total_orders + 1
            WHERE id = ?
            "#,
        )
        .bind(total)
        .bind(customer_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
