//! Category management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::EntityStatus;
use shared::validation::slugify;
use sqlx::MySqlPool;

use crate::error::{AppError, AppResult, FieldError};

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: MySqlPool,
}

/// Category record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with its product count, as returned by listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: Option<EntityStatus>,
}

impl CategoryService {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    /// List categories with product counts
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<CategoryWithCount>> {
        let status_clause = if include_inactive {
            ""
        } else {
            "WHERE c.status = 'active'"
        };

        let categories = sqlx::query_as::<_, CategoryWithCount>(&format!(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.icon, c.status,
                   COUNT(p.id) AS product_count, c.created_at, c.updated_at
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id AND p.status = 'active'
            {}
            GROUP BY c.id, c.name, c.slug, c.description, c.icon, c.status,
                     c.created_at, c.updated_at
            ORDER BY c.name ASC
            "#,
            status_clause
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Get one category by id
    pub async fn get(&self, id: i64) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, description, icon, status, created_at, updated_at
            FROM categories
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    /// Create a category with a unique name and slug
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<Category> {
        let mut errors = Vec::new();
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let name = input.name.trim().to_string();
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE name = ?",
        )
        .bind(&name)
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::conflict("A category with this name already exists"));
        }

        let slug = match input.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => slugify(&name),
        };
        let slug = self.unique_slug(&slug).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO categories (name, slug, description, icon)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(&input.description)
        .bind(&input.icon)
        .execute(&self.db)
        .await?;

        self.get(result.last_insert_id() as i64).await
    }

    /// Update a category in place
    pub async fn update(&self, id: i64, input: UpdateCategoryInput) -> AppResult<Category> {
        let existing = self.get(id).await?;

        let name = match input.name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            Some(_) => {
                return Err(AppError::validation("name", "Name cannot be empty"));
            }
            None => existing.name.clone(),
        };

        if name != existing.name {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM categories WHERE name = ? AND id <> ?",
            )
            .bind(&name)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
            if taken > 0 {
                return Err(AppError::conflict("A category with this name already exists"));
            }
        }

        let status = input
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(existing.status);

        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, description = ?, icon = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(input.description.or(existing.description))
        .bind(input.icon.or(existing.icon))
        .bind(&status)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    /// Soft-delete by default; hard delete only when nothing references
    /// the category.
    pub async fn delete(&self, id: i64, hard: bool) -> AppResult<()> {
        let _ = self.get(id).await?;

        let product_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = ?",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if hard {
            if product_count > 0 {
                return Err(AppError::Conflict {
                    message: "Category has associated products".to_string(),
                    details: Some(serde_json::json!({ "products": product_count })),
                });
            }
            sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(id)
                .execute(&self.db)
                .await?;
        } else {
            sqlx::query("UPDATE categories SET status = 'inactive' WHERE id = ?")
                .bind(id)
                .execute(&self.db)
                .await?;
        }

        Ok(())
    }

    /// Probe for a free slug, appending -2, -3, ... when taken
    async fn unique_slug(&self, base: &str) -> AppResult<String> {
        let base = if base.is_empty() { "category" } else { base };
        let mut candidate = base.to_string();
        let mut suffix = 2;
        loop {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM categories WHERE slug = ?",
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
}
