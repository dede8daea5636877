//! HTTP handlers for category management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::models::Role;
use shared::types::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::categories::{
    Category, CategoryService, CategoryWithCount, CreateCategoryInput, UpdateCategoryInput,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesParams {
    pub include_inactive: Option<bool>,
}

/// List categories with product counts
pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ListCategoriesParams>,
) -> AppResult<Json<ApiResponse<Vec<CategoryWithCount>>>> {
    let service = CategoryService::new(state.db);
    let categories = service
        .list(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(ApiResponse::new("Categories retrieved", categories)))
}

/// Get one category
pub async fn get_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let service = CategoryService::new(state.db);
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::new("Category retrieved", category)))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = CategoryService::new(state.db);
    let category = service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Category created", category)),
    ))
}

/// Update a category
pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<Json<ApiResponse<Category>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = CategoryService::new(state.db);
    let category = service.update(id, input).await?;
    Ok(Json(ApiResponse::new("Category updated", category)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteCategoryParams {
    pub hard: Option<String>,
}

/// Soft-delete a category; `hard=1` (admin) removes the row when no
/// products reference it
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<DeleteCategoryParams>,
) -> AppResult<Json<ApiResponse<()>>> {
    let hard = matches!(params.hard.as_deref(), Some("1") | Some("true"));
    if hard {
        require_role(&current_user.0, &[Role::Admin])?;
    } else {
        require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    }
    let service = CategoryService::new(state.db);
    service.delete(id, hard).await?;
    Ok(Json(ApiResponse::new("Category deleted", ())))
}
