//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::models::Role;
use shared::types::{ApiResponse, BulkSummary, PageQuery, Paginated};

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::inventory::{InventoryMovement, InventoryService};
use crate::services::products::{
    BulkStockEntry, CreateProductInput, PatchProductInput, Product, ProductFilters,
    ProductListing, ProductService, UpdateProductInput,
};
use crate::AppState;

/// Query-string flags arrive PHP-style (`force=1`); accept 1/true
fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("1") | Some("true"))
}

/// List active products with filters, pagination and optional stats
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filters): Query<ProductFilters>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ProductListing>>> {
    let service = ProductService::new(state.db);
    let listing = service.list(filters, page).await?;
    Ok(Json(ApiResponse::new("Products retrieved", listing)))
}

/// Get one product by id
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.db);
    let product = service.get(id).await?;
    Ok(Json(ApiResponse::new("Product retrieved", product)))
}

/// Get an active product by slug
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.db);
    let product = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::new("Product retrieved", product)))
}

/// Get an active product by part number
pub async fn get_product_by_part_number(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(part_number): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.db);
    let product = service.get_by_part_number(&part_number).await?;
    Ok(Json(ApiResponse::new("Product retrieved", product)))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = ProductService::new(state.db);
    let product = service.create(input, current_user.0.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Product created", product)),
    ))
}

/// Full update
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = ProductService::new(state.db);
    let product = service.update(id, input, current_user.0.user_id).await?;
    Ok(Json(ApiResponse::new("Product updated", product)))
}

/// Partial update
pub async fn patch_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<PatchProductInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = ProductService::new(state.db);
    let product = service.patch(id, input, current_user.0.user_id).await?;
    Ok(Json(ApiResponse::new("Product updated", product)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductParams {
    pub hard: Option<String>,
    pub force: Option<String>,
}

/// Soft delete by default; `hard=1` (admin) removes the row after
/// reconciling dependents, `force=1` overrides the dependency check
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<DeleteProductParams>,
) -> AppResult<Json<ApiResponse<()>>> {
    let hard = flag(&params.hard);
    let force = flag(&params.force);

    if hard {
        require_role(&current_user.0, &[Role::Admin])?;
    } else {
        require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    }

    let service = ProductService::new(state.db);
    service
        .delete(id, hard, force, current_user.0.user_id)
        .await?;
    let message = if hard {
        "Product permanently deleted"
    } else {
        "Product moved to trash"
    };
    Ok(Json(ApiResponse::new(message, ())))
}

#[derive(Debug, Default, Deserialize)]
pub struct RestoreProductInput {
    pub stock: Option<i32>,
}

/// Restore a soft-deleted product
pub async fn restore_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    input: Option<Json<RestoreProductInput>>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let stock = input.map(|Json(i)| i.stock).unwrap_or(None);
    let service = ProductService::new(state.db);
    let product = service.restore(id, stock, current_user.0.user_id).await?;
    Ok(Json(ApiResponse::new("Product restored", product)))
}

/// List soft-deleted products
pub async fn list_trash(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Product>>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = ProductService::new(state.db);
    let trash = service.trash(page).await?;
    Ok(Json(ApiResponse::new("Trash retrieved", trash)))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteInput {
    pub ids: Vec<i64>,
}

/// Soft-delete many products at once (admin only)
pub async fn bulk_delete_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkDeleteInput>,
) -> AppResult<Json<ApiResponse<BulkSummary>>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = ProductService::new(state.db);
    let summary = service
        .bulk_delete(input.ids, current_user.0.user_id)
        .await?;
    Ok(Json(ApiResponse::new("Bulk delete finished", summary)))
}

#[derive(Debug, Deserialize)]
pub struct BulkStockInput {
    pub items: Vec<BulkStockEntry>,
}

/// Set absolute stock for many products at once (admin only)
pub async fn bulk_update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkStockInput>,
) -> AppResult<Json<ApiResponse<BulkSummary>>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = ProductService::new(state.db);
    let summary = service
        .bulk_stock_update(input.items, current_user.0.user_id)
        .await?;
    Ok(Json(ApiResponse::new("Bulk stock update finished", summary)))
}

/// Ledger entries for one product
pub async fn get_product_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<InventoryMovement>>>> {
    let service = InventoryService::new(state.db);
    let movements = service.for_product(id, page).await?;
    Ok(Json(ApiResponse::new("Movements retrieved", movements)))
}
