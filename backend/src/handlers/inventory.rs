//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use shared::models::Role;
use shared::types::{ApiResponse, PageQuery, Paginated};

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::inventory::{
    AdjustStockInput, InventoryMovement, InventoryService, LowStockProduct, MovementFilters,
};
use crate::AppState;

/// List ledger entries
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filters): Query<MovementFilters>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<InventoryMovement>>>> {
    let service = InventoryService::new(state.db);
    let movements = service.list(filters, page).await?;
    Ok(Json(ApiResponse::new("Movements retrieved", movements)))
}

/// Manually correct a product's stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<InventoryMovement>>)> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = InventoryService::new(state.db);
    let movement = service.adjust_stock(input, current_user.0.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Stock adjusted", movement)),
    ))
}

/// Products at or below their minimum stock
pub async fn get_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<LowStockProduct>>>> {
    let service = InventoryService::new(state.db);
    let products = service.low_stock().await?;
    Ok(Json(ApiResponse::new("Low stock products retrieved", products)))
}
