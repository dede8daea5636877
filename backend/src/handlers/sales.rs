//! HTTP handlers for the sale flow

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::Role;
use shared::types::{ApiResponse, PageQuery, Paginated};

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::sales::{
    CreateSaleInput, Sale, SaleFilters, SaleService, SaleStats, SaleWithItems,
    UpdateSaleStatusInput,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSaleParams {
    /// `quote=1` persists a draft with no stock effect
    pub quote: Option<String>,
}

/// Create a sale (or a quote)
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<CreateSaleParams>,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SaleWithItems>>)> {
    let is_quote = matches!(params.quote.as_deref(), Some("1") | Some("true"));
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let sale = service
        .create(input, is_quote, current_user.0.user_id)
        .await?;
    let message = if is_quote { "Quote created" } else { "Sale created" };
    Ok((StatusCode::CREATED, Json(ApiResponse::new(message, sale))))
}

/// List sales with filters
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filters): Query<SaleFilters>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Sale>>>> {
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let sales = service.list(filters, page).await?;
    Ok(Json(ApiResponse::new("Sales retrieved", sales)))
}

/// Get a sale with its items
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SaleWithItems>>> {
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let sale = service.get(id).await?;
    Ok(Json(ApiResponse::new("Sale retrieved", sale)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleStatsParams {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Aggregate sale statistics
pub async fn get_sale_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<SaleStatsParams>,
) -> AppResult<Json<ApiResponse<SaleStats>>> {
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let stats = service.stats(params.date_from, params.date_to).await?;
    Ok(Json(ApiResponse::new("Sale statistics retrieved", stats)))
}

/// Transition a sale's lifecycle state
pub async fn update_sale_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSaleStatusInput>,
) -> AppResult<Json<ApiResponse<Sale>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let sale = service
        .update_status(id, input, current_user.0.user_id)
        .await?;
    Ok(Json(ApiResponse::new("Sale status updated", sale)))
}
