//! HTTP handlers for customer management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::models::Role;
use shared::types::{ApiResponse, PageQuery, Paginated};

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::customers::{
    CreateCustomerInput, Customer, CustomerFilters, CustomerService, UpdateCustomerInput,
};
use crate::services::sales::{Sale, SaleService};
use crate::AppState;

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filters): Query<CustomerFilters>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Customer>>>> {
    let service = CustomerService::new(state.db);
    let customers = service.list(filters, page).await?;
    Ok(Json(ApiResponse::new("Customers retrieved", customers)))
}

/// Get one customer
pub async fn get_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let service = CustomerService::new(state.db);
    let customer = service.get(id).await?;
    Ok(Json(ApiResponse::new("Customer retrieved", customer)))
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Customer>>)> {
    let service = CustomerService::new(state.db);
    let customer = service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Customer created", customer)),
    ))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = CustomerService::new(state.db);
    let customer = service.update(id, input).await?;
    Ok(Json(ApiResponse::new("Customer updated", customer)))
}

/// Soft-delete a customer
pub async fn delete_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_role(&current_user.0, &[Role::Admin, Role::Manager])?;
    let service = CustomerService::new(state.db);
    service.delete(id).await?;
    Ok(Json(ApiResponse::new("Customer deactivated", ())))
}

/// Sales history for one customer
pub async fn get_customer_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Sale>>>> {
    let service = SaleService::new(state.db, state.config.sales.default_tax_rate);
    let sales = service.for_customer(id, page).await?;
    Ok(Json(ApiResponse::new("Customer sales retrieved", sales)))
}
