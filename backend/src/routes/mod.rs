//! Route definitions for the PrismaTech backend

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, rate_limit_middleware},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login public + rate limited, the rest protected)
        .nest("/auth", auth_routes(state.clone()))
        // Protected resources
        .nest("/products", product_routes(state.clone()))
        .nest("/categories", category_routes(state.clone()))
        .nest("/customers", customer_routes(state.clone()))
        .nest("/sales", sale_routes(state.clone()))
        .nest("/inventory", inventory_routes(state.clone()))
        .nest("/reports", report_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/login", post(handlers::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/verify", get(handlers::verify))
        .route("/change-password", post(handlers::change_password))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/:session_id", delete(handlers::revoke_session))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Product catalog routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/trash", get(handlers::list_trash))
        .route("/bulk-delete", post(handlers::bulk_delete_products))
        .route("/bulk-stock", post(handlers::bulk_update_stock))
        .route("/slug/:slug", get(handlers::get_product_by_slug))
        .route(
            "/part-number/:part_number",
            get(handlers::get_product_by_part_number),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .patch(handlers::patch_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/restore", post(handlers::restore_product))
        .route("/:product_id/movements", get(handlers::get_product_movements))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Category routes (protected)
fn category_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Customer routes (protected)
fn customer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .route("/:customer_id/sales", get(handlers::get_customer_sales))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sale routes (protected)
fn sale_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/stats", get(handlers::get_sale_stats))
        .route("/:sale_id", get(handlers::get_sale))
        .route("/:sale_id/status", post(handlers::update_sale_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/movements", get(handlers::list_movements))
        .route("/adjustments", post(handlers::adjust_stock))
        .route("/low-stock", get(handlers::get_low_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Reporting routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sales", get(handlers::get_sales_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
