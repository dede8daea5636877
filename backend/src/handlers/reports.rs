//! HTTP handlers for sales reporting

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::types::ApiResponse;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::reports::{ReportFilter, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesReportParams {
    /// summary | products | customers | daily
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub date_from: Option<chrono::NaiveDate>,
    pub date_to: Option<chrono::NaiveDate>,
}

/// Sales report, dispatched by `type`
pub async fn get_sales_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<SalesReportParams>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let service = ReportingService::new(state.db);
    let filter = ReportFilter {
        date_from: params.date_from,
        date_to: params.date_to,
    };

    let data = match params.report_type.as_deref().unwrap_or("summary") {
        "summary" => serde_json::to_value(service.summary(&filter).await?),
        "products" => serde_json::to_value(service.by_product(&filter).await?),
        "customers" => serde_json::to_value(service.by_customer(&filter).await?),
        "daily" => serde_json::to_value(service.daily(&filter).await?),
        other => {
            return Err(AppError::validation(
                "type",
                format!("Unknown report type '{other}'; expected summary, products, customers or daily"),
            ));
        }
    }
    .map_err(|e| AppError::Internal(format!("report serialization failed: {e}")))?;

    Ok(Json(ApiResponse::new("Report generated", data)))
}
