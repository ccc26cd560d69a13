use axum::{extract::State, Json};

use crate::{error::AppResult, models::InventoryReport, report, AppState};

pub async fn inventory_report(State(state): State<AppState>) -> AppResult<Json<InventoryReport>> {
    Ok(Json(report::inventory_report(state.store.as_ref()).await?))
}
