use tracing::info;

use crate::db::ProductStore;
use crate::error::{AppError, AppResult};
use crate::models::InventoryReport;

/// Total stock and stock value across the whole collection, in one
/// aggregation pass on the store.
pub async fn inventory_report(store: &dyn ProductStore) -> AppResult<InventoryReport> {
    let report = store
        .inventory_totals()
        .await
        .map_err(AppError::backend("failed to generate report"))?;

    info!(
        total_quantity = report.total_quantity,
        total_value = report.total_value,
        "Generated inventory report"
    );
    Ok(report)
}
