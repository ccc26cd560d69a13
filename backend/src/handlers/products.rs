use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    commands::{self, Change},
    error::{AppError, AppResult},
    models::{CreateProduct, Product, UpdateProduct},
    query::{ProductQuery, ProductQueryParams},
    AppState,
};

const NO_CHANGES: &str = "no changes to product";

/// Decode a JSON request body. A missing or blank body is the empty payload,
/// and anything that does not decode is a validation error.
fn json_body<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::Validation(format!("invalid request body: {err}")))
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQueryParams>,
) -> AppResult<Json<Vec<Product>>> {
    let query = ProductQuery::from_params(&params);

    let start = Instant::now();
    let products = state
        .store
        .find(&query)
        .await
        .map_err(AppError::backend("failed to fetch products"))?;

    info!(
        count = products.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Listed products"
    );

    Ok(Json(products))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let payload: CreateProduct = json_body(&body)?;
    commands::create_product(state.store.as_ref(), payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "product created" })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let id = commands::parse_product_id(&id)?;
    let payload: UpdateProduct = json_body(&body)?;
    let message = match commands::update_product(state.store.as_ref(), id, payload).await? {
        Change::Applied => "product updated",
        Change::NoChanges => NO_CHANGES,
    };

    Ok(Json(json!({ "message": message })))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = commands::parse_product_id(&id)?;
    let message = match commands::delete_product(state.store.as_ref(), id).await? {
        Change::Applied => "product deleted",
        Change::NoChanges => NO_CHANGES,
    };

    Ok(Json(json!({ "message": message })))
}
