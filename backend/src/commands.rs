//! Create/update/delete of products, with the invariants each one enforces.
//!
//! The store is passed in explicitly so the same logic runs against
//! PostgreSQL in production and the in-memory store in tests.

use tracing::{info, warn};

use crate::coerce::{parse_int_prefix, Numeric};
use crate::db::{DeleteOutcome, ProductStore, StoreError};
use crate::error::{AppError, AppResult};
use crate::models::{CreateProduct, Product, ProductChanges, UpdateProduct};

/// Whether a command actually changed stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    NoChanges,
}

/// Path ids are read like any other integer input; anything that is not an
/// integer cannot name a product.
pub fn parse_product_id(raw: &str) -> AppResult<i64> {
    parse_int_prefix(raw).ok_or(AppError::NotFound)
}

pub async fn create_product(store: &dyn ProductStore, payload: CreateProduct) -> AppResult<Product> {
    let product = Product {
        id: integer("id", payload.id.as_ref())?,
        name: payload
            .name
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?,
        price: price(payload.price.as_ref())?,
        description: payload.description,
        quantity: quantity(payload.quantity.as_ref())?,
        unit: payload.unit.unwrap_or_default(),
    };

    match store.insert(&product).await {
        Ok(()) => {
            info!(id = product.id, name = %product.name, "Created product");
            Ok(product)
        }
        Err(StoreError::Duplicate) => {
            warn!(id = product.id, name = %product.name, "Rejected duplicate product");
            Err(AppError::Conflict)
        }
        Err(err) => Err(AppError::backend("failed to create product")(err)),
    }
}

pub async fn update_product(
    store: &dyn ProductStore,
    id: i64,
    payload: UpdateProduct,
) -> AppResult<Change> {
    let changes = ProductChanges {
        name: payload.name,
        price: payload.price.as_ref().map(|p| price(Some(p))).transpose()?,
        description: payload.description,
        quantity: payload.quantity.as_ref().map(|q| quantity(Some(q))).transpose()?,
        unit: payload.unit,
    };

    let outcome = match store.update_fields(id, &changes).await {
        Ok(outcome) => outcome,
        Err(StoreError::Duplicate) => {
            warn!(id, "Rejected rename onto an existing product name");
            return Err(AppError::Conflict);
        }
        Err(err) => return Err(AppError::backend("failed to update product")(err)),
    };

    if !outcome.matched {
        warn!(id, "Update of unknown product");
        return Err(AppError::NotFound);
    }
    if outcome.modified {
        info!(id, "Updated product");
        Ok(Change::Applied)
    } else {
        info!(id, "No changes to product");
        Ok(Change::NoChanges)
    }
}

pub async fn delete_product(store: &dyn ProductStore, id: i64) -> AppResult<Change> {
    let outcome = store
        .delete_in_stock(id)
        .await
        .map_err(AppError::backend("failed to delete product"))?;

    match outcome {
        DeleteOutcome::Deleted => {
            info!(id, "Deleted product");
            Ok(Change::Applied)
        }
        DeleteOutcome::Unchanged => {
            info!(id, "Delete matched nothing");
            Ok(Change::NoChanges)
        }
        DeleteOutcome::NotFound => {
            warn!(id, "Delete of unknown product");
            Err(AppError::NotFound)
        }
        DeleteOutcome::OutOfStock => {
            warn!(id, "Refused to delete product with zero stock");
            Err(AppError::StockIsZero)
        }
    }
}

fn integer(field: &str, value: Option<&Numeric>) -> AppResult<i64> {
    value
        .and_then(Numeric::as_i64)
        .ok_or_else(|| AppError::Validation(format!("{field} must be an integer")))
}

fn price(value: Option<&Numeric>) -> AppResult<f64> {
    validate_price(value.and_then(Numeric::as_f64).unwrap_or(f64::NAN))
}

fn quantity(value: Option<&Numeric>) -> AppResult<i64> {
    validate_quantity(integer("quantity", value)?)
}

/// Price rule shared by commands and the seed loader.
pub(crate) fn validate_price(price: f64) -> AppResult<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ))
    }
}

pub(crate) fn validate_quantity(quantity: i64) -> AppResult<i64> {
    if quantity >= 0 {
        Ok(quantity)
    } else {
        Err(AppError::Validation(
            "quantity must be a non-negative integer".to_string(),
        ))
    }
}
