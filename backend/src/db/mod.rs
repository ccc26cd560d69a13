//! Storage gateway for the product collection.
//!
//! Every mutating operation is a single atomic step on the backend: the
//! uniqueness of `id`/`name` is enforced on insert itself, and the zero-stock
//! guard is part of the delete. Callers never look a product up first and
//! then act on what they saw.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{InventoryReport, Product, ProductChanges};
use crate::query::ProductQuery;

pub use memory::MemoryProductStore;
pub use postgres::PgProductStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A product with the same `id` or `name` already exists.
    #[error("duplicate product id or name")]
    Duplicate,

    /// An aggregate does not fit the type it is reported in.
    #[error("{0} out of range")]
    OutOfRange(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a field-level update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: bool,
    pub modified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The product exists with zero stock and was left in place.
    OutOfStock,
    /// The product was seen in stock but nothing was removed, e.g. a
    /// concurrent delete got there first.
    Unchanged,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching the filter, in the query's sort order or insertion
    /// order when unsorted.
    async fn find(&self, query: &ProductQuery) -> StoreResult<Vec<Product>>;

    /// Fails with [`StoreError::Duplicate`] when `id` or `name` is taken.
    async fn insert(&self, product: &Product) -> StoreResult<()>;

    async fn insert_many(&self, products: &[Product]) -> StoreResult<u64>;

    async fn update_fields(&self, id: i64, changes: &ProductChanges) -> StoreResult<UpdateOutcome>;

    /// Delete the product only if it has stock left.
    async fn delete_in_stock(&self, id: i64) -> StoreResult<DeleteOutcome>;

    async fn inventory_totals(&self) -> StoreResult<InventoryReport>;

    /// Remove every product, returning how many were removed.
    async fn clear(&self) -> StoreResult<u64>;

    async fn count(&self) -> StoreResult<u64>;
}
