use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{DeleteOutcome, ProductStore, StoreError, StoreResult, UpdateOutcome};
use crate::models::{InventoryReport, Product, ProductChanges};
use crate::query::{ProductFilter, ProductQuery, SortField, SortOrder};

const PRODUCT_COLUMNS: &str = "id, name, price, description, quantity, unit";

/// PostgreSQL-backed store. `products.seq` is the internal row identifier and
/// doubles as insertion order; it never leaves this module.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations on `id` or `name` become [`StoreError::Duplicate`].
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(err),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE TRUE");
    if filter.matches_nothing {
        builder.push(" AND FALSE");
        return;
    }
    if let Some(needle) = &filter.name_contains {
        // POSITION instead of ILIKE so `%` and `_` in the needle stay literal.
        builder
            .push(" AND POSITION(LOWER(")
            .push_bind(needle.clone())
            .push(") IN LOWER(name)) > 0");
    }
    if let Some(min) = filter.price.min {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.price.max {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(min) = filter.quantity.min {
        builder.push(" AND quantity >= ").push_bind(min);
    }
    if let Some(max) = filter.quantity.max {
        builder.push(" AND quantity <= ").push_bind(max);
    }
}

fn find_query(query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
    push_filter(&mut builder, &query.filter);

    builder.push(" ORDER BY ");
    if let Some(sort) = &query.sort {
        // Column names come from a closed enum, never from the request.
        builder.push(sort.field.column());
        // Byte order, matching how the in-memory store compares strings.
        if matches!(sort.field, SortField::Name | SortField::Description | SortField::Unit) {
            builder.push(r#" COLLATE "C""#);
        }
        builder.push(match sort.order {
            SortOrder::Asc => " ASC NULLS FIRST, ",
            SortOrder::Desc => " DESC NULLS LAST, ",
        });
    }
    builder.push("seq ASC");
    builder
}

/// Classify a conditional delete from the stock seen in the statement's
/// snapshot and whether a row was removed.
fn delete_outcome(quantity: Option<i64>, deleted: bool) -> DeleteOutcome {
    match (quantity, deleted) {
        (_, true) => DeleteOutcome::Deleted,
        (None, false) => DeleteOutcome::NotFound,
        (Some(0), false) => DeleteOutcome::OutOfStock,
        (Some(_), false) => DeleteOutcome::Unchanged,
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let mut builder = find_query(query);
        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, description, quantity, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.unit)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn insert_many(&self, products: &[Product]) -> StoreResult<u64> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO products ({PRODUCT_COLUMNS}) "));
        builder.push_values(products, |mut row, product| {
            row.push_bind(product.id)
                .push_bind(product.name.clone())
                .push_bind(product.price)
                .push_bind(product.description.clone())
                .push_bind(product.quantity)
                .push_bind(product.unit.clone());
        });

        let result = builder.build().execute(&self.pool).await.map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn update_fields(&self, id: i64, changes: &ProductChanges) -> StoreResult<UpdateOutcome> {
        // One statement: the row is only written when some field differs, and
        // the CTE snapshot still tells us whether the id exists at all.
        let (matched, modified): (bool, bool) = sqlx::query_as(
            r#"
            WITH target AS (
                SELECT seq FROM products WHERE id = $1
            ),
            updated AS (
                UPDATE products
                SET name        = COALESCE($2, name),
                    price       = COALESCE($3, price),
                    description = COALESCE($4, description),
                    quantity    = COALESCE($5, quantity),
                    unit        = COALESCE($6, unit)
                WHERE id = $1
                  AND (name, price, description, quantity, unit) IS DISTINCT FROM
                      (COALESCE($2, name), COALESCE($3, price), COALESCE($4, description),
                       COALESCE($5, quantity), COALESCE($6, unit))
                RETURNING seq
            )
            SELECT EXISTS (SELECT 1 FROM target), EXISTS (SELECT 1 FROM updated)
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(changes.quantity)
        .bind(&changes.unit)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(UpdateOutcome { matched, modified })
    }

    async fn delete_in_stock(&self, id: i64) -> StoreResult<DeleteOutcome> {
        let (quantity, deleted): (Option<i64>, bool) = sqlx::query_as(
            r#"
            WITH target AS (
                SELECT quantity FROM products WHERE id = $1
            ),
            removed AS (
                DELETE FROM products WHERE id = $1 AND quantity > 0
                RETURNING seq
            )
            SELECT (SELECT quantity FROM target), EXISTS (SELECT 1 FROM removed)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(delete_outcome(quantity, deleted))
    }

    async fn inventory_totals(&self) -> StoreResult<InventoryReport> {
        let (total_quantity, total_value): (i64, f64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT,
                   COALESCE(SUM(quantity * price), 0)::DOUBLE PRECISION
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            // numeric_value_out_of_range: the SUM did not fit the BIGINT cast.
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("22003") => {
                StoreError::OutOfRange("total quantity")
            }
            _ => StoreError::Database(err),
        })?;

        Ok(InventoryReport { total_quantity, total_value })
    }

    async fn clear(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM products").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> StoreResult<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}
