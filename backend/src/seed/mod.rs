use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::commands::{validate_price, validate_quantity};
use crate::db::ProductStore;
use crate::models::Product;

/// One entry of the seed file. Ids are not taken from the file; they are
/// assigned from 1 in file order.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    price: f64,
    #[serde(default)]
    description: Option<String>,
    quantity: i64,
    #[serde(default)]
    unit: String,
}

/// What startup seeding did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub cleared: u64,
    pub inserted: u64,
}

/// Parse a JSON array of products and number them 1, 2, 3, ...
///
/// Entries are held to the same price and quantity rules as created products.
pub fn parse_seed(json: &str) -> anyhow::Result<Vec<Product>> {
    let entries: Vec<SeedProduct> =
        serde_json::from_str(json).context("seed data must be a JSON array of products")?;

    entries
        .into_iter()
        .zip(1..)
        .map(|(entry, id)| {
            let context = || format!("seed entry {id} ({})", entry.name);
            Ok(Product {
                id,
                price: validate_price(entry.price).with_context(context)?,
                quantity: validate_quantity(entry.quantity).with_context(context)?,
                name: entry.name,
                description: entry.description,
                unit: entry.unit,
            })
        })
        .collect()
}

pub async fn load_seed_file(path: &Path) -> anyhow::Result<Vec<Product>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_seed(&json).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Startup seeding. Clears the store first only when `reseed` is set, then
/// loads the seed file if the store is empty.
pub async fn seed_store(
    store: &dyn ProductStore,
    seed_file: Option<&Path>,
    reseed: bool,
) -> anyhow::Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    if reseed {
        summary.cleared = store.clear().await.context("failed to clear products")?;
        info!("Removed {} existing products before reseeding", summary.cleared);
    }

    let existing = store.count().await.context("failed to count products")?;
    if existing > 0 {
        info!("Store already holds {} products, skipping seed", existing);
        return Ok(summary);
    }

    let Some(path) = seed_file else {
        info!("No seed file configured, starting with an empty store");
        return Ok(summary);
    };

    let products = load_seed_file(path).await?;
    summary.inserted = store
        .insert_many(&products)
        .await
        .context("failed to insert seed products")?;
    info!("Seeded {} products from {}", summary.inserted, path.display());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryProductStore;
    use crate::query::ProductQuery;

    const SEED: &str = r#"[
        {"name": "Flour", "price": 2.5, "description": "Wheat flour", "quantity": 40, "unit": "kg"},
        {"id": 99, "name": "Sugar", "price": 3.0, "quantity": 25, "unit": "kg"},
        {"name": "Eggs", "price": 0.3, "quantity": 120}
    ]"#;

    fn write_seed_file(tag: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "inventory-seed-{}-{}.json",
            std::process::id(),
            tag
        ));
        std::fs::write(&path, SEED).unwrap();
        path
    }

    #[test]
    fn ids_are_sequential_in_file_order() {
        let products = parse_seed(SEED).unwrap();
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(names, vec!["Flour", "Sugar", "Eggs"]);
        assert_eq!(products[2].unit, "");
        assert!(products[1].description.is_none());
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(parse_seed(r#"{"name": "not an array"}"#).is_err());
        assert!(parse_seed(r#"[{"name": "No price", "quantity": 1}]"#).is_err());
    }

    #[test]
    fn negative_entries_are_rejected() {
        let err = parse_seed(r#"[{"name": "Rice", "price": 1.0, "quantity": 2}, {"name": "Oil", "price": 4.0, "quantity": -1}]"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("seed entry 2 (Oil)"));
        assert!(parse_seed(r#"[{"name": "Rice", "price": -0.5, "quantity": 2}]"#).is_err());
    }

    #[tokio::test]
    async fn invalid_seed_file_inserts_nothing() {
        let path = std::env::temp_dir().join(format!("inventory-seed-{}-negative.json", std::process::id()));
        std::fs::write(&path, r#"[{"name": "Oil", "price": 4.0, "quantity": -3}]"#).unwrap();
        let store = MemoryProductStore::new();

        assert!(seed_store(&store, Some(path.as_path()), false).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn seeds_an_empty_store() {
        let path = write_seed_file("empty");
        let store = MemoryProductStore::new();

        let summary = seed_store(&store, Some(path.as_path()), false).await.unwrap();
        assert_eq!(summary, SeedSummary { cleared: 0, inserted: 3 });
        assert_eq!(store.count().await.unwrap(), 3);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn skips_a_populated_store_without_reseed() {
        let path = write_seed_file("populated");
        let store = MemoryProductStore::new();
        store.insert_many(&parse_seed(r#"[{"name": "Salt", "price": 1.0, "quantity": 5}]"#).unwrap())
            .await
            .unwrap();

        let summary = seed_store(&store, Some(path.as_path()), false).await.unwrap();
        assert_eq!(summary, SeedSummary::default());
        let names: Vec<String> = store
            .find(&ProductQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Salt"]);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn reseed_replaces_existing_products() {
        let path = write_seed_file("reseed");
        let store = MemoryProductStore::new();
        store.insert_many(&parse_seed(r#"[{"name": "Salt", "price": 1.0, "quantity": 5}]"#).unwrap())
            .await
            .unwrap();

        let summary = seed_store(&store, Some(path.as_path()), true).await.unwrap();
        assert_eq!(summary, SeedSummary { cleared: 1, inserted: 3 });
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn missing_seed_file_is_an_error() {
        let store = MemoryProductStore::new();
        let path = std::env::temp_dir().join("inventory-seed-does-not-exist.json");
        assert!(seed_store(&store, Some(path.as_path()), false).await.is_err());
    }

    #[tokio::test]
    async fn no_seed_file_leaves_store_empty() {
        let store = MemoryProductStore::new();
        let summary = seed_store(&store, None, false).await.unwrap();
        assert_eq!(summary, SeedSummary::default());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
