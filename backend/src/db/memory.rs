use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DeleteOutcome, ProductStore, StoreError, StoreResult, UpdateOutcome};
use crate::models::{InventoryReport, Product, ProductChanges};
use crate::query::ProductQuery;

/// Product store held in process memory. Each operation runs under a single
/// lock acquisition, which makes it atomic with respect to other requests.
#[derive(Debug, Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn conflicts(existing: &[Product], candidate: &Product) -> bool {
        existing
            .iter()
            .any(|p| p.id == candidate.id || p.name == candidate.name)
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        Ok(query.apply(self.products.read().await.iter()))
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if Self::conflicts(&products, product) {
            return Err(StoreError::Duplicate);
        }
        products.push(product.clone());
        Ok(())
    }

    async fn insert_many(&self, batch: &[Product]) -> StoreResult<u64> {
        let mut products = self.products.write().await;
        // All or nothing, like a single multi-row INSERT.
        for (i, candidate) in batch.iter().enumerate() {
            if Self::conflicts(&products, candidate) || Self::conflicts(&batch[..i], candidate) {
                return Err(StoreError::Duplicate);
            }
        }
        products.extend_from_slice(batch);
        Ok(batch.len() as u64)
    }

    async fn update_fields(&self, id: i64, changes: &ProductChanges) -> StoreResult<UpdateOutcome> {
        let mut products = self.products.write().await;
        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(UpdateOutcome { matched: false, modified: false });
        };

        if let Some(name) = &changes.name {
            if products.iter().any(|p| p.id != id && p.name == *name) {
                return Err(StoreError::Duplicate);
            }
        }

        let modified = changes.apply(&mut products[index]);
        Ok(UpdateOutcome { matched: true, modified })
    }

    async fn delete_in_stock(&self, id: i64) -> StoreResult<DeleteOutcome> {
        let mut products = self.products.write().await;
        match products.iter().position(|p| p.id == id) {
            None => Ok(DeleteOutcome::NotFound),
            Some(index) if products[index].quantity == 0 => Ok(DeleteOutcome::OutOfStock),
            Some(index) => {
                products.remove(index);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    async fn inventory_totals(&self) -> StoreResult<InventoryReport> {
        InventoryReport::tally(self.products.read().await.iter())
            .ok_or(StoreError::OutOfRange("total quantity"))
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut products = self.products.write().await;
        let removed = products.len() as u64;
        products.clear();
        Ok(removed)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.products.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ProductQueryParams, Sort, SortField, SortOrder};

    fn product(id: i64, name: &str, price: f64, quantity: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            description: None,
            quantity,
            unit: "pcs".to_string(),
        }
    }

    async fn seeded() -> MemoryProductStore {
        let store = MemoryProductStore::new();
        store
            .insert_many(&[
                product(1, "Nail", 0.05, 1000),
                product(2, "Drill", 89.0, 0),
                product(3, "Saw", 24.0, 4),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn find_keeps_insertion_order_without_sort() {
        let store = seeded().await;
        let all = store
            .find(&ProductQuery::from_params(&ProductQueryParams::default()))
            .await
            .unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn find_applies_sort() {
        let store = seeded().await;
        let query = ProductQuery {
            sort: Some(Sort { field: SortField::Name, order: SortOrder::Desc }),
            ..Default::default()
        };
        let names: Vec<String> = store.find(&query).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Saw", "Nail", "Drill"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id_or_name() {
        let store = seeded().await;
        assert!(matches!(
            store.insert(&product(1, "Screw", 0.1, 1)).await,
            Err(StoreError::Duplicate)
        ));
        assert!(matches!(
            store.insert(&product(9, "Saw", 0.1, 1)).await,
            Err(StoreError::Duplicate)
        ));
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn insert_many_is_all_or_nothing() {
        let store = MemoryProductStore::new();
        let result = store
            .insert_many(&[product(1, "A", 1.0, 1), product(2, "A", 1.0, 1)])
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_id_admit_one() {
        let store = MemoryProductStore::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(&product(7, &format!("Racer {i}"), 1.0, 1)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_reports_match_and_modification() {
        let store = seeded().await;
        let changes = ProductChanges { quantity: Some(5), ..Default::default() };

        let outcome = store.update_fields(3, &changes).await.unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: true, modified: true });

        let again = store.update_fields(3, &changes).await.unwrap();
        assert_eq!(again, UpdateOutcome { matched: true, modified: false });

        let missing = store.update_fields(42, &changes).await.unwrap();
        assert_eq!(missing, UpdateOutcome { matched: false, modified: false });
    }

    #[tokio::test]
    async fn update_rejects_rename_onto_existing_name() {
        let store = seeded().await;
        let changes = ProductChanges { name: Some("Nail".to_string()), ..Default::default() };
        assert!(matches!(store.update_fields(3, &changes).await, Err(StoreError::Duplicate)));

        // Renaming a product to its own name is fine.
        let same = ProductChanges { name: Some("Saw".to_string()), ..Default::default() };
        assert!(!store.update_fields(3, &same).await.unwrap().modified);
    }

    #[tokio::test]
    async fn delete_guards_zero_stock() {
        let store = seeded().await;
        assert_eq!(store.delete_in_stock(2).await.unwrap(), DeleteOutcome::OutOfStock);
        assert_eq!(store.delete_in_stock(42).await.unwrap(), DeleteOutcome::NotFound);
        assert_eq!(store.delete_in_stock(3).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = seeded().await;
        assert_eq!(store.clear().await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.inventory_totals().await.unwrap(), InventoryReport::default());
    }
}
