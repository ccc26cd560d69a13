use serde::{Deserialize, Serialize};

use crate::coerce::Numeric;

/// Core product entity. `id` and `name` are both business keys and unique
/// across the collection; the storage row identifier is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    /// Stock on hand. A product with zero stock cannot be deleted.
    pub quantity: i64,
    pub unit: String,
}

/// Field-level changes for an existing product. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
}

impl ProductChanges {
    /// Apply the changes in place. Returns whether any field actually changed.
    pub fn apply(&self, product: &mut Product) -> bool {
        let mut modified = false;

        if let Some(name) = &self.name {
            modified |= product.name != *name;
            product.name.clone_from(name);
        }
        if let Some(price) = self.price {
            modified |= product.price != price;
            product.price = price;
        }
        if let Some(description) = &self.description {
            modified |= product.description.as_deref() != Some(description.as_str());
            product.description = Some(description.clone());
        }
        if let Some(quantity) = self.quantity {
            modified |= product.quantity != quantity;
            product.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            modified |= product.unit != *unit;
            product.unit.clone_from(unit);
        }

        modified
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body of `POST /products`. Every field is optional at the wire level so the
/// command layer can report precisely what is missing.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProduct {
    pub id: Option<Numeric>,
    pub name: Option<String>,
    pub price: Option<Numeric>,
    pub description: Option<String>,
    pub quantity: Option<Numeric>,
    pub unit: Option<String>,
}

/// Body of `PUT /products/:id`. A present field replaces the stored value,
/// including `0` and `""`; absent or `null` fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price: Option<Numeric>,
    pub description: Option<String>,
    pub quantity: Option<Numeric>,
    pub unit: Option<String>,
}

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_quantity: i64,
    pub total_value: f64,
}

impl InventoryReport {
    /// Sum quantity and quantity × price in one pass. `None` when the total
    /// quantity does not fit in an `i64`.
    pub fn tally<'a>(products: impl IntoIterator<Item = &'a Product>) -> Option<Self> {
        products
            .into_iter()
            .try_fold(Self::default(), |report, product| {
                Some(Self {
                    total_quantity: report.total_quantity.checked_add(product.quantity)?,
                    total_value: report.total_value + product.quantity as f64 * product.price,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(id: i64, name: &str, price: f64, quantity: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            description: None,
            quantity,
            unit: "pcs".to_string(),
        }
    }

    #[test]
    fn serializes_public_fields_only() {
        let value = serde_json::to_value(make(1, "Bolt", 0.5, 10)).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["description", "id", "name", "price", "quantity", "unit"]);
    }

    #[test]
    fn empty_changes_modify_nothing() {
        let mut product = make(1, "Bolt", 0.5, 10);
        let before = product.clone();
        assert!(!ProductChanges::default().apply(&mut product));
        assert_eq!(product, before);
    }

    #[test]
    fn changes_equal_to_stored_values_are_not_modifications() {
        let mut product = make(1, "Bolt", 0.5, 10);
        let changes = ProductChanges {
            name: Some("Bolt".to_string()),
            quantity: Some(10),
            ..Default::default()
        };
        assert!(!changes.apply(&mut product));
    }

    #[test]
    fn zero_and_empty_values_are_applied() {
        let mut product = make(1, "Bolt", 0.5, 10);
        let changes = ProductChanges {
            price: Some(0.0),
            quantity: Some(0),
            unit: Some(String::new()),
            ..Default::default()
        };
        assert!(changes.apply(&mut product));
        assert_eq!(product.price, 0.0);
        assert_eq!(product.quantity, 0);
        assert_eq!(product.unit, "");
    }

    #[test]
    fn update_payload_treats_null_as_absent() {
        let payload: UpdateProduct =
            serde_json::from_str(r#"{"name": null, "quantity": 0}"#).unwrap();
        assert!(payload.name.is_none());
        assert_eq!(payload.quantity, Some(Numeric::Int(0)));
    }

    #[test]
    fn tally_of_nothing_is_zero() {
        assert_eq!(
            InventoryReport::tally(&Vec::<Product>::new()),
            Some(InventoryReport::default())
        );
    }

    #[test]
    fn tally_sums_quantity_and_value() {
        let products = vec![make(1, "A", 10.0, 2), make(2, "B", 5.0, 3)];
        let report = InventoryReport::tally(&products).unwrap();
        assert_eq!(report.total_quantity, 5);
        assert!((report.total_value - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tally_overflowing_quantity_is_none() {
        let products = vec![make(1, "A", 0.0, i64::MAX), make(2, "B", 0.0, 1)];
        assert_eq!(InventoryReport::tally(&products), None);
    }
}
