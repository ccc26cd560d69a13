//! Translation of `GET /products` query parameters into a filter and sort
//! order that every store backend can evaluate.

use std::cmp::Ordering;

use serde::Deserialize;
use tracing::debug;

use crate::coerce::{parse_float_prefix, parse_int_prefix};
use crate::models::Product;

/// Raw query-string parameters. Everything stays a string until
/// [`ProductQuery::from_params`] coerces it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQueryParams {
    pub name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_quantity: Option<String>,
    pub max_quantity: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Inclusive range. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for Range<T> {
    fn default() -> Self {
        Self { min: None, max: None }
    }
}

impl<T: PartialOrd> Range<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.min.as_ref().map_or(true, |min| value >= min)
            && self.max.as_ref().map_or(true, |max| value <= max)
    }
}

/// Conjunction of all supplied predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub name_contains: Option<String>,
    pub price: Range<f64>,
    pub quantity: Range<i64>,
    /// Set when a numeric bound could not be parsed. Such a bound compares
    /// false against every product, so the whole filter matches nothing.
    pub matches_nothing: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.matches_nothing {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            if !product.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        self.price.contains(&product.price) && self.quantity.contains(&product.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Price,
    Description,
    Quantity,
    Unit,
}

impl SortField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "description" => Some(Self::Description),
            "quantity" => Some(Self::Quantity),
            "unit" => Some(Self::Unit),
            _ => None,
        }
    }

    /// Column name in the `products` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::Unit => "unit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    /// Ascending comparison puts a missing description first, like a
    /// document store sorting on an absent field.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Quantity => a.quantity.cmp(&b.quantity),
            SortField::Unit => a.unit.cmp(&b.unit),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Filter plus optional sort. Without a sort, results come back in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort: Option<Sort>,
}

impl ProductQuery {
    pub fn from_params(params: &ProductQueryParams) -> Self {
        let mut filter = ProductFilter {
            name_contains: present(&params.name).map(str::to_string),
            ..Default::default()
        };

        filter.price.min = bound(&params.min_price, parse_float_prefix, &mut filter.matches_nothing);
        filter.price.max = bound(&params.max_price, parse_float_prefix, &mut filter.matches_nothing);
        filter.quantity.min = bound(&params.min_quantity, parse_int_prefix, &mut filter.matches_nothing);
        filter.quantity.max = bound(&params.max_quantity, parse_int_prefix, &mut filter.matches_nothing);

        let sort = present(&params.sort_by).and_then(|field| match SortField::parse(field) {
            Some(field) => Some(Sort {
                field,
                order: match params.sort_order.as_deref() {
                    Some("desc") => SortOrder::Desc,
                    _ => SortOrder::Asc,
                },
            }),
            None => {
                debug!(sort_by = field, "Ignoring unknown sort field");
                None
            }
        });

        Self { filter, sort }
    }

    /// Apply the query to an in-memory slice. Sorting is stable, so ties keep
    /// insertion order.
    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<Product> {
        let mut matched: Vec<Product> = products
            .into_iter()
            .filter(|product| self.filter.matches(product))
            .cloned()
            .collect();
        if let Some(sort) = &self.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        matched
    }
}

fn present(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|value| !value.is_empty())
}

fn bound<T>(
    param: &Option<String>,
    parse: fn(&str) -> Option<T>,
    matches_nothing: &mut bool,
) -> Option<T> {
    let raw = present(param)?;
    let parsed = parse(raw);
    if parsed.is_none() {
        debug!(value = raw, "Unparseable numeric bound, filter matches nothing");
        *matches_nothing = true;
    }
    parsed
}
