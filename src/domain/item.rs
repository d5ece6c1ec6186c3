//! Catalog item model.
//!
//! An [`Item`] is an opaque payload from the upstream catalog. The engine
//! reads only the handful of fields it filters, sorts, or de-duplicates on;
//! everything else is kept in [`Item::extra`] and passed through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Aggregate customer rating of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating, nominally `0.0..=5.0`.
    #[serde(default)]
    pub rate: f64,
    /// Number of ratings behind `rate`.
    #[serde(default)]
    pub count: u64,
}

/// A single catalog product.
///
/// # Examples
///
/// ```
/// use storefront::Item;
///
/// let item: Item = serde_json::from_str(
///     r#"{"id": 1, "title": "Backpack", "price": 109.95,
///         "category": "men's clothing", "rating": {"rate": 3.9, "count": 120},
///         "image": "https://example.test/1.jpg"}"#,
/// ).unwrap();
/// assert_eq!(item.title, "Backpack");
/// assert!(item.extra.contains_key("image"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: Rating,
    /// Fields the engine never looks at (description, image, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Creates an item with no extra payload.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            category: String::new(),
            rating: Rating::default(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rate: f64) -> Self {
        self.rating.rate = rate;
        self
    }

    /// Whole stars earned by the rating: a 4.2 and a 4.0 are both four-star
    /// items, a 3.9 is not.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn whole_stars(&self) -> i64 {
        self.rating.rate.floor() as i64
    }
}
