//! Catalog domain types. Pure data and rules, no I/O.

mod event;

pub use event::ProductCreated;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Catalog-wide product identifier. Only positive values are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl ProductId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        ProductId(value)
    }
}

/// A catalog product as produced by a source for a single import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: f64,
    pub promotion_price: Option<f64>,
}

impl Product {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        brand: impl Into<String>,
        description: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            brand: brand.into(),
            description: description.into(),
            price,
            promotion_price: None,
        }
    }

    pub fn promotional(
        id: i64,
        name: impl Into<String>,
        brand: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        promotion_price: f64,
    ) -> Self {
        Self {
            promotion_price: Some(promotion_price),
            ..Self::new(id, name, brand, description, price)
        }
    }

    pub fn is_promoted(&self) -> bool {
        self.promotion_price.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ProductId must be greater than 0")]
    NonPositiveId(ProductId),

    #[error("product {0} has an empty name")]
    EmptyName(ProductId),
}

pub fn validate_product_id(id: ProductId) -> Result<(), ValidationError> {
    if id.0 > 0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveId(id))
    }
}

pub fn validate_product_ids(ids: &[ProductId]) -> Result<(), ValidationError> {
    ids.iter().try_for_each(|id| validate_product_id(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_validation_when_is_invalid() {
        let err = validate_product_id(ProductId(-1)).unwrap_err();
        assert_eq!(err.to_string(), "ProductId must be greater than 0");
        assert!(validate_product_id(ProductId(0)).is_err());
    }

    #[test]
    fn product_id_validation_when_is_valid() {
        assert!(validate_product_id(ProductId(2)).is_ok());
    }

    #[test]
    fn product_ids_validation_checks_values() {
        let ids = [ProductId(1), ProductId(2), ProductId(3)];
        assert!(validate_product_ids(&ids).is_ok());

        let ids = [ProductId(1), ProductId(-1), ProductId(3)];
        assert_eq!(
            validate_product_ids(&ids),
            Err(ValidationError::NonPositiveId(ProductId(-1)))
        );
    }

    #[test]
    fn promotional_constructor_sets_promotion() {
        let product = Product::promotional(7, "Desk", "Oak&Co", "A desk", 250.0, 199.99);
        assert!(product.is_promoted());
        assert_eq!(product.promotion_price, Some(199.99));
        assert!(!Product::new(8, "Chair", "Oak&Co", "A chair", 80.0).is_promoted());
    }
}
