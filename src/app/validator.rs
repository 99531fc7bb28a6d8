use crate::domain::{validate_product_id, Product, ValidationError};

/// Gate applied to every product before it is handed to storage.
pub trait Validator: Send + Sync {
    fn validate(&self, product: &Product) -> Result<(), ValidationError>;

    fn is_valid(&self, product: &Product) -> bool {
        self.validate(product).is_ok()
    }
}

/// Id positivity is always enforced; the name rule is opt-in.
/// Promotion price is not compared against the base price.
#[derive(Debug, Clone, Default)]
pub struct ProductValidator {
    require_name: bool,
}

impl ProductValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_name(mut self, require: bool) -> Self {
        self.require_name = require;
        self
    }
}

impl Validator for ProductValidator {
    fn validate(&self, product: &Product) -> Result<(), ValidationError> {
        validate_product_id(product.id)?;
        if self.require_name && product.name.trim().is_empty() {
            return Err(ValidationError::EmptyName(product.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductId;

    #[test]
    fn rejects_non_positive_ids() {
        let validator = ProductValidator::new();
        assert!(!validator.is_valid(&Product::new(0, "Zero", "b", "d", 1.0)));
        assert!(!validator.is_valid(&Product::new(-5, "Neg", "b", "d", 1.0)));
        assert!(validator.is_valid(&Product::new(1, "One", "b", "d", 1.0)));
    }

    #[test]
    fn empty_name_only_rejected_when_required() {
        let product = Product::new(3, "  ", "b", "d", 1.0);
        assert!(ProductValidator::new().is_valid(&product));
        assert_eq!(
            ProductValidator::new().require_name(true).validate(&product),
            Err(ValidationError::EmptyName(ProductId(3)))
        );
    }

    #[test]
    fn promotion_above_price_is_not_rejected() {
        let product = Product::promotional(4, "Odd", "b", "d", 10.0, 20.0);
        assert!(ProductValidator::new().is_valid(&product));
    }
}
