use serde::{Deserialize, Serialize};

use super::Product;

/// Event published once a product has been stored by an import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: f64,
    pub promotion_price: Option<f64>,
}

impl From<&Product> for ProductCreated {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.value(),
            name: p.name.clone(),
            brand: p.brand.clone(),
            description: p.description.clone(),
            price: p.price,
            promotion_price: p.promotion_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys() {
        let product = Product::promotional(3, "Lamp", "Lumo", "Desk lamp", 40.0, 35.5);
        let event = ProductCreated::from(&product);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "id": 3,
                "name": "Lamp",
                "brand": "Lumo",
                "description": "Desk lamp",
                "price": 40.0,
                "promotionPrice": 35.5
            })
        );
    }

    #[test]
    fn missing_promotion_serializes_as_null() {
        let event = ProductCreated::from(&Product::new(4, "Mug", "Cera", "Mug", 9.0));
        let value = serde_json::to_value(&event).unwrap();
        assert!(value["promotionPrice"].is_null());
    }
}
