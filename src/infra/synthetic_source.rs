use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::app::ports::{ProductSource, ProductStream};
use crate::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::Product;
use crate::error::Result;

const ADJECTIVES: &[&str] = &[
    "Classic", "Compact", "Deluxe", "Ergonomic", "Heavy", "Light", "Modern", "Rustic", "Smart", "Vintage",
];
const NOUNS: &[&str] = &[
    "Backpack", "Blender", "Chair", "Desk", "Headphones", "Kettle", "Lamp", "Monitor", "Sneakers", "Watch",
];
const BRANDS: &[&str] = &["Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay"];
const WORDS: &[&str] = &[
    "durable", "everyday", "premium", "quiet", "stylish", "portable", "reliable", "handmade", "efficient", "bright",
];

const PRICE_FLOOR: f64 = 200.0;
const PRICE_CEILING: f64 = 400.0;

fn random_price(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    let value = min + rng.gen::<f64>() * (max - min);
    (value * 100.0).round() / 100.0
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Product at zero-based `position`. Even positions carry a promotion below
/// the base price range.
fn generate(rng: &mut StdRng, position: usize) -> Product {
    let id = position as i64 + 1;
    let name = format!("{} {}", pick(rng, ADJECTIVES), pick(rng, NOUNS));
    let brand = pick(rng, BRANDS);
    let description = format!(
        "A {} and {} {}.",
        pick(rng, WORDS),
        pick(rng, WORDS),
        name.to_lowercase()
    );
    let price = random_price(rng, PRICE_FLOOR, PRICE_CEILING);
    if position % 2 == 0 {
        let floor = (position as f64).min(PRICE_FLOOR - 1.0);
        let promotion = random_price(rng, floor, PRICE_FLOOR);
        Product::promotional(id, name, brand, description, price, promotion)
    } else {
        Product::new(id, name, brand, description, price)
    }
}

/// Generates `count` products up front, for seeding.
pub fn generate_products(count: usize, seed: Option<u64>) -> Vec<Product> {
    let mut rng = rng_for(seed);
    (0..count).map(|i| generate(&mut rng, i)).collect()
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Streams randomly generated products with ids `1..=count`.
pub struct SyntheticProductSource {
    count: usize,
    seed: Option<u64>,
    capacity: usize,
}

impl SyntheticProductSource {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            seed: None,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[async_trait]
impl ProductSource for SyntheticProductSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn provide(&self, cancel: &CancellationToken) -> Result<ProductStream> {
        let (tx, stream) = ProductStream::channel(self.capacity);
        let mut rng = rng_for(self.seed);
        let count = self.count;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            for position in 0..count {
                if cancel.is_cancelled() {
                    warn!(position, count, "synthetic generation cancelled, remaining products not imported");
                    crate::metrics::import::source_cancelled("synthetic");
                    break;
                }
                if tx.send(Ok(generate(&mut rng, position))).await.is_err() {
                    break;
                }
            }
        });
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn streams_requested_count_with_sequential_ids() {
        let source = SyntheticProductSource::new(25).with_seed(7);
        let mut stream = source.provide(&CancellationToken::new()).await.unwrap();
        let mut ids = Vec::new();
        while let Some(product) = stream.next().await {
            ids.push(product.unwrap().id.value());
        }
        assert_eq!(ids, (1..=25).collect::<Vec<i64>>());
    }

    #[test]
    fn promotions_on_even_positions_stay_below_price() {
        let products = generate_products(300, Some(42));
        for (position, p) in products.iter().enumerate() {
            assert!(p.price >= PRICE_FLOOR && p.price <= PRICE_CEILING);
            assert!(!p.name.is_empty());
            match p.promotion_price {
                Some(promo) => {
                    assert_eq!(position % 2, 0);
                    assert!(promo <= PRICE_FLOOR && promo <= p.price);
                }
                None => assert_eq!(position % 2, 1),
            }
        }
    }

    #[tokio::test]
    async fn cancellation_ends_the_stream_early() {
        let cancel = CancellationToken::new();
        let mut stream = SyntheticProductSource::new(500).with_capacity(1).provide(&cancel).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        cancel.cancel();
        let mut rest = 0;
        while stream.next().await.is_some() {
            rest += 1;
        }

        assert_eq!(first.id.value(), 1);
        assert!(rest < 499);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        assert_eq!(generate_products(10, Some(1)), generate_products(10, Some(1)));
    }
}
