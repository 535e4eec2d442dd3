use std::collections::HashMap;

use bigdecimal::BigDecimal;

use super::cart::{ProductView, Quantity};

/// Decimal places stored for money columns (`NUMERIC(14,2)`).
pub const MONEY_SCALE: i64 = 2;

/// Read-only product → unit price mapping, loaded once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, BigDecimal>,
}

impl PriceTable {
    pub fn new(prices: HashMap<String, BigDecimal>) -> Self {
        Self { prices }
    }

    pub fn unit_price(&self, product_name: &str) -> Option<&BigDecimal> {
        self.prices.get(product_name)
    }

    pub fn subtotal(&self, product_name: &str, quantity: Quantity) -> Option<BigDecimal> {
        self.unit_price(product_name)
            .map(|price| price.clone() * BigDecimal::from(quantity.get()))
    }

    /// Catalogue sorted by product name.
    pub fn products(&self) -> Vec<ProductView> {
        let mut products: Vec<ProductView> = self
            .prices
            .iter()
            .map(|(name, price)| ProductView {
                name: name.clone(),
                unit_price: price.clone(),
            })
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub(crate) fn invalid_entries(&self) -> Vec<String> {
        let mut invalid: Vec<String> = self
            .prices
            .iter()
            .filter(|(name, price)| {
                name.trim().is_empty()
                    || *price < &BigDecimal::from(0)
                    || price.normalized().as_bigint_and_exponent().1 > MONEY_SCALE
            })
            .map(|(name, price)| format!("{name:?}={price}"))
            .collect();
        invalid.sort();
        invalid
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        let prices = [("shoe", 100), ("purse", 200), ("bag", 300), ("watch", 300)]
            .into_iter()
            .map(|(name, price)| (name.to_string(), BigDecimal::from(price)))
            .collect();
        Self { prices }
    }
}
