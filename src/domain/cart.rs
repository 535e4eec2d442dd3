use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

pub type CartId = i64;
pub type CartItemId = i64;

/// Opaque per-visitor key. The core never creates or expires it; the
/// transport layer mints one when a visitor arrives without it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Open,
    Closed,
}

impl CartStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CartStatus::Open => "open",
            CartStatus::Closed => "closed",
        }
    }
}

impl FromStr for CartStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CartStatus::Open),
            "closed" => Ok(CartStatus::Closed),
            other => Err(DomainError::Storage(format!("unknown cart status '{other}'"))),
        }
    }
}

/// Strictly positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "quantity must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i32 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidQuantity("quantity must be a number".to_string()))?;
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub id: CartId,
    pub session_id: SessionId,
    pub status: CartStatus,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCart {
    pub session_id: SessionId,
    pub status: CartStatus,
    pub total: BigDecimal,
}

impl NewCart {
    pub fn open(session_id: SessionId) -> Self {
        Self {
            session_id,
            status: CartStatus::Open,
            total: BigDecimal::from(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Folds another addition of the same product into this line. Leaves the
    /// line untouched when the combined quantity would not fit.
    pub fn merge(
        &mut self,
        quantity: Quantity,
        subtotal: &BigDecimal,
    ) -> Result<(), DomainError> {
        self.quantity = self.quantity.checked_add(quantity.get()).ok_or_else(|| {
            DomainError::InvalidQuantity(format!(
                "quantity for {} would exceed {}",
                self.product_name,
                i32::MAX
            ))
        })?;
        self.price += subtotal.clone();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub cart_id: CartId,
    pub product_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// What a caller gets back when listing a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemView {
    pub id: CartItemId,
    pub quantity: i32,
    pub price: BigDecimal,
    pub product_name: String,
}

impl From<CartItem> for LineItemView {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            quantity: item.quantity,
            price: item.price,
            product_name: item.product_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub name: String,
    pub unit_price: BigDecimal,
}
