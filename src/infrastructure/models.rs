use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::cart::{Cart, CartItem, SessionId};
use crate::domain::errors::DomainError;
use crate::schema::{cart_items, carts};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: i64,
    pub session_id: String,
    pub status: String,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub session_id: String,
    pub status: String,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(CartRow, foreign_key = cart_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: i64,
    pub cart_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub cart_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl TryFrom<CartRow> for Cart {
    type Error = DomainError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Cart {
            id: row.id,
            session_id: SessionId::new(row.session_id),
            status: row.status.parse()?,
            total: row.total,
            created_at: row.created_at,
        })
    }
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            cart_id: row.cart_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
        }
    }
}
