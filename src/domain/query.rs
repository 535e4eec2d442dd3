use super::cart::{CartId, CartItemId, CartStatus, SessionId};

#[derive(Debug, Clone)]
pub enum CartFilter {
    BySessionAndStatus {
        session_id: SessionId,
        status: CartStatus,
    },
}

#[derive(Debug, Clone)]
pub enum CartItemFilter {
    ByCart {
        cart_id: CartId,
    },
    ByCartAndProduct {
        cart_id: CartId,
        product_name: String,
    },
    /// Identity plus owning cart, so a delete can never reach another cart.
    ByIdAndCart {
        id: CartItemId,
        cart_id: CartId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const fn first(limit: i64) -> Self {
        Self { limit, offset: 0 }
    }
}
