use super::cart::{Cart, CartItem, NewCart, NewCartItem};
use super::errors::DomainError;
use super::query::{CartFilter, CartItemFilter, Page, SortOrder};

/// Reads and writes over carts and their line items. Implementations hold
/// no opinion about cart invariants; they do exactly what they are asked.
pub trait CartStore {
    fn query_carts(
        &self,
        filter: &CartFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Cart>, DomainError>;

    fn query_cart_items(
        &self,
        filter: &CartItemFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<CartItem>, DomainError>;

    fn create_cart(&self, cart: NewCart) -> Result<Cart, DomainError>;

    fn create_cart_item(&self, item: NewCartItem) -> Result<CartItem, DomainError>;

    fn update_cart(&self, cart: &Cart) -> Result<(), DomainError>;

    fn update_cart_item(&self, item: &CartItem) -> Result<(), DomainError>;

    /// Returns how many rows matched.
    fn delete_cart_items(&self, filter: &CartItemFilter) -> Result<usize, DomainError>;
}

pub trait CartRepository: CartStore + Send + Sync + 'static {
    /// Runs `f` against a store whose writes commit together, or not at all
    /// when `f` returns an error.
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&dyn CartStore) -> Result<T, DomainError>;
}
