use crate::domain::cart::{CartItem, CartItemId, LineItemView, ProductView, Quantity, SessionId};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

use super::cart_service::CartService;

/// Entry points the transport layer drives. Quantities arrive as text and
/// are parsed here so a bad value never reaches the repository.
pub trait CartCommands: Send + Sync {
    fn list_items(&self, session_id: &SessionId) -> Vec<LineItemView>;

    fn add_item(
        &self,
        session_id: &SessionId,
        product_name: &str,
        quantity_text: &str,
    ) -> Result<CartItem, DomainError>;

    fn remove_item(
        &self,
        session_id: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<(), DomainError>;

    fn products(&self) -> Vec<ProductView>;
}

impl<R: CartRepository> CartCommands for CartService<R> {
    fn list_items(&self, session_id: &SessionId) -> Vec<LineItemView> {
        self.get_cart_items(session_id)
    }

    fn add_item(
        &self,
        session_id: &SessionId,
        product_name: &str,
        quantity_text: &str,
    ) -> Result<CartItem, DomainError> {
        let quantity: Quantity = quantity_text.parse()?;
        self.add_item_to_cart(session_id, product_name, quantity)
    }

    fn remove_item(
        &self,
        session_id: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<(), DomainError> {
        self.delete_cart_item(session_id, cart_item_id)
    }

    fn products(&self) -> Vec<ProductView> {
        CartService::products(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::PriceTable;
    use crate::infrastructure::memory::InMemoryCartRepository;

    fn commands() -> CartService<InMemoryCartRepository> {
        CartService::new(InMemoryCartRepository::new(), PriceTable::default())
    }

    #[test]
    fn add_item_parses_quantity_text() {
        let svc = commands();
        let line = svc
            .add_item(&SessionId::new("s"), "bag", "2")
            .expect("valid add");
        assert_eq!(line.quantity, 2);
        assert_eq!(svc.list_items(&SessionId::new("s")).len(), 1);
    }

    #[test]
    fn bad_quantity_text_never_touches_storage() {
        let svc = commands();
        for text in ["", "abc", "0", "-2", "1.5"] {
            let err = svc
                .add_item(&SessionId::new("s"), "bag", text)
                .expect_err("invalid quantity");
            assert!(matches!(err, DomainError::InvalidQuantity(_)), "{text:?}");
        }
        assert!(svc.repository().carts().is_empty());
    }

    #[test]
    fn remove_item_delegates_to_service() {
        let svc = commands();
        let s = SessionId::new("s");
        let line = svc.add_item(&s, "shoe", "1").expect("valid add");
        svc.remove_item(&s, line.id).expect("remove");
        assert!(svc.list_items(&s).is_empty());
    }

    #[test]
    fn products_lists_catalogue() {
        let names: Vec<String> = CartCommands::products(&commands())
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["bag", "purse", "shoe", "watch"]);
    }
}
