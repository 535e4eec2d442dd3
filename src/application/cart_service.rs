use bigdecimal::BigDecimal;
use log::{debug, error, info, warn};

use crate::domain::cart::{
    Cart, CartItem, CartItemId, CartStatus, LineItemView, NewCart, NewCartItem, ProductView,
    Quantity, SessionId,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, CartStore};
use crate::domain::pricing::PriceTable;
use crate::domain::query::{CartFilter, CartItemFilter, Page, SortOrder};

/// Maximum number of line items returned when listing a cart.
pub const MAX_LISTED_ITEMS: i64 = 100;

/// Upper bound on items scanned when recomputing a cart total.
const MAX_ITEMS_PER_CART: i64 = 10_000;

pub struct CartService<R> {
    repo: R,
    prices: PriceTable,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R, prices: PriceTable) -> Self {
        Self { repo, prices }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn products(&self) -> Vec<ProductView> {
        self.prices.products()
    }

    /// Newest open cart for the session. More than one open cart breaks the
    /// one-open-cart invariant; if it happens anyway the newest one wins.
    pub fn get_open_cart(&self, session_id: &SessionId) -> Result<Cart, DomainError> {
        find_open_cart(&self.repo, session_id).map_err(DomainError::into_internal)
    }

    pub fn get_or_create_cart(&self, session_id: &SessionId) -> Result<(Cart, bool), DomainError> {
        self.repo
            .transaction(|store| resolve_or_create_cart(store, session_id))
            .map_err(|e| log_storage_failure("get_or_create_cart", session_id, e))
    }

    /// Adds `quantity` units of `product_name`, merging into the existing
    /// line for that product when there is one. Returns the line as stored.
    pub fn add_item_to_cart(
        &self,
        session_id: &SessionId,
        product_name: &str,
        quantity: Quantity,
    ) -> Result<CartItem, DomainError> {
        let subtotal = self
            .prices
            .subtotal(product_name, quantity)
            .ok_or_else(|| DomainError::InvalidProduct(product_name.to_string()))?;

        let item = self
            .repo
            .transaction(|store| {
                let (mut cart, created) = resolve_or_create_cart(store, session_id)?;

                let existing = if created {
                    None
                } else {
                    store
                        .query_cart_items(
                            &CartItemFilter::ByCartAndProduct {
                                cart_id: cart.id,
                                product_name: product_name.to_string(),
                            },
                            SortOrder::NewestFirst,
                            Page::first(1),
                        )?
                        .into_iter()
                        .next()
                };

                let item = match existing {
                    Some(mut item) => {
                        item.merge(quantity, &subtotal)?;
                        store.update_cart_item(&item)?;
                        item
                    }
                    None => store.create_cart_item(NewCartItem {
                        cart_id: cart.id,
                        product_name: product_name.to_string(),
                        quantity: quantity.get(),
                        price: subtotal.clone(),
                    })?,
                };

                cart.total += subtotal.clone();
                store.update_cart(&cart)?;
                Ok(item)
            })
            .map_err(|e| log_storage_failure("add_item_to_cart", session_id, e))?;

        info!(
            "session {}: added {} x {} (line {} now qty {}, price {})",
            session_id,
            quantity.get(),
            product_name,
            item.id,
            item.quantity,
            item.price
        );
        Ok(item)
    }

    /// Removes one line from the session's open cart and recomputes the cart
    /// total. Items that do not exist or belong to another cart are ignored.
    pub fn delete_cart_item(
        &self,
        session_id: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<(), DomainError> {
        let deleted = self
            .repo
            .transaction(|store| {
                let mut cart = match find_open_cart(store, session_id) {
                    Ok(cart) => cart,
                    Err(DomainError::CartNotFound) => {
                        return Err(DomainError::Internal(format!(
                            "no open cart for session {session_id}"
                        )))
                    }
                    Err(e) => return Err(e),
                };

                let deleted = store.delete_cart_items(&CartItemFilter::ByIdAndCart {
                    id: cart_item_id,
                    cart_id: cart.id,
                })?;
                if deleted == 0 {
                    return Ok(0);
                }

                cart.total = cart_total(store, &cart)?;
                store.update_cart(&cart)?;
                Ok(deleted)
            })
            .map_err(|e| log_storage_failure("delete_cart_item", session_id, e))?;

        if deleted == 0 {
            debug!("session {session_id}: cart item {cart_item_id} not in open cart, nothing deleted");
        } else {
            info!("session {session_id}: removed cart item {cart_item_id}");
        }
        Ok(())
    }

    /// Lists the open cart's lines, newest first. A missing cart or any read
    /// failure yields an empty list.
    pub fn get_cart_items(&self, session_id: &SessionId) -> Vec<LineItemView> {
        let cart = match find_open_cart(&self.repo, session_id) {
            Ok(cart) => cart,
            Err(DomainError::CartNotFound) => return Vec::new(),
            Err(e) => {
                warn!("session {session_id}: listing cart failed, showing empty cart: {e}");
                return Vec::new();
            }
        };

        match self.repo.query_cart_items(
            &CartItemFilter::ByCart { cart_id: cart.id },
            SortOrder::NewestFirst,
            Page::first(MAX_LISTED_ITEMS),
        ) {
            Ok(items) => items.into_iter().map(LineItemView::from).collect(),
            Err(e) => {
                warn!("session {session_id}: listing cart items failed, showing empty cart: {e}");
                Vec::new()
            }
        }
    }
}

fn find_open_cart(store: &dyn CartStore, session_id: &SessionId) -> Result<Cart, DomainError> {
    store
        .query_carts(
            &CartFilter::BySessionAndStatus {
                session_id: session_id.clone(),
                status: CartStatus::Open,
            },
            SortOrder::NewestFirst,
            Page::first(1),
        )?
        .into_iter()
        .next()
        .ok_or(DomainError::CartNotFound)
}

fn resolve_or_create_cart(
    store: &dyn CartStore,
    session_id: &SessionId,
) -> Result<(Cart, bool), DomainError> {
    match find_open_cart(store, session_id) {
        Ok(cart) => Ok((cart, false)),
        Err(DomainError::CartNotFound) => {
            let cart = store.create_cart(NewCart::open(session_id.clone()))?;
            debug!("session {session_id}: opened cart {}", cart.id);
            Ok((cart, true))
        }
        Err(e) => Err(DomainError::Internal(e.to_string())),
    }
}

fn cart_total(store: &dyn CartStore, cart: &Cart) -> Result<BigDecimal, DomainError> {
    let items = store.query_cart_items(
        &CartItemFilter::ByCart { cart_id: cart.id },
        SortOrder::OldestFirst,
        Page::first(MAX_ITEMS_PER_CART),
    )?;
    Ok(items
        .into_iter()
        .fold(BigDecimal::from(0), |total, item| total + item.price))
}

fn log_storage_failure(op: &str, session_id: &SessionId, e: DomainError) -> DomainError {
    let e = e.into_internal();
    if let DomainError::Internal(msg) = &e {
        error!("{op} failed for session {session_id}: {msg}");
    }
    e
}
