use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, warn};

use crate::domain::cart::{Cart, CartItem, NewCart, NewCartItem};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, CartStore};
use crate::domain::query::{CartFilter, CartItemFilter, Page, SortOrder};

#[derive(Debug, Clone, Default)]
struct State {
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    next_cart_id: i64,
    next_item_id: i64,
}

/// Process-local repository. Ids are assigned sequentially from 1 and a
/// transaction restores a snapshot of the whole state when it fails.
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    state: Mutex<State>,
    tx_lock: Mutex<()>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent query fail with a storage error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent create/update/delete fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn carts(&self) -> Vec<Cart> {
        self.lock().carts.clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    /// State is only mutated whole-record under the lock and restored from a
    /// snapshot when a transaction unwinds, so a poisoned lock is still
    /// consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("in-memory cart state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), DomainError> {
        if flag.load(Ordering::SeqCst) {
            debug!("in-memory {op} failing on request");
            return Err(DomainError::Storage(format!("{op} failed: storage unavailable")));
        }
        Ok(())
    }
}

fn cart_matches(cart: &Cart, filter: &CartFilter) -> bool {
    match filter {
        CartFilter::BySessionAndStatus { session_id, status } => {
            cart.session_id == *session_id && cart.status == *status
        }
    }
}

fn item_matches(item: &CartItem, filter: &CartItemFilter) -> bool {
    match filter {
        CartItemFilter::ByCart { cart_id } => item.cart_id == *cart_id,
        CartItemFilter::ByCartAndProduct {
            cart_id,
            product_name,
        } => item.cart_id == *cart_id && item.product_name == *product_name,
        CartItemFilter::ByIdAndCart { id, cart_id } => {
            item.id == *id && item.cart_id == *cart_id
        }
    }
}

fn paginate<T, K: Ord>(
    mut rows: Vec<T>,
    order: SortOrder,
    page: Page,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    if order == SortOrder::NewestFirst {
        rows.reverse();
    }
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).collect()
}

impl CartStore for InMemoryCartRepository {
    fn query_carts(
        &self,
        filter: &CartFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Cart>, DomainError> {
        self.check(&self.fail_reads, "query_carts")?;
        let state = self.lock();
        let rows: Vec<Cart> = state
            .carts
            .iter()
            .filter(|c| cart_matches(c, filter))
            .cloned()
            .collect();
        Ok(paginate(rows, order, page, |c: &Cart| (c.created_at, c.id)))
    }

    fn query_cart_items(
        &self,
        filter: &CartItemFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<CartItem>, DomainError> {
        self.check(&self.fail_reads, "query_cart_items")?;
        let state = self.lock();
        let rows: Vec<CartItem> = state
            .items
            .iter()
            .filter(|i| item_matches(i, filter))
            .cloned()
            .collect();
        Ok(paginate(rows, order, page, |i: &CartItem| (i.created_at, i.id)))
    }

    fn create_cart(&self, cart: NewCart) -> Result<Cart, DomainError> {
        self.check(&self.fail_writes, "create_cart")?;
        let mut state = self.lock();
        state.next_cart_id += 1;
        let cart = Cart {
            id: state.next_cart_id,
            session_id: cart.session_id,
            status: cart.status,
            total: cart.total,
            created_at: Utc::now(),
        };
        state.carts.push(cart.clone());
        Ok(cart)
    }

    fn create_cart_item(&self, item: NewCartItem) -> Result<CartItem, DomainError> {
        self.check(&self.fail_writes, "create_cart_item")?;
        let mut state = self.lock();
        state.next_item_id += 1;
        let item = CartItem {
            id: state.next_item_id,
            cart_id: item.cart_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
            created_at: Utc::now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    fn update_cart(&self, cart: &Cart) -> Result<(), DomainError> {
        self.check(&self.fail_writes, "update_cart")?;
        let mut state = self.lock();
        if let Some(existing) = state.carts.iter_mut().find(|c| c.id == cart.id) {
            *existing = cart.clone();
        }
        Ok(())
    }

    fn update_cart_item(&self, item: &CartItem) -> Result<(), DomainError> {
        self.check(&self.fail_writes, "update_cart_item")?;
        let mut state = self.lock();
        if let Some(existing) = state.items.iter_mut().find(|i| i.id == item.id) {
            *existing = item.clone();
        }
        Ok(())
    }

    fn delete_cart_items(&self, filter: &CartItemFilter) -> Result<usize, DomainError> {
        self.check(&self.fail_writes, "delete_cart_items")?;
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|i| !item_matches(i, filter));
        Ok(before - state.items.len())
    }
}

impl CartRepository for InMemoryCartRepository {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&dyn CartStore) -> Result<T, DomainError>,
    {
        let _tx = self.tx_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.lock().clone();

        match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!("in-memory transaction rolled back: {e}");
                *self.lock() = snapshot;
                Err(e)
            }
            Err(payload) => {
                warn!("in-memory transaction panicked, restoring snapshot");
                *self.lock() = snapshot;
                panic::resume_unwind(payload)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::cart::{CartStatus, SessionId};

    fn open_carts(repo: &InMemoryCartRepository, session: &str) -> Vec<Cart> {
        repo.query_carts(
            &CartFilter::BySessionAndStatus {
                session_id: SessionId::new(session),
                status: CartStatus::Open,
            },
            SortOrder::NewestFirst,
            Page::first(10),
        )
        .expect("query failed")
    }

    fn new_item(cart_id: i64, product: &str) -> NewCartItem {
        NewCartItem {
            cart_id,
            product_name: product.to_string(),
            quantity: 1,
            price: BigDecimal::from(100),
        }
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let repo = InMemoryCartRepository::new();
        let a = repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");
        let b = repo.create_cart(NewCart::open(SessionId::new("b"))).expect("create");
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn query_filters_by_session_and_status() {
        let repo = InMemoryCartRepository::new();
        repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");
        let mut closed = repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");
        closed.status = CartStatus::Closed;
        repo.update_cart(&closed).expect("update");
        repo.create_cart(NewCart::open(SessionId::new("b"))).expect("create");

        let carts = open_carts(&repo, "a");
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].id, 1);
        assert!(open_carts(&repo, "nobody").is_empty());
    }

    #[test]
    fn newest_first_ordering_and_pagination() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");
        for product in ["shoe", "purse", "bag"] {
            repo.create_cart_item(new_item(cart.id, product)).expect("create item");
        }

        let filter = CartItemFilter::ByCart { cart_id: cart.id };
        let newest = repo
            .query_cart_items(&filter, SortOrder::NewestFirst, Page::first(2))
            .expect("query");
        let ids: Vec<i64> = newest.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let rest = repo
            .query_cart_items(&filter, SortOrder::OldestFirst, Page { limit: 10, offset: 1 })
            .expect("query");
        let ids: Vec<i64> = rest.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn delete_respects_owning_cart() {
        let repo = InMemoryCartRepository::new();
        let mine = repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");
        let theirs = repo.create_cart(NewCart::open(SessionId::new("b"))).expect("create");
        let item = repo.create_cart_item(new_item(theirs.id, "shoe")).expect("create item");

        let deleted = repo
            .delete_cart_items(&CartItemFilter::ByIdAndCart {
                id: item.id,
                cart_id: mine.id,
            })
            .expect("delete");
        assert_eq!(deleted, 0);
        assert_eq!(repo.items().len(), 1);
    }

    #[test]
    fn failed_transaction_restores_snapshot() {
        let repo = InMemoryCartRepository::new();
        let result: Result<(), DomainError> = repo.transaction(|store| {
            store.create_cart(NewCart::open(SessionId::new("a")))?;
            Err(DomainError::Storage("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(repo.carts().is_empty());
    }

    #[test]
    fn panicking_transaction_leaves_repository_usable() {
        let repo = InMemoryCartRepository::new();
        repo.create_cart(NewCart::open(SessionId::new("a"))).expect("create");

        let unwound = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), DomainError> = repo.transaction(|store| {
                store.create_cart(NewCart::open(SessionId::new("b")))?;
                panic!("handler bug");
            });
        }));
        assert!(unwound.is_err());
        assert_eq!(repo.carts().len(), 1);

        let cart = repo
            .transaction(|store| store.create_cart(NewCart::open(SessionId::new("c"))))
            .expect("later transactions still run");
        assert_eq!(cart.session_id, SessionId::new("c"));
        assert_eq!(repo.carts().len(), 2);
    }

    #[test]
    fn injected_failures_surface_as_storage_errors() {
        let repo = InMemoryCartRepository::new();
        repo.fail_writes(true);
        assert!(matches!(
            repo.create_cart(NewCart::open(SessionId::new("a"))),
            Err(DomainError::Storage(_))
        ));
        repo.fail_writes(false);
        repo.fail_reads(true);
        assert!(matches!(
            repo.query_cart_items(
                &CartItemFilter::ByCart { cart_id: 1 },
                SortOrder::NewestFirst,
                Page::first(1)
            ),
            Err(DomainError::Storage(_))
        ));
    }
}
