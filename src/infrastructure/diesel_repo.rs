use std::cell::RefCell;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::{debug, error};

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartItem, NewCart, NewCartItem};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, CartStore};
use crate::domain::query::{CartFilter, CartItemFilter, Page, SortOrder};
use crate::schema::{cart_items, carts};

use super::models::{CartItemRow, CartRow, NewCartItemRow, NewCartRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        debug!("diesel error: {e}");
        DomainError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        error!("could not check out a database connection: {e}");
        DomainError::Storage(e.to_string())
    }
}

// ── Connection-scoped store ───────────────────────────────────────────────────

/// Runs every operation on one borrowed connection, which is what lets a
/// sequence of calls share a transaction.
pub struct PgCartStore<'a> {
    conn: RefCell<&'a mut PgConnection>,
}

impl<'a> PgCartStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self {
            conn: RefCell::new(conn),
        }
    }
}

impl CartStore for PgCartStore<'_> {
    fn query_carts(
        &self,
        filter: &CartFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Cart>, DomainError> {
        let mut conn = self.conn.borrow_mut();
        let CartFilter::BySessionAndStatus { session_id, status } = filter;

        let mut query = carts::table
            .filter(carts::session_id.eq(session_id.as_str().to_owned()))
            .filter(carts::status.eq(status.as_str()))
            .select(CartRow::as_select())
            .into_boxed();
        query = match order {
            SortOrder::NewestFirst => query.order((carts::created_at.desc(), carts::id.desc())),
            SortOrder::OldestFirst => query.order((carts::created_at.asc(), carts::id.asc())),
        };

        let rows: Vec<CartRow> = query
            .limit(page.limit)
            .offset(page.offset)
            .load(&mut **conn)?;
        rows.into_iter().map(Cart::try_from).collect()
    }

    fn query_cart_items(
        &self,
        filter: &CartItemFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<CartItem>, DomainError> {
        let mut conn = self.conn.borrow_mut();

        let mut query = cart_items::table
            .select(CartItemRow::as_select())
            .into_boxed();
        query = match filter {
            CartItemFilter::ByCart { cart_id } => query.filter(cart_items::cart_id.eq(*cart_id)),
            CartItemFilter::ByCartAndProduct {
                cart_id,
                product_name,
            } => query
                .filter(cart_items::cart_id.eq(*cart_id))
                .filter(cart_items::product_name.eq(product_name.clone())),
            CartItemFilter::ByIdAndCart { id, cart_id } => query
                .filter(cart_items::id.eq(*id))
                .filter(cart_items::cart_id.eq(*cart_id)),
        };
        query = match order {
            SortOrder::NewestFirst => {
                query.order((cart_items::created_at.desc(), cart_items::id.desc()))
            }
            SortOrder::OldestFirst => {
                query.order((cart_items::created_at.asc(), cart_items::id.asc()))
            }
        };

        let rows: Vec<CartItemRow> = query
            .limit(page.limit)
            .offset(page.offset)
            .load(&mut **conn)?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    fn create_cart(&self, cart: NewCart) -> Result<Cart, DomainError> {
        let mut conn = self.conn.borrow_mut();
        let row: CartRow = diesel::insert_into(carts::table)
            .values(&NewCartRow {
                session_id: cart.session_id.as_str().to_owned(),
                status: cart.status.as_str().to_owned(),
                total: cart.total,
            })
            .returning(CartRow::as_returning())
            .get_result(&mut **conn)?;
        Cart::try_from(row)
    }

    fn create_cart_item(&self, item: NewCartItem) -> Result<CartItem, DomainError> {
        let mut conn = self.conn.borrow_mut();
        let row: CartItemRow = diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                cart_id: item.cart_id,
                product_name: item.product_name,
                quantity: item.quantity,
                price: item.price,
            })
            .returning(CartItemRow::as_returning())
            .get_result(&mut **conn)?;
        Ok(CartItem::from(row))
    }

    fn update_cart(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut conn = self.conn.borrow_mut();
        diesel::update(carts::table.find(cart.id))
            .set((
                carts::session_id.eq(cart.session_id.as_str().to_owned()),
                carts::status.eq(cart.status.as_str()),
                carts::total.eq(cart.total.clone()),
                carts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut **conn)?;
        Ok(())
    }

    fn update_cart_item(&self, item: &CartItem) -> Result<(), DomainError> {
        let mut conn = self.conn.borrow_mut();
        diesel::update(cart_items::table.find(item.id))
            .set((
                cart_items::cart_id.eq(item.cart_id),
                cart_items::product_name.eq(item.product_name.clone()),
                cart_items::quantity.eq(item.quantity),
                cart_items::price.eq(item.price.clone()),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .execute(&mut **conn)?;
        Ok(())
    }

    fn delete_cart_items(&self, filter: &CartItemFilter) -> Result<usize, DomainError> {
        let mut guard = self.conn.borrow_mut();
        let conn: &mut PgConnection = &mut guard;

        let deleted = match filter {
            CartItemFilter::ByCart { cart_id } => {
                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(*cart_id)))
                    .execute(conn)?
            }
            CartItemFilter::ByCartAndProduct {
                cart_id,
                product_name,
            } => diesel::delete(
                cart_items::table
                    .filter(cart_items::cart_id.eq(*cart_id))
                    .filter(cart_items::product_name.eq(product_name.clone())),
            )
            .execute(conn)?,
            CartItemFilter::ByIdAndCart { id, cart_id } => diesel::delete(
                cart_items::table
                    .filter(cart_items::id.eq(*id))
                    .filter(cart_items::cart_id.eq(*cart_id)),
            )
            .execute(conn)?,
        };
        Ok(deleted)
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&PgCartStore<'_>) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut pooled = self.pool.get()?;
        f(&PgCartStore::new(&mut pooled))
    }
}

impl CartStore for DieselCartRepository {
    fn query_carts(
        &self,
        filter: &CartFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Cart>, DomainError> {
        self.with_store(|store| store.query_carts(filter, order, page))
    }

    fn query_cart_items(
        &self,
        filter: &CartItemFilter,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<CartItem>, DomainError> {
        self.with_store(|store| store.query_cart_items(filter, order, page))
    }

    fn create_cart(&self, cart: NewCart) -> Result<Cart, DomainError> {
        self.with_store(|store| store.create_cart(cart))
    }

    fn create_cart_item(&self, item: NewCartItem) -> Result<CartItem, DomainError> {
        self.with_store(|store| store.create_cart_item(item))
    }

    fn update_cart(&self, cart: &Cart) -> Result<(), DomainError> {
        self.with_store(|store| store.update_cart(cart))
    }

    fn update_cart_item(&self, item: &CartItem) -> Result<(), DomainError> {
        self.with_store(|store| store.update_cart_item(item))
    }

    fn delete_cart_items(&self, filter: &CartItemFilter) -> Result<usize, DomainError> {
        self.with_store(|store| store.delete_cart_items(filter))
    }
}

impl CartRepository for DieselCartRepository {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&dyn CartStore) -> Result<T, DomainError>,
    {
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction::<_, DomainError, _>(|conn| f(&PgCartStore::new(conn)))
    }
}
