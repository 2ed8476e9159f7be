//! Client-core storefront state.
//!
//! The shopper-facing session (cart, wishlist, currency preference) held as
//! an explicit struct instead of ambient global state. Persistence is split
//! across two tiers with a fixed conflict policy:
//!
//! - a [`LocalCache`] written synchronously on every mutation (the browser
//!   shell backs this with local storage); between syncs the local value is
//!   authoritative;
//! - a remote cart record, pushed fire-and-forget over a channel for signed-in
//!   non-guest users; on sign-in the remote value wins and replaces the local
//!   cart.
//!
//! Push failures are logged, never surfaced; the shopper keeps working
//! against the local tier.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartLine};
use crate::domain::currency::Currency;
use crate::domain::product::Product;
use crate::domain::user::{Role, User};

pub const CART_KEY: &str = "neon_cart";
pub const WISHLIST_KEY: &str = "neon_wishlist";
pub const CURRENCY_KEY: &str = "neon_currency";

/// Durable key/value JSON cache local to the shopper.
pub trait LocalCache {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value);
    fn remove(&self, key: &str);
}

impl<T: LocalCache + ?Sized> LocalCache for &T {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Value) {
        (**self).put(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory [`LocalCache`] for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Full-cart push towards the user-scoped remote record.
#[derive(Clone, Debug)]
pub struct CartSync {
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorefrontError {
    #[error("Admin accounts cannot make purchases")]
    AdminCannotPurchase,
}

pub struct Storefront<C: LocalCache> {
    cache: C,
    sync: Option<mpsc::UnboundedSender<CartSync>>,
    session: Session,
    cart: Cart,
    wishlist: Vec<Uuid>,
    currency: Currency,
}

impl<C: LocalCache> Storefront<C> {
    /// Restore a session from the local cache. `sync` carries remote cart
    /// pushes; pass `None` for a purely local session.
    pub fn new(cache: C, sync: Option<mpsc::UnboundedSender<CartSync>>) -> Self {
        let cart = read_cached(&cache, CART_KEY)
            .map(|items| Cart { items })
            .unwrap_or_default();
        let wishlist = read_cached(&cache, WISHLIST_KEY).unwrap_or_default();
        let currency = read_cached(&cache, CURRENCY_KEY).unwrap_or_default();
        Self {
            cache,
            sync,
            session: Session::default(),
            cart,
            wishlist,
            currency,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn wishlist(&self) -> &[Uuid] {
        &self.wishlist
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Add one unit to the cart. Admins cannot purchase; the call is a no-op
    /// surfaced as an error so the UI can warn.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<(), StorefrontError> {
        if self.session.role == Role::Admin {
            return Err(StorefrontError::AdminCannotPurchase);
        }
        self.cart.add_item(product);
        self.persist_cart();
        Ok(())
    }

    pub fn remove_from_cart(&mut self, product_id: Uuid) {
        self.cart.remove_item(product_id);
        self.persist_cart();
    }

    pub fn update_quantity(&mut self, product_id: Uuid, delta: i64) {
        self.cart.update_quantity(product_id, delta);
        self.persist_cart();
    }

    /// Empty the cart, e.g. after a successful order placement.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist_cart();
    }

    pub fn toggle_wishlist(&mut self, product_id: Uuid) {
        if let Some(pos) = self.wishlist.iter().position(|id| *id == product_id) {
            self.wishlist.remove(pos);
        } else {
            self.wishlist.push(product_id);
        }
        self.write_cache(WISHLIST_KEY, &self.wishlist);
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
        self.write_cache(CURRENCY_KEY, &currency);
    }

    /// Start a signed-in session. The remote cart record wins over whatever
    /// was cached locally.
    pub fn sign_in(&mut self, user: &User, remote_cart: Option<Vec<CartLine>>) {
        self.session = Session {
            user_id: Some(user.id),
            name: user.name.clone(),
            role: user.role(),
        };
        self.cart = Cart {
            items: remote_cart.unwrap_or_default(),
        };
        // Local tier refreshed from remote; no echo push.
        self.write_cache(CART_KEY, &self.cart.items);
    }

    /// End the session and drop the cart.
    pub fn sign_out(&mut self) {
        self.session = Session::default();
        self.cart.clear();
        self.write_cache(CART_KEY, &self.cart.items);
    }

    /// Local write now, remote push fire-and-forget.
    fn persist_cart(&self) {
        self.write_cache(CART_KEY, &self.cart.items);
        let Some(sender) = &self.sync else { return };
        let Some(user_id) = self.session.user_id else { return };
        if self.session.role == Role::Guest {
            return;
        }
        let push = CartSync {
            user_id,
            items: self.cart.items.clone(),
        };
        if sender.send(push).is_err() {
            tracing::warn!(%user_id, "cart sync channel closed; keeping local copy only");
        }
    }

    fn write_cache<T: serde::Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.cache.put(key, json),
            Err(err) => tracing::warn!(key, error = %err, "failed to cache storefront state"),
        }
    }
}

fn read_cached<T: serde::de::DeserializeOwned>(cache: &impl LocalCache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable cached state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::tests::product;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn customer() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Sarah Jenkins".into(),
            email: "sarah@example.com".into(),
            password: "pw".into(),
            role: "customer".into(),
            created_at: Utc::now(),
        }
    }

    fn admin() -> User {
        let mut user = customer();
        user.role = "admin".into();
        user
    }

    #[test]
    fn mutations_persist_to_the_local_cache() {
        let mut store = Storefront::new(MemoryCache::default(), None);
        let p = product("Cyberpunk Headphones", Decimal::new(19999, 2));
        store.add_to_cart(&p).unwrap();

        let cached: Vec<CartLine> = read_cached(&store.cache, CART_KEY).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].product_id, p.id);
    }

    #[test]
    fn admin_add_to_cart_is_rejected_without_mutation() {
        let mut store = Storefront::new(MemoryCache::default(), None);
        store.sign_in(&admin(), None);
        let p = product("Neon Gaming Mouse", Decimal::new(7999, 2));

        assert_eq!(
            store.add_to_cart(&p),
            Err(StorefrontError::AdminCannotPurchase)
        );
        assert!(store.cart().is_empty());
        let cached: Vec<CartLine> = read_cached(&store.cache, CART_KEY).unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn signed_in_customers_push_to_the_remote_record() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = Storefront::new(MemoryCache::default(), Some(tx));
        let user = customer();
        store.sign_in(&user, None);

        let p = product("Mechanical Keyboard", Decimal::new(14999, 2));
        store.add_to_cart(&p).unwrap();

        let push = rx.try_recv().unwrap();
        assert_eq!(push.user_id, user.id);
        assert_eq!(push.items.len(), 1);
    }

    #[tokio::test]
    async fn guests_never_push_remotely() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = Storefront::new(MemoryCache::default(), Some(tx));
        let p = product("Mechanical Keyboard", Decimal::new(14999, 2));
        store.add_to_cart(&p).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn remote_cart_wins_on_sign_in() {
        let mut store = Storefront::new(MemoryCache::default(), None);
        let stale = product("Old Local Item", Decimal::new(10, 0));
        store.add_to_cart(&stale).unwrap();

        let remote = vec![CartLine {
            product_id: Uuid::new_v4(),
            name: "Remote Item".into(),
            price: Decimal::new(20, 0),
            quantity: 2,
            image: String::new(),
        }];
        store.sign_in(&customer(), Some(remote.clone()));
        assert_eq!(store.cart().items, remote);
    }

    #[test]
    fn sign_out_clears_the_cart() {
        let mut store = Storefront::new(MemoryCache::default(), None);
        let p = product("Cyberpunk Headphones", Decimal::new(19999, 2));
        store.sign_in(&customer(), None);
        store.add_to_cart(&p).unwrap();
        store.sign_out();

        assert!(store.cart().is_empty());
        assert_eq!(store.session().role, Role::Guest);
    }

    #[test]
    fn cached_state_survives_a_reload() {
        let cache = MemoryCache::default();
        {
            let mut store = Storefront::new(&cache, None);
            let p = product("Cyberpunk Headphones", Decimal::new(19999, 2));
            store.add_to_cart(&p).unwrap();
            store.set_currency(Currency::Aed);
        }
        let store = Storefront::new(&cache, None);
        assert_eq!(store.cart().items.len(), 1);
        assert_eq!(store.currency(), Currency::Aed);
    }

    #[test]
    fn wishlist_toggles_per_product() {
        let mut store = Storefront::new(MemoryCache::default(), None);
        let id = Uuid::new_v4();
        store.toggle_wishlist(id);
        assert_eq!(store.wishlist(), [id]);
        store.toggle_wishlist(id);
        assert!(store.wishlist().is_empty());
    }
}
