//! Session
//!
//! The services a hosting layer talks to. [`CartSession`] owns one owner's
//! cart and persists it after every mutation; [`CouponService`] resolves and
//! validates coupon codes and manages per-owner claims. Persistence outages
//! degrade cart operations to memory-only instead of failing them.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    cart::{Cart, CartError},
    catalog::{CatalogError, CouponDirectory},
    claims::{ClaimError, ClaimedCoupon},
    coupons::{Coupon, CouponError, CouponEvaluation, canonical_code},
    products::Product,
    store::{Store, StoreError},
};

/// One owner's live cart, backed by a [`Store`].
///
/// The cart is scoped strictly to its owner: switching identity means
/// constructing a new session, and persistence is last-write-wins across an
/// owner's devices.
pub struct CartSession {
    owner: String,
    cart: Cart,
    store: Arc<dyn Store>,
    memory_only: bool,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("owner", &self.owner)
            .field("cart", &self.cart)
            .field("memory_only", &self.memory_only)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Load the owner's stored cart, or start an empty one.
    ///
    /// A store outage is not fatal: the session starts empty in memory-only
    /// mode and logs a warning.
    #[tracing::instrument(name = "cart.session.load", skip_all)]
    pub async fn load(owner: impl Into<String>, store: Arc<dyn Store>) -> Self {
        let owner = owner.into();

        let (cart, memory_only) = match store.load_cart(&owner).await {
            Ok(Some(cart)) => (cart, false),
            Ok(None) => (Cart::new(), false),
            Err(err) => {
                warn!(owner = %owner, error = %err, "store unavailable, starting memory-only cart");
                (Cart::new(), true)
            }
        };

        CartSession {
            owner,
            cart,
            store,
            memory_only,
        }
    }

    /// Add units of a product and persist the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub async fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        self.cart.add_item(product, quantity)?;
        self.persist().await;

        Ok(())
    }

    /// Set a line's quantity (zero removes the line) and persist the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when setting a non-zero quantity
    /// on an absent line.
    pub async fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.cart.update_quantity(product_id, quantity)?;
        self.persist().await;

        Ok(())
    }

    /// Remove a product's line. Returns whether anything was removed; the
    /// cart is only persisted when it actually changed.
    pub async fn remove_item(&mut self, product_id: &str) -> bool {
        let removed = self.cart.remove_item(product_id);

        if removed {
            self.persist().await;
        }

        removed
    }

    /// Empty the cart and persist the empty document.
    pub async fn clear(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    async fn persist(&mut self) {
        match self.store.save_cart(&self.owner, &self.cart).await {
            Ok(()) => {
                if self.memory_only {
                    debug!(owner = %self.owner, "store recovered, cart persisted again");
                }
                self.memory_only = false;
            }
            Err(err) => {
                warn!(owner = %self.owner, error = %err, "cart not persisted, continuing in memory");
                self.memory_only = true;
            }
        }
    }

    /// The current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The pre-coupon subtotal, the figure coupon evaluation consumes.
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// The owning identity.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Whether the last persistence attempt failed and the cart currently
    /// lives only in memory.
    pub fn memory_only(&self) -> bool {
        self.memory_only
    }
}

/// Coupon lookup, validation and per-owner claims.
pub struct CouponService {
    directory: Arc<dyn CouponDirectory>,
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for CouponService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponService").finish_non_exhaustive()
    }
}

impl CouponService {
    /// Create a service over a coupon directory and a claims store.
    pub fn new(directory: Arc<dyn CouponDirectory>, store: Arc<dyn Store>) -> Self {
        CouponService { directory, store }
    }

    /// Resolve a code and validate it against a cart total, as of now.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::NotFound`] for unknown codes,
    /// [`CouponError::Unavailable`] when the directory cannot be reached,
    /// and the evaluation errors from [`Coupon::evaluate`] otherwise.
    #[tracing::instrument(name = "coupons.service.evaluate", skip(self), err)]
    pub async fn evaluate(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponEvaluation, CouponError> {
        self.evaluate_at(code, cart_total, Timestamp::now()).await
    }

    /// [`CouponService::evaluate`] against an explicit point in time.
    ///
    /// # Errors
    ///
    /// Same as [`CouponService::evaluate`].
    pub async fn evaluate_at(
        &self,
        code: &str,
        cart_total: Decimal,
        now: Timestamp,
    ) -> Result<CouponEvaluation, CouponError> {
        let coupon = self
            .directory
            .find_coupon(code)
            .await
            .map_err(|err| match err {
                CatalogError::Unavailable(source) => CouponError::Unavailable(source),
                CatalogError::NotFound(_) => CouponError::NotFound,
            })?
            .ok_or(CouponError::NotFound)?;

        coupon.evaluate(cart_total, now)
    }

    /// Claim a coupon for an owner, as of now.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::AlreadyClaimed`] when the owner already holds
    /// this code, or [`ClaimError::Store`] when the claim cannot be read or
    /// recorded.
    #[tracing::instrument(name = "coupons.service.claim", skip(self, coupon), fields(code = %coupon.code), err)]
    pub async fn claim(&self, owner: &str, coupon: &Coupon) -> Result<ClaimedCoupon, ClaimError> {
        self.claim_at(owner, coupon, Timestamp::now()).await
    }

    /// [`CouponService::claim`] with an explicit claim timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`CouponService::claim`].
    pub async fn claim_at(
        &self,
        owner: &str,
        coupon: &Coupon,
        now: Timestamp,
    ) -> Result<ClaimedCoupon, ClaimError> {
        let existing = self.store.load_claimed_coupons(owner).await?;

        if existing.iter().any(|claim| claim.matches_code(&coupon.code)) {
            return Err(ClaimError::AlreadyClaimed {
                code: canonical_code(&coupon.code),
            });
        }

        let claim = ClaimedCoupon::new(coupon.clone(), now);
        self.store.save_claimed_coupon(owner, &claim).await?;

        Ok(claim)
    }

    /// All coupons the owner has claimed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the claims cannot be read.
    pub async fn claimed(&self, owner: &str) -> Result<Vec<ClaimedCoupon>, StoreError> {
        self.store.load_claimed_coupons(owner).await
    }

    /// Release an owner's claim by code. Returns whether a claim existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the deletion cannot be recorded.
    pub async fn release(&self, owner: &str, code: &str) -> Result<bool, StoreError> {
        self.store.delete_claimed_coupon(owner, code).await
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use testresult::TestResult;

    use crate::{
        catalog::{MemoryCatalog, MockCouponDirectory},
        coupons::CouponKind,
        store::{MemoryStore, MockStore},
    };

    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("Product {id}"),
            price: Decimal::from(price),
            discount_percent: None,
            category: "otros".to_owned(),
            featured: false,
            on_sale: false,
            popular: false,
            stock: 1,
            rating: None,
        }
    }

    fn coupon(code: &str, value: i64) -> Coupon {
        Coupon {
            code: code.to_owned(),
            kind: CouponKind::Percentage,
            value: Decimal::from(value),
            max_discount: None,
            min_purchase: Decimal::ZERO,
            expires_at: None,
            active: true,
            used: false,
            usage_limit: None,
            used_count: 0,
        }
    }

    fn unavailable() -> StoreError {
        StoreError::Unavailable(io::Error::new(io::ErrorKind::ConnectionRefused, "down"))
    }

    #[tokio::test]
    async fn session_persists_across_loads() -> TestResult {
        let store = Arc::new(MemoryStore::new());

        let mut session = CartSession::load("alice", Arc::clone(&store) as Arc<dyn Store>).await;
        session.add_item(&product("a", 100), 2).await?;

        let reloaded = CartSession::load("alice", store as Arc<dyn Store>).await;

        assert_eq!(reloaded.item_count(), 2);
        assert!(!reloaded.memory_only());

        Ok(())
    }

    #[tokio::test]
    async fn owners_load_independent_carts() -> TestResult {
        let store = Arc::new(MemoryStore::new());

        let mut alice = CartSession::load("alice", Arc::clone(&store) as Arc<dyn Store>).await;
        alice.add_item(&product("a", 100), 1).await?;

        let bob = CartSession::load("bob", store as Arc<dyn Store>).await;

        assert!(bob.cart().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn store_outage_degrades_to_memory_only() -> TestResult {
        let mut store = MockStore::new();
        store.expect_load_cart().returning(|_| Err(unavailable()));
        store.expect_save_cart().returning(|_, _| Err(unavailable()));

        let mut session = CartSession::load("alice", Arc::new(store) as Arc<dyn Store>).await;

        session.add_item(&product("a", 100), 1).await?;

        assert!(session.memory_only());
        assert_eq!(session.item_count(), 1);
        assert_eq!(session.subtotal(), Decimal::from(100));

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_skips_persistence_when_nothing_changed() {
        let mut store = MockStore::new();
        store.expect_load_cart().returning(|_| Ok(None));
        store.expect_save_cart().never();

        let mut session = CartSession::load("alice", Arc::new(store) as Arc<dyn Store>).await;

        assert!(!session.remove_item("ghost").await);
    }

    #[tokio::test]
    async fn evaluate_resolves_code_case_insensitively() -> TestResult {
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), vec![coupon("SAVE20", 20)]));
        let service = CouponService::new(catalog, Arc::new(MemoryStore::new()));

        let evaluation = service.evaluate("save20", Decimal::from(100)).await?;

        assert_eq!(evaluation.discount_amount, Decimal::from(20));
        assert_eq!(evaluation.final_total, Decimal::from(80));

        Ok(())
    }

    #[tokio::test]
    async fn evaluate_unknown_code_is_not_found() {
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), Vec::new()));
        let service = CouponService::new(catalog, Arc::new(MemoryStore::new()));

        let result = service.evaluate("GHOST", Decimal::from(100)).await;

        assert!(matches!(result, Err(CouponError::NotFound)));
    }

    #[tokio::test]
    async fn evaluate_surfaces_directory_outage() {
        let mut directory = MockCouponDirectory::new();
        directory.expect_find_coupon().returning(|_| {
            Err(CatalogError::Unavailable(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "down",
            )))
        });

        let service = CouponService::new(Arc::new(directory), Arc::new(MemoryStore::new()));

        let result = service.evaluate("SAVE20", Decimal::from(100)).await;

        assert!(matches!(result, Err(CouponError::Unavailable(_))));
    }

    #[tokio::test]
    async fn duplicate_claim_is_rejected_and_set_stays_at_one() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), Vec::new()));
        let service = CouponService::new(catalog, Arc::clone(&store) as Arc<dyn Store>);

        let save20 = coupon("SAVE20", 20);

        service.claim("alice", &save20).await?;
        let second = service.claim("alice", &save20).await;

        assert!(matches!(
            second,
            Err(ClaimError::AlreadyClaimed { code }) if code == "SAVE20"
        ));
        assert_eq!(service.claimed("alice").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_detection_ignores_code_case() -> TestResult {
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), Vec::new()));
        let service = CouponService::new(catalog, Arc::new(MemoryStore::new()));

        service.claim("alice", &coupon("save20", 20)).await?;
        let second = service.claim("alice", &coupon("SAVE20", 20)).await;

        assert!(matches!(second, Err(ClaimError::AlreadyClaimed { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn different_owners_may_claim_the_same_code() -> TestResult {
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), Vec::new()));
        let service = CouponService::new(catalog, Arc::new(MemoryStore::new()));

        let save20 = coupon("SAVE20", 20);

        service.claim("alice", &save20).await?;
        service.claim("bob", &save20).await?;

        assert_eq!(service.claimed("alice").await?.len(), 1);
        assert_eq!(service.claimed("bob").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn release_then_reclaim_succeeds() -> TestResult {
        let catalog = Arc::new(MemoryCatalog::new(Vec::new(), Vec::new()));
        let service = CouponService::new(catalog, Arc::new(MemoryStore::new()));

        let save20 = coupon("SAVE20", 20);

        service.claim("alice", &save20).await?;

        assert!(service.release("alice", "save20").await?);
        assert!(!service.release("alice", "save20").await?);

        service.claim("alice", &save20).await?;

        assert_eq!(service.claimed("alice").await?.len(), 1);

        Ok(())
    }
}
