//! Store
//!
//! The persistence seam: carts and claimed coupons keyed by owner identity.
//! Writes are whole-document, last-write-wins; there is no merging between
//! devices. Ships a process-local memory store and a JSON file store that
//! mirrors the original per-owner key layout.

use std::{
    io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{cart::Cart, claims::ClaimedCoupon};

/// Errors from the persistence adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable")]
    Unavailable(#[from] io::Error),

    /// A stored document could not be decoded.
    #[error("stored document is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for carts and claimed coupons.
///
/// An owner with no stored cart yields `None`, which is distinct from an
/// owner whose stored cart happens to be empty.
#[automock]
#[async_trait]
pub trait Store: Send + Sync {
    /// Load an owner's cart, if one was ever saved.
    async fn load_cart(&self, owner: &str) -> Result<Option<Cart>, StoreError>;

    /// Persist an owner's cart, replacing any previous document.
    async fn save_cart(&self, owner: &str, cart: &Cart) -> Result<(), StoreError>;

    /// Load all coupons the owner has claimed.
    async fn load_claimed_coupons(&self, owner: &str) -> Result<Vec<ClaimedCoupon>, StoreError>;

    /// Record a claimed coupon for the owner.
    async fn save_claimed_coupon(
        &self,
        owner: &str,
        claim: &ClaimedCoupon,
    ) -> Result<(), StoreError>;

    /// Delete an owner's claim by code. Returns whether a claim was removed.
    async fn delete_claimed_coupon(&self, owner: &str, code: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    carts: FxHashMap<String, Cart>,
    claims: FxHashMap<String, Vec<ClaimedCoupon>>,
}

/// An in-process store, useful for tests and for running without any
/// durable backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_cart(&self, owner: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.state().carts.get(owner).cloned())
    }

    async fn save_cart(&self, owner: &str, cart: &Cart) -> Result<(), StoreError> {
        self.state().carts.insert(owner.to_owned(), cart.clone());

        Ok(())
    }

    async fn load_claimed_coupons(&self, owner: &str) -> Result<Vec<ClaimedCoupon>, StoreError> {
        Ok(self.state().claims.get(owner).cloned().unwrap_or_default())
    }

    async fn save_claimed_coupon(
        &self,
        owner: &str,
        claim: &ClaimedCoupon,
    ) -> Result<(), StoreError> {
        self.state()
            .claims
            .entry(owner.to_owned())
            .or_default()
            .push(claim.clone());

        Ok(())
    }

    async fn delete_claimed_coupon(&self, owner: &str, code: &str) -> Result<bool, StoreError> {
        let mut state = self.state();

        let Some(claims) = state.claims.get_mut(owner) else {
            return Ok(false);
        };

        let before = claims.len();
        claims.retain(|claim| !claim.matches_code(code));

        Ok(claims.len() != before)
    }
}

/// A file-backed store holding one JSON document per owner per collection:
/// `cart_<owner>.json` and `claimed_<owner>.json` under a base directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the directory cannot be
    /// created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(JsonFileStore { dir })
    }

    fn document(&self, prefix: &str, owner: &str) -> PathBuf {
        // Owner ids come from the auth layer; squash anything that is not
        // filename-safe rather than trusting them as path components.
        let owner: String = owner
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();

        self.dir.join(format!("{prefix}_{owner}.json"))
    }

    fn read<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn write<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        Ok(std::fs::write(path, serde_json::to_vec(value)?)?)
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load_cart(&self, owner: &str) -> Result<Option<Cart>, StoreError> {
        Self::read(&self.document("cart", owner))
    }

    async fn save_cart(&self, owner: &str, cart: &Cart) -> Result<(), StoreError> {
        Self::write(&self.document("cart", owner), cart)
    }

    async fn load_claimed_coupons(&self, owner: &str) -> Result<Vec<ClaimedCoupon>, StoreError> {
        Ok(Self::read(&self.document("claimed", owner))?.unwrap_or_default())
    }

    async fn save_claimed_coupon(
        &self,
        owner: &str,
        claim: &ClaimedCoupon,
    ) -> Result<(), StoreError> {
        let path = self.document("claimed", owner);

        let mut claims: Vec<ClaimedCoupon> = Self::read(&path)?.unwrap_or_default();
        claims.push(claim.clone());

        Self::write(&path, &claims)
    }

    async fn delete_claimed_coupon(&self, owner: &str, code: &str) -> Result<bool, StoreError> {
        let path = self.document("claimed", owner);

        let mut claims: Vec<ClaimedCoupon> = Self::read(&path)?.unwrap_or_default();
        let before = claims.len();
        claims.retain(|claim| !claim.matches_code(code));

        if claims.len() == before {
            return Ok(false);
        }

        Self::write(&path, &claims)?;

        Ok(true)
    }
}
