//! In-memory credential storage.
//!
//! Each credential kind lives in its own sharded concurrent map keyed by the
//! credential id. Removal from a `DashMap` is atomic per key, which is what
//! makes `take` safe for one-time credentials: of any number of concurrent
//! callers, exactly one receives the record.
//!
//! Expiry is evaluated lazily against [`Instant::now`] whenever a record is
//! read. Expired records may linger until [`CredentialStore::purge_expired`]
//! runs.

use crate::oauth2::credentials::{AccessToken, AuthorizationCode, CredentialKind, RefreshToken};
use base64::Engine;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("credential not found")]
    NotFound,
    /// The record exists but its lifetime has elapsed. Callers that only
    /// care about presence treat this the same as `NotFound`.
    #[error("credential expired")]
    Expired,
    #[error("a live credential with this id already exists")]
    DuplicateId,
}

#[derive(Debug, Clone)]
pub struct StoredCredential<T> {
    record: T,
    expires_at: Instant,
}

impl<T> StoredCredential<T> {
    pub fn new(record: T, ttl: Duration) -> Self {
        Self {
            record,
            expires_at: Instant::now() + ttl,
        }
    }

    /// A credential is usable only while `expires_at` is strictly in the future.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

/// Routes a record type to its table inside [`CredentialStore`].
pub trait Credential: Clone + Send + Sync + 'static {
    const KIND: CredentialKind;

    fn table(store: &CredentialStore) -> &DashMap<String, StoredCredential<Self>>;
}

impl Credential for AuthorizationCode {
    const KIND: CredentialKind = CredentialKind::AuthorizationCode;

    fn table(store: &CredentialStore) -> &DashMap<String, StoredCredential<Self>> {
        &store.codes
    }
}

impl Credential for AccessToken {
    const KIND: CredentialKind = CredentialKind::AccessToken;

    fn table(store: &CredentialStore) -> &DashMap<String, StoredCredential<Self>> {
        &store.access_tokens
    }
}

impl Credential for RefreshToken {
    const KIND: CredentialKind = CredentialKind::RefreshToken;

    fn table(store: &CredentialStore) -> &DashMap<String, StoredCredential<Self>> {
        &store.refresh_tokens
    }
}

/// Shared handle to every live credential. Cloning is cheap and all clones
/// observe the same tables.
#[derive(Clone, Default)]
pub struct CredentialStore {
    codes: Arc<DashMap<String, StoredCredential<AuthorizationCode>>>,
    access_tokens: Arc<DashMap<String, StoredCredential<AccessToken>>>,
    refresh_tokens: Arc<DashMap<String, StoredCredential<RefreshToken>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a secure random credential id
    pub fn generate_id() -> String {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes).expect("Failed to generate random bytes");
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Stores `record` under `id`.
    ///
    /// An expired record occupying the slot is replaced; a live one is not.
    pub fn put<C: Credential>(
        &self,
        id: impl Into<String>,
        record: C,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        match C::table(self).entry(id.into()) {
            Entry::Occupied(mut slot) => {
                if !slot.get().is_expired() {
                    return Err(StoreError::DuplicateId);
                }
                slot.insert(StoredCredential::new(record, ttl));
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredCredential::new(record, ttl));
            }
        }
        Ok(())
    }

    /// Stores `record` under a freshly minted id and returns the id.
    pub fn issue<C: Credential>(&self, record: C, ttl: Duration) -> String {
        loop {
            if let Entry::Vacant(slot) = C::table(self).entry(Self::generate_id()) {
                let id = slot.key().clone();
                slot.insert(StoredCredential::new(record, ttl));
                tracing::debug!(kind = %C::KIND, "issued credential");
                return id;
            }
        }
    }

    /// Removes the entry under `id` and hands it back with its expiry intact,
    /// leaving the expiry decision to the caller.
    pub fn take_entry<C: Credential>(&self, id: &str) -> Option<StoredCredential<C>> {
        C::table(self).remove(id).map(|(_, stored)| stored)
    }

    /// Removes and returns the record under `id`.
    ///
    /// The entry is gone after this call whatever the outcome, including when
    /// the record turns out to be expired.
    pub fn take<C: Credential>(&self, id: &str) -> Result<C, StoreError> {
        let stored = self.take_entry::<C>(id).ok_or(StoreError::NotFound)?;
        if stored.is_expired() {
            tracing::debug!(kind = %C::KIND, "consumed expired credential");
            return Err(StoreError::Expired);
        }
        Ok(stored.record)
    }

    /// Returns a copy of the record under `id` without removing it.
    pub fn peek<C: Credential>(&self, id: &str) -> Result<C, StoreError> {
        let stored = C::table(self).get(id).ok_or(StoreError::NotFound)?;
        if stored.is_expired() {
            return Err(StoreError::Expired);
        }
        Ok(stored.record.clone())
    }

    pub fn is_expired<C>(record: &StoredCredential<C>) -> bool {
        record.is_expired()
    }

    /// Drops every expired record and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        fn purge<T>(table: &DashMap<String, StoredCredential<T>>) -> usize {
            let before = table.len();
            table.retain(|_, entry| !entry.is_expired());
            before.saturating_sub(table.len())
        }

        purge(&self.codes) + purge(&self.access_tokens) + purge(&self.refresh_tokens)
    }

    /// Number of stored records of kind `C`, expired ones included.
    pub fn count<C: Credential>(&self) -> usize {
        C::table(self).len()
    }

    pub fn len(&self) -> usize {
        self.codes.len() + self.access_tokens.len() + self.refresh_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.codes.clear();
        self.access_tokens.clear();
        self.refresh_tokens.clear();
    }
}
