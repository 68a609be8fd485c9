//! # State List
//!
//! Typed, namespaced store over the world state. Each entry lives under the
//! composite key `(namespace, key parts...)`.

use crate::domain::entities::{make_key, LedgerState};
use crate::domain::value_objects::CompositeKey;
use crate::errors::ContractError;
use crate::ports::outbound::WorldState;
use std::marker::PhantomData;
use tracing::debug;

/// Store of `T` values under one namespace.
pub struct StateList<'a, T> {
    stub: &'a dyn WorldState,
    namespace: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: LedgerState> StateList<'a, T> {
    /// Bind a list to a stub and namespace.
    pub fn new(stub: &'a dyn WorldState, namespace: &'static str) -> Self {
        Self {
            stub,
            namespace,
            _marker: PhantomData,
        }
    }

    /// Namespace the list writes under.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Composite key for the given parts.
    ///
    /// # Errors
    ///
    /// `InvalidKey` if a part contains a reserved code point.
    pub fn ledger_key(&self, parts: &[&str]) -> Result<CompositeKey, ContractError> {
        CompositeKey::new(self.namespace, parts)
    }

    /// Store a new entry.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if an entry already exists under the same key.
    pub async fn add(&self, state: &T) -> Result<(), ContractError> {
        let parts = state.key_parts();
        let key = self.ledger_key(&parts)?;
        if self.read(&key).await?.is_some() {
            return Err(ContractError::DuplicateKey {
                key: make_key(&parts),
            });
        }
        debug!(key = %key, class = T::CLASS, "adding state");
        self.stub.put_state(key.as_str(), state.to_bytes()?).await?;
        Ok(())
    }

    /// Load an entry.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is stored under the key, `UnknownClass` if the
    /// stored value belongs to another type.
    pub async fn get(&self, parts: &[&str]) -> Result<T, ContractError> {
        let key = self.ledger_key(parts)?;
        match self.read(&key).await? {
            Some(bytes) => T::from_bytes(&bytes),
            None => Err(ContractError::NotFound {
                key: make_key(parts),
            }),
        }
    }

    /// Overwrite the entry under the value's key, whether or not it exists.
    ///
    /// # Errors
    ///
    /// World-state or serialization failures.
    pub async fn update(&self, state: &T) -> Result<(), ContractError> {
        let key = self.ledger_key(&state.key_parts())?;
        debug!(key = %key, class = T::CLASS, "updating state");
        self.stub.put_state(key.as_str(), state.to_bytes()?).await?;
        Ok(())
    }

    async fn read(&self, key: &CompositeKey) -> Result<Option<Vec<u8>>, ContractError> {
        // an empty value reads as absent
        Ok(self
            .stub
            .get_state(key.as_str())
            .await?
            .filter(|bytes| !bytes.is_empty()))
    }
}
