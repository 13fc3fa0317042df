// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: the single owner of the session aggregate and its
//! persisted token record.
//!
//! Every `set`/`clear` advances an epoch. Async work that started against
//! one epoch (a refresh call) uses the `*_if_current` variants so a stale
//! result never overwrites a newer login or resurrects a logged-out session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::PersistenceError;
use crate::models::{Session, SessionUser, SessionView, TokenPair};
use crate::storage::TokenStorage;

struct StoreState {
    session: Session,
    epoch: u64,
}

/// Holder of the current session.
pub struct SessionStore {
    state: Mutex<StoreState>,
    storage: Arc<dyn TokenStorage>,
    key: String,
    updates: watch::Sender<SessionView>,
}

impl SessionStore {
    /// Empty store in the loading state.
    pub fn new(storage: Arc<dyn TokenStorage>, key: impl Into<String>) -> Self {
        let session = Session::starting();
        let (updates, _) = watch::channel(session.view());
        Self {
            state: Mutex::new(StoreState { session, epoch: 0 }),
            storage,
            key: key.into(),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current in-memory session.
    pub fn get(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn view(&self) -> SessionView {
        self.updates.borrow().clone()
    }

    /// Receiver that observes every published view change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.updates.subscribe()
    }

    /// Epoch of the last `set`/`clear`.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Session together with the epoch it belongs to.
    pub fn current(&self) -> (Session, u64) {
        let state = self.lock();
        (state.session.clone(), state.epoch)
    }

    /// Replace tokens and user together and persist the tokens.
    ///
    /// Returns the new epoch.
    pub fn set(&self, tokens: TokenPair, user: SessionUser) -> u64 {
        let mut state = self.lock();
        self.apply_set(&mut state, tokens, user)
    }

    /// `set`, but only if nothing else mutated the session since `epoch`.
    pub fn set_if_current(&self, epoch: u64, tokens: TokenPair, user: SessionUser) -> Option<u64> {
        let mut state = self.lock();
        if state.epoch != epoch {
            return None;
        }
        Some(self.apply_set(&mut state, tokens, user))
    }

    /// Drop tokens and user together and remove the persisted record.
    pub fn clear(&self) -> u64 {
        let mut state = self.lock();
        self.apply_clear(&mut state)
    }

    /// `clear`, but only if nothing else mutated the session since `epoch`.
    pub fn clear_if_current(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        self.apply_clear(&mut state);
        true
    }

    pub fn set_loading(&self, loading: bool) {
        let mut state = self.lock();
        state.session.loading = loading;
        self.publish(&state);
    }

    /// Read the persisted token pair, if any. No side effects.
    pub fn load_persisted(&self) -> Option<TokenPair> {
        let raw = match self.storage.read(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Ignoring corrupt persisted session");
                None
            }
        }
    }

    fn apply_set(&self, state: &mut StoreState, tokens: TokenPair, user: SessionUser) -> u64 {
        self.persist(&tokens);
        state.session.tokens = Some(tokens);
        state.session.user = Some(user);
        state.epoch += 1;
        self.publish(state);
        state.epoch
    }

    fn apply_clear(&self, state: &mut StoreState) -> u64 {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, key = %self.key, "Failed to remove persisted session");
        }
        state.session.tokens = None;
        state.session.user = None;
        state.epoch += 1;
        self.publish(state);
        state.epoch
    }

    // Persistence is best-effort: the in-memory session stays authoritative.
    fn persist(&self, tokens: &TokenPair) {
        let result = serde_json::to_string(tokens)
            .map_err(PersistenceError::from)
            .and_then(|raw| self.storage.write(&self.key, &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, key = %self.key, "Failed to persist session, continuing in memory");
        }
    }

    fn publish(&self, state: &StoreState) {
        let view = state.session.view();
        self.updates.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}
