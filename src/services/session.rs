// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle manager.
//!
//! Composes claims decoding, the session store and the refresh coordinator:
//! - `restore` brings back a persisted session at startup
//! - `login` / `register` / `logout` mutate the session
//! - a timer refreshes the access token shortly before it expires
//! - consumers read or subscribe to `{ user, isAuthenticated, loading }`
//!
//! Refresh results are applied only if the session has not changed since
//! the refresh started, so a late response cannot undo a logout or
//! overwrite a newer login.

use std::sync::{Arc, Weak};

use tokio::sync::watch;

use crate::auth::{self, Claims, RouteAccess};
use crate::config::Config;
use crate::error::{DecodeError, Result};
use crate::models::{
    AuthResponse, Credentials, RegisterDetails, Session, SessionUser, SessionView, TokenPair,
};
use crate::services::auth_api::AuthApi;
use crate::services::refresh::{RefreshCoordinator, RefreshOutcome, RefreshState};
use crate::services::store::SessionStore;
use crate::storage::TokenStorage;
use crate::time_utils::{format_unix_rfc3339, Clock, SystemClock};

struct Inner<A> {
    api: A,
    store: SessionStore,
    coordinator: RefreshCoordinator,
    clock: Arc<dyn Clock>,
    unassigned_role: String,
}

/// Handle to the process-wide session. Clones share the same session.
pub struct SessionManager<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for SessionManager<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AuthApi> SessionManager<A> {
    /// Create a manager in the loading state. Call `restore` next.
    pub fn new(api: A, storage: Arc<dyn TokenStorage>, config: &Config) -> Self {
        Self::with_clock(api, storage, config, Arc::new(SystemClock))
    }

    /// Create a manager that reads wall-clock time from `clock`.
    pub fn with_clock(
        api: A,
        storage: Arc<dyn TokenStorage>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store: SessionStore::new(storage, config.storage_key.clone()),
                coordinator: RefreshCoordinator::new(config.refresh_lead, config.refresh_guard),
                clock,
                unassigned_role: config.unassigned_role.clone(),
            }),
        }
    }

    // ─── Consumer view ───────────────────────────────────────────────────────

    pub fn view(&self) -> SessionView {
        self.inner.store.view()
    }

    /// Receiver notified after every session transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.store.subscribe()
    }

    pub fn session(&self) -> Session {
        self.inner.store.get()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner.store.get().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.view().is_authenticated
    }

    /// Route guard decision for the current view.
    pub fn route_access(&self) -> RouteAccess {
        self.view().access(&self.inner.unassigned_role)
    }

    /// Current access token, for API clients.
    pub fn access_token(&self) -> Option<String> {
        self.inner.store.get().tokens.map(|t| t.access_token)
    }

    /// `Authorization` header value, e.g. `Bearer eyJ...`.
    pub fn authorization_header(&self) -> Option<String> {
        self.inner
            .store
            .get()
            .tokens
            .map(|t| format!("{} {}", t.token_type, t.access_token))
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.inner.coordinator.state()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Restore the persisted session at startup.
    ///
    /// `loading` stays true until this resolves: a still-valid token is
    /// accepted as is, an expired one gets exactly one refresh attempt, and
    /// anything unusable leaves the session cleared.
    pub async fn restore(&self) {
        let inner = &self.inner;

        let Some(tokens) = inner.store.load_persisted() else {
            tracing::info!("No persisted session");
            inner.store.set_loading(false);
            return;
        };

        match auth::decode(&tokens.access_token) {
            Err(e) => {
                tracing::warn!(error = %e, "Persisted access token is unreadable, clearing session");
                inner.store.clear();
            }
            Ok(claims) if !claims.is_expired_at(inner.clock.now_ms()) => {
                let user = SessionUser::from_claims(&claims);
                let epoch = inner.store.set(tokens, user);
                inner.arm(epoch, &claims);
                tracing::info!(
                    user_id = %claims.sub,
                    expires_at = %format_unix_rfc3339(claims.exp),
                    "Session restored"
                );
            }
            Ok(claims) => {
                tracing::info!(
                    user_id = %claims.sub,
                    expired_at = %format_unix_rfc3339(claims.exp),
                    "Persisted session expired, refreshing"
                );
                let epoch = inner.store.epoch();
                let _guard = inner.coordinator.begin().await;
                if inner.store.epoch() == epoch {
                    let outcome = inner.refresh_with(epoch, &tokens.refresh_token).await;
                    tracing::info!(outcome = ?outcome, "Startup refresh finished");
                } else {
                    tracing::debug!("Session changed during startup, skipping refresh");
                }
            }
        }

        inner.store.set_loading(false);
    }

    /// Sign in. A failed login leaves any existing session untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionUser> {
        tracing::info!(email = %credentials.email, "Logging in");
        self.inner.store.set_loading(true);

        let result = match self.inner.api.login(credentials).await {
            Ok(response) => self.inner.accept(response),
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                Err(e.into())
            }
        };

        self.inner.store.set_loading(false);
        result
    }

    /// Create an account and sign in with the returned tokens.
    pub async fn register(&self, details: &RegisterDetails) -> Result<SessionUser> {
        tracing::info!(email = %details.email, "Registering account");
        self.inner.store.set_loading(true);

        let result = match self.inner.api.register(details).await {
            Ok(response) => self.inner.accept(response),
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                Err(e.into())
            }
        };

        self.inner.store.set_loading(false);
        result
    }

    /// Sign out locally. Always succeeds; calling it twice is harmless.
    pub fn logout(&self) {
        self.inner.sign_out();
        tracing::info!("Logged out");
    }

    /// Refresh now instead of waiting for the timer.
    ///
    /// If a refresh is already running this waits for it and reports
    /// `Superseded` instead of sending a second request. Failures clear the
    /// session and are reported as `Failed`, never as an error.
    pub async fn refresh(&self) -> RefreshOutcome {
        let inner = &self.inner;
        let epoch = inner.store.epoch();

        let _guard = inner.coordinator.begin().await;
        if inner.store.epoch() != epoch {
            return RefreshOutcome::Superseded;
        }
        let Some(tokens) = inner.store.get().tokens else {
            return RefreshOutcome::NoSession;
        };

        inner.refresh_with(epoch, &tokens.refresh_token).await
    }
}

impl<A: AuthApi> Inner<A> {
    /// Accept tokens from login/register: the newest sign-in always wins.
    fn accept(self: &Arc<Self>, response: AuthResponse) -> Result<SessionUser> {
        let (tokens, user, claims) = match decode_response(response) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(error = %e, "Auth API returned an undecodable token, clearing session");
                self.sign_out();
                return Err(e.into());
            }
        };

        let epoch = self.store.set(tokens, user.clone());
        self.arm(epoch, &claims);
        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            expires_at = %format_unix_rfc3339(claims.exp),
            "Session established"
        );
        Ok(user)
    }

    /// One refresh call; the caller holds the in-flight guard.
    async fn refresh_with(self: &Arc<Self>, epoch: u64, refresh_token: &str) -> RefreshOutcome {
        let response = match self.api.refresh(refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    unauthorized = e.is_unauthorized(),
                    "Token refresh failed, ending session"
                );
                return self.force_logout(epoch);
            }
        };

        let (tokens, user, claims) = match decode_response(response) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(error = %e, "Refreshed token is unreadable, ending session");
                return self.force_logout(epoch);
            }
        };

        match self.store.set_if_current(epoch, tokens, user) {
            Some(new_epoch) => {
                self.arm(new_epoch, &claims);
                tracing::info!(
                    user_id = %claims.sub,
                    expires_at = %format_unix_rfc3339(claims.exp),
                    "Token refreshed"
                );
                RefreshOutcome::Refreshed
            }
            None => {
                tracing::debug!("Session changed during refresh, discarding new tokens");
                RefreshOutcome::Superseded
            }
        }
    }

    /// Timer-triggered refresh for the session at `epoch`.
    ///
    /// The fired timer no longer occupies the slot, so every exit path
    /// leaves the current session with a timer of its own.
    async fn refresh_scheduled(self: &Arc<Self>, epoch: u64) -> RefreshOutcome {
        let _guard = match self.coordinator.try_begin() {
            Some(guard) => guard,
            None => {
                tracing::debug!("Refresh in flight, waiting before scheduled refresh");
                self.coordinator.begin().await
            }
        };
        if self.store.epoch() != epoch {
            self.rearm_current();
            return RefreshOutcome::Superseded;
        }
        let Some(tokens) = self.store.get().tokens else {
            return RefreshOutcome::NoSession;
        };

        self.refresh_with(epoch, &tokens.refresh_token).await
    }

    /// Arm the timer for whatever session is current, replacing a timer
    /// that was set up for an older one.
    fn rearm_current(self: &Arc<Self>) {
        let (session, epoch) = self.store.current();
        let Some(tokens) = session.tokens else {
            return;
        };
        match auth::decode(&tokens.access_token) {
            Ok(claims) => {
                tracing::debug!(epoch, "Re-arming refresh timer for current session");
                self.arm(epoch, &claims);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Current access token is unreadable, ending session");
                self.force_logout(epoch);
            }
        }
    }

    /// Clear the session unless something newer replaced it meanwhile.
    fn force_logout(&self, epoch: u64) -> RefreshOutcome {
        if self.store.clear_if_current(epoch) {
            self.coordinator.cancel();
            tracing::info!("Session ended after failed refresh");
            RefreshOutcome::Failed
        } else {
            RefreshOutcome::Superseded
        }
    }

    fn sign_out(&self) {
        self.coordinator.cancel();
        self.store.clear();
        self.store.set_loading(false);
    }

    /// (Re)arm the refresh timer for the session established at `epoch`.
    fn arm(self: &Arc<Self>, epoch: u64, claims: &Claims) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.coordinator
            .schedule(claims.expires_at_ms(), Arc::clone(&self.clock), move || async move {
                if let Some(inner) = weak.upgrade() {
                    let outcome = inner.refresh_scheduled(epoch).await;
                    tracing::debug!(outcome = ?outcome, "Scheduled refresh finished");
                }
            });
    }
}

/// Decode the access token of an auth response and derive the user.
///
/// Claims are authoritative; the API's own user record only contributes
/// the account's active flag when it describes the same subject.
fn decode_response(
    response: AuthResponse,
) -> std::result::Result<(TokenPair, SessionUser, Claims), DecodeError> {
    let claims = auth::decode(&response.tokens.access_token)?;
    let mut user = SessionUser::from_claims(&claims);
    if let Some(api_user) = response.user.filter(|u| u.id == user.id) {
        user.is_active = api_user.is_active;
    }
    Ok((response.tokens, user, claims))
}
