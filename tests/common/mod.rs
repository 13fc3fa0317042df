// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use inventory_session::config::Config;
use inventory_session::error::AuthCallError;
use inventory_session::models::{AuthResponse, Credentials, RegisterDetails, SessionUser, TokenPair};
use inventory_session::storage::{MemoryStorage, TokenStorage, TOKENS_KEY};
use inventory_session::time_utils::Clock;
use inventory_session::SessionManager;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wall-clock start used by every test clock (2027-01-15, whole second).
#[allow(dead_code)]
pub const BASE_MS: i64 = 1_800_000_000_000;

/// Wall clock that advances with tokio's (paused) clock.
#[allow(dead_code)]
pub struct PausedClock {
    start: tokio::time::Instant,
}

#[allow(dead_code)]
impl PausedClock {
    /// Must be created inside the runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: tokio::time::Instant::now(),
        })
    }

    pub fn now_secs(&self) -> i64 {
        self.now_ms() / 1000
    }
}

impl Clock for PausedClock {
    fn now_ms(&self) -> i64 {
        BASE_MS + self.start.elapsed().as_millis() as i64
    }
}

/// Create an access token the way the inventory API signs them.
pub fn mint_access_token(sub: &str, role: &str, exp: i64) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "email": format!("user{sub}@example.com"),
        "role": role,
        "fullName": "Pat Doe",
        "phoneNumber": "+15550100",
        "iat": exp - 3600,
        "exp": exp,
    });

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"api_signing_key_the_client_never_sees"),
    )
    .expect("Failed to create JWT")
}

#[allow(dead_code)]
pub fn token_pair(access_token: String, refresh_token: &str, expires_in: u64) -> TokenPair {
    TokenPair {
        access_token,
        refresh_token: refresh_token.to_string(),
        expires_in,
        token_type: "Bearer".to_string(),
    }
}

/// Seed storage with a session as a previous process would have left it.
#[allow(dead_code)]
pub fn persist(storage: &MemoryStorage, tokens: &TokenPair) {
    storage
        .write(TOKENS_KEY, &serde_json::to_string(tokens).unwrap())
        .unwrap();
}

#[allow(dead_code)]
pub fn read_persisted(storage: &MemoryStorage) -> Option<TokenPair> {
    storage
        .read(TOKENS_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

#[allow(dead_code)]
#[derive(Default)]
struct FakeState {
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_call_times_ms: Mutex<Vec<i64>>,
    refresh_tokens_seen: Mutex<Vec<String>>,
    login_failure: Mutex<Option<StatusCode>>,
    refresh_failure: Mutex<Option<StatusCode>>,
    refresh_delay: Mutex<Duration>,
    login_delay: Mutex<Duration>,
    role: Mutex<Option<String>>,
    lifetime_secs: Mutex<Option<i64>>,
}

/// In-process auth API. Clones share counters and behavior.
#[allow(dead_code)]
#[derive(Clone)]
pub struct FakeAuthApi {
    clock: Arc<dyn Clock>,
    state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeAuthApi {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Arc::new(FakeState::default()),
        }
    }

    pub fn fail_login_with(&self, status: StatusCode) {
        *self.state.login_failure.lock().unwrap() = Some(status);
    }

    pub fn fail_refresh_with(&self, status: StatusCode) {
        *self.state.refresh_failure.lock().unwrap() = Some(status);
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    pub fn set_login_delay(&self, delay: Duration) {
        *self.state.login_delay.lock().unwrap() = delay;
    }

    pub fn set_role(&self, role: &str) {
        *self.state.role.lock().unwrap() = Some(role.to_string());
    }

    /// Lifetime of issued access tokens (default one hour).
    pub fn set_token_lifetime(&self, secs: i64) {
        *self.state.lifetime_secs.lock().unwrap() = Some(secs);
    }

    pub fn login_calls(&self) -> usize {
        self.state.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_call_times_ms(&self) -> Vec<i64> {
        self.state.refresh_call_times_ms.lock().unwrap().clone()
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.state.refresh_tokens_seen.lock().unwrap().clone()
    }

    fn issue(&self, sub: &str, refresh_token: String) -> AuthResponse {
        let lifetime = self.state.lifetime_secs.lock().unwrap().unwrap_or(3600);
        let role = self
            .state
            .role
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "Clerk".to_string());
        let exp = self.clock.now_ms() / 1000 + lifetime;
        let access_token = mint_access_token(sub, &role, exp);

        AuthResponse {
            tokens: token_pair(access_token, &refresh_token, lifetime as u64),
            user: Some(SessionUser {
                id: sub.to_string(),
                email: format!("user{sub}@example.com"),
                full_name: Some("Pat Doe".to_string()),
                role,
                phone_number: Some("+15550100".to_string()),
                is_active: true,
            }),
        }
    }

    fn rejected(status: StatusCode) -> AuthCallError {
        AuthCallError::Status {
            status,
            body: "rejected".to_string(),
        }
    }
}

#[async_trait]
impl inventory_session::AuthApi for FakeAuthApi {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, AuthCallError> {
        let n = self.state.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.state.login_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.state.login_failure.lock().unwrap() {
            return Err(Self::rejected(status));
        }
        Ok(self.issue("7", format!("login-refresh-{n}")))
    }

    async fn register(&self, _details: &RegisterDetails) -> Result<AuthResponse, AuthCallError> {
        Ok(self.issue("8", "register-refresh".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthCallError> {
        let n = self.state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .refresh_call_times_ms
            .lock()
            .unwrap()
            .push(self.clock.now_ms());
        self.state
            .refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_string());

        let delay = *self.state.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.state.refresh_failure.lock().unwrap() {
            return Err(Self::rejected(status));
        }
        Ok(self.issue("7", format!("refreshed-{n}")))
    }
}

/// Manager over a fake API and shared in-memory storage.
#[allow(dead_code)]
pub fn create_test_manager(
    clock: Arc<PausedClock>,
    storage: &MemoryStorage,
) -> (SessionManager<FakeAuthApi>, FakeAuthApi) {
    let api = FakeAuthApi::new(clock.clone());
    let manager = SessionManager::with_clock(
        api.clone(),
        Arc::new(storage.clone()),
        &Config::default(),
        clock,
    );
    (manager, api)
}
