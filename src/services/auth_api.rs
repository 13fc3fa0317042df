// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth API client: login, register and token refresh.
//!
//! The session core only needs success/failure from these calls; status
//! codes are kept in the error for logging and 401 classification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;
use crate::error::AuthCallError;
use crate::models::tokens::RefreshRequest;
use crate::models::{AuthResponse, Credentials, RegisterDetails};

/// Authentication calls the session depends on.
#[async_trait]
pub trait AuthApi: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthCallError>;

    async fn register(&self, details: &RegisterDetails) -> Result<AuthResponse, AuthCallError>;

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthCallError>;
}

#[async_trait]
impl<T: AuthApi + ?Sized> AuthApi for Arc<T> {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthCallError> {
        (**self).login(credentials).await
    }

    async fn register(&self, details: &RegisterDetails) -> Result<AuthResponse, AuthCallError> {
        (**self).register(details).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthCallError> {
        (**self).refresh(refresh_token).await
    }
}

/// HTTP implementation against the inventory API.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Client for the given API base URL.
    ///
    /// Every call is bounded by `timeout`, so a hung request cannot hold the
    /// in-flight refresh guard indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthCallError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client honoring the configured base URL and timeout.
    pub fn from_config(config: &Config) -> Result<Self, AuthCallError> {
        Self::new(config.api_base_url.as_str(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and parse the JSON response.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AuthCallError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthCallError::Transport(format!("{}: {}", path, e)))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AuthCallError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 {
                tracing::info!("Auth API rejected credentials (401)");
            } else {
                tracing::warn!(status = %status, "Auth API call failed");
            }
            return Err(AuthCallError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| AuthCallError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthCallError> {
        self.post_json("/auth/login", credentials).await
    }

    async fn register(&self, details: &RegisterDetails) -> Result<AuthResponse, AuthCallError> {
        self.post_json("/auth/register", details).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthCallError> {
        self.post_json("/auth/refresh", &RefreshRequest { refresh_token })
            .await
    }
}
