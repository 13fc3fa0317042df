// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Inventory session: authenticated session lifecycle for the inventory
//! management front end.
//!
//! This crate holds the signed-in session, decodes access-token claims,
//! persists the session across restarts and refreshes the access token
//! shortly before it expires.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod time_utils;

pub use auth::RouteAccess;
pub use config::Config;
pub use error::SessionError;
pub use models::{Credentials, RegisterDetails, SessionUser, SessionView, TokenPair};
pub use services::{AuthApi, HttpAuthApi, RefreshOutcome, RefreshState, SessionManager};
