// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session lifecycle logic.

pub mod auth_api;
pub mod refresh;
pub mod session;
pub mod store;

pub use auth_api::{AuthApi, HttpAuthApi};
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshState};
pub use session::SessionManager;
pub use store::SessionStore;
