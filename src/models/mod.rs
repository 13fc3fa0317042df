// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the session lifecycle.

pub mod session;
pub mod tokens;
pub mod user;

pub use session::{Session, SessionView};
pub use tokens::{AuthResponse, Credentials, RegisterDetails, TokenPair};
pub use user::SessionUser;
