// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token claims and route access.

pub mod claims;
pub mod guard;

pub use claims::{decode, Claims};
pub use guard::RouteAccess;
