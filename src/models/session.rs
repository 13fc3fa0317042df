// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregate and the read-only view published to consumers.

use serde::Serialize;

use super::{SessionUser, TokenPair};

/// In-memory session aggregate.
///
/// `tokens` and `user` are always both set or both empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub tokens: Option<TokenPair>,
    pub user: Option<SessionUser>,
    /// True while startup restore or a login/register is in progress
    pub loading: bool,
}

impl Session {
    /// Fresh session at process start, before restore completes.
    pub fn starting() -> Self {
        Self {
            tokens: None,
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Consumer-facing projection.
    pub fn view(&self) -> SessionView {
        SessionView {
            user: self.user.clone(),
            is_authenticated: self.is_authenticated(),
            loading: self.loading,
        }
    }
}

/// What consumers (route guards, UI) observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub loading: bool,
}
