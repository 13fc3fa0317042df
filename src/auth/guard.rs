//! Route access decision for guards in front of protected views.

use crate::models::SessionView;

/// What a route guard should do for the current session view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Startup restore or sign-in still running: show a loading indicator
    Loading,
    /// Redirect to the sign-in entry point
    Unauthenticated,
    /// Signed in, but the account has no role assigned yet
    Unassigned,
    Authorized,
}

impl SessionView {
    /// Decide route access; `unassigned_role` is matched case-insensitively.
    pub fn access(&self, unassigned_role: &str) -> RouteAccess {
        if self.loading {
            return RouteAccess::Loading;
        }
        match &self.user {
            None => RouteAccess::Unauthenticated,
            Some(user) if user.role.trim().eq_ignore_ascii_case(unassigned_role) => {
                RouteAccess::Unassigned
            }
            Some(_) => RouteAccess::Authorized,
        }
    }
}
