//! Navigation destinations requested by session flows.

use std::fmt;

/// Where the caller should navigate after a flow completes.
///
/// Flows never drive a router themselves; they hand one of these back and the
/// presentation layer decides how to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// `/`, after logout.
    Root,
    /// `/profile`, after login.
    Profile,
    /// `/success`, after registration.
    Success,
}

impl Destination {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Profile => "/profile",
            Self::Success => "/success",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
