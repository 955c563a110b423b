//! Auth-session state machine for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One controller exists per application. It is handed to whatever needs the
//! session (views, route guards, the CLI) rather than living in a global.
//! Observers follow changes through [`AuthController::subscribe`].
//!
//! DESIGN
//! ======
//! The user lives inside [`Session::Authenticated`], so "user present iff
//! authenticated" holds by construction. Mutating flows take `&mut self`,
//! which serializes them against a single controller.
//!
//! TRADE-OFFS
//! ==========
//! Login persists the issued token before the follow-up identity fetch. If
//! that fetch fails the token stays on disk with no user in memory; the next
//! `restore_session` validates it and clears it if the service rejects it.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::api::AuthApi;
use crate::error::ApiError;
use crate::route::Destination;
use crate::store::SessionStore;
use crate::types::{Credentials, User};

pub const LOGIN_FAILED_MESSAGE: &str = "An error occurred during login.";
pub const REGISTER_FAILED_MESSAGE: &str = "An error occurred during registration.";

// =============================================================================
// STATE
// =============================================================================

/// Coarse session phase observed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Restoring,
    Authenticated,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Restoring => "restoring",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Session phase together with the hydrated user.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Unauthenticated,
    Restoring,
    Authenticated(User),
}

impl Session {
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self {
            Self::Unauthenticated => SessionState::Unauthenticated,
            Self::Restoring => SessionState::Restoring,
            Self::Authenticated(_) => SessionState::Authenticated,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

// =============================================================================
// FLOW OUTCOME
// =============================================================================

/// Result of a login or registration flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Success { navigate: Destination },
    Failure { message: String },
}

impl FlowOutcome {
    /// User-facing message; empty on success.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { .. } => "",
            Self::Failure { message } => message,
        }
    }

    #[must_use]
    pub fn navigation(&self) -> Option<Destination> {
        match self {
            Self::Success { navigate } => Some(*navigate),
            Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct AuthController {
    store: Arc<dyn SessionStore>,
    api: Arc<dyn AuthApi>,
    current: Session,
    updates: watch::Sender<Session>,
    restored: bool,
}

impl AuthController {
    /// Create the controller. Starts in `Restoring` when the store holds a
    /// token, otherwise `Unauthenticated`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, api: Arc<dyn AuthApi>) -> Self {
        let current = if store.read().is_some() { Session::Restoring } else { Session::Unauthenticated };
        let (updates, _) = watch::channel(current.clone());
        Self { store, api, current, updates, restored: false }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.current.state()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.current.user()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.current
    }

    /// True once `restore_session` has run.
    #[must_use]
    pub fn has_restored(&self) -> bool {
        self.restored
    }

    /// Receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.updates.subscribe()
    }

    /// Re-establish the session from a persisted token.
    ///
    /// Runs once; later calls return the current state without touching the
    /// store or the network. A rejected token, malformed identity payload, or
    /// transport failure clears the store silently.
    pub async fn restore_session(&mut self) -> SessionState {
        if self.restored {
            tracing::debug!("session restoration already ran");
            return self.state();
        }
        self.restored = true;

        let Some(token) = self.store.read() else {
            self.set(Session::Unauthenticated);
            return self.state();
        };

        self.set(Session::Restoring);
        match self.api.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.set(Session::Authenticated(user));
            }
            Err(e) => {
                if e.is_transport() {
                    tracing::warn!(error = %e, "identity check failed; discarding stored token");
                } else {
                    tracing::info!(error = %e, "stored token rejected; discarding");
                }
                self.store.clear();
                self.set(Session::Unauthenticated);
            }
        }
        self.state()
    }

    /// Log in with credentials.
    ///
    /// On success the token is persisted, the user is hydrated via the
    /// identity endpoint and the caller is sent to `/profile`. On failure the
    /// session is left as it was and the message is the server's, or a
    /// generic one for transport errors.
    pub async fn login(&mut self, username: &str, password: &str) -> FlowOutcome {
        let credentials = Credentials { username: username.to_owned(), password: password.to_owned() };

        let grant = match self.api.login(&credentials).await {
            Ok(grant) => grant,
            Err(e) => return failure("login", LOGIN_FAILED_MESSAGE, &e),
        };

        self.store.write(&grant.token);

        let user = match self.api.current_user(&grant.token).await {
            Ok(user) => user,
            Err(e) => return failure("login identity fetch", LOGIN_FAILED_MESSAGE, &e),
        };

        tracing::info!(user_id = %user.id, "logged in");
        self.set(Session::Authenticated(user));
        FlowOutcome::Success { navigate: Destination::Profile }
    }

    /// Register a new account. Never changes the session and never stores a
    /// token; success sends the caller to `/success`.
    pub async fn register(&self, fields: &Map<String, Value>) -> FlowOutcome {
        match self.api.register(fields).await {
            Ok(()) => {
                tracing::info!("registration accepted");
                FlowOutcome::Success { navigate: Destination::Success }
            }
            Err(e) => failure("registration", REGISTER_FAILED_MESSAGE, &e),
        }
    }

    /// Drop the session. Always succeeds and always sends the caller to `/`.
    pub fn logout(&mut self) -> Destination {
        self.store.clear();
        self.set(Session::Unauthenticated);
        Destination::Root
    }

    fn set(&mut self, next: Session) {
        self.updates.send_if_modified(|observed| {
            if *observed == next {
                return false;
            }
            *observed = next.clone();
            true
        });
        self.current = next;
    }
}

/// Normalize a flow error into a user-facing message.
fn failure(flow: &'static str, fallback: &str, err: &ApiError) -> FlowOutcome {
    if err.is_transport() {
        tracing::warn!(flow, error = %err, "request failed");
    } else {
        tracing::info!(flow, error = %err, "request rejected");
    }
    let message = err
        .server_message()
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_owned();
    FlowOutcome::Failure { message }
}
