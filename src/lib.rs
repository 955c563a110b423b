//! Client-side authentication session manager.
//!
//! ARCHITECTURE
//! ============
//! - [`store`]: durable token slot (`SessionStore`), in memory or on disk.
//! - [`api`]: the remote authentication service contract (`AuthApi`) and its
//!   `reqwest` implementation.
//! - [`controller`]: the session state machine driving restoration, login,
//!   registration and logout.
//!
//! Typical startup:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use authsession::{AuthController, ClientConfig, FileStore, HttpAuthApi};
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileStore::new(&config.token_file));
//! let api = Arc::new(HttpAuthApi::from_config(&config)?);
//! let mut session = AuthController::new(store, api);
//! session.restore_session().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod route;
pub mod store;
pub mod types;

pub use api::{AuthApi, HttpAuthApi};
pub use config::ClientConfig;
pub use controller::{AuthController, FlowOutcome, Session, SessionState};
pub use error::{ApiError, ConfigError};
pub use route::Destination;
pub use store::{FileStore, MemoryStore, SessionStore};
pub use types::{Credentials, Token, User, UserId};
