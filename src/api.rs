//! Remote authentication service client.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthApi` is the seam between the session controller and the network. The
//! controller only sees typed outcomes; status codes, body parsing and
//! transport failures are folded into [`ApiError`] here.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx bodies are parsed leniently: a missing or unparsable `message`
//! still yields `ApiError::Rejected`, just without a server message.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{ClientConfig, Timeouts, normalize_base_url};
use crate::error::ApiError;
use crate::types::{Credentials, ErrorBody, LoginGrant, MeResponse, Token, User};

const LOGIN_PATH: &str = "/login";
const REGISTER_PATH: &str = "/register";
const ME_PATH: &str = "/user/me";

/// Operations the session controller needs from the authentication service.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /login`. Returns the issued token.
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;

    /// `POST /register` with arbitrary registration fields.
    async fn register(&self, fields: &Map<String, Value>) -> Result<(), ApiError>;

    /// `GET /user/me` authorized with `token`.
    async fn current_user(&self, token: &Token) -> Result<User, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client for `base_url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: normalize_base_url(base_url) })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.backend_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        let resp = self
            .http
            .post(self.endpoint(LOGIN_PATH))
            .json(credentials)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = success_body(resp).await?;
        parse_json(&body)
    }

    async fn register(&self, fields: &Map<String, Value>) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.endpoint(REGISTER_PATH))
            .json(fields)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        success_body(resp).await?;
        Ok(())
    }

    async fn current_user(&self, token: &Token) -> Result<User, ApiError> {
        let resp = self
            .http
            .get(self.endpoint(ME_PATH))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = success_body(resp).await?;
        parse_json::<MeResponse>(&body).map(|me| me.user)
    }
}

/// Read the body of a 2xx response, or turn a non-2xx into `Rejected`.
async fn success_body(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(rejection(status.as_u16(), &text));
    }
    Ok(text)
}

fn rejection(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message);
    ApiError::Rejected { status, message }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))
}
