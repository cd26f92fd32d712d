/*!
 * Baidu ERNIE backend.
 *
 * Authentication is a client-credentials token exchange. The token is held
 * with its expiry, fetched lazily, refreshed when it runs out and shared by
 * every concurrent call through a single-flight lock.
 */

use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use super::{normalize_line_endings, truncate_text, Backend, TRANSLATION_INSTRUCTION};
use crate::app_config::ErnieConfig;
use crate::errors::ProviderError;

/// Tokens are treated as expired this long before the server says so
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// API error codes meaning the access token is invalid or expired
const INVALID_TOKEN_CODES: [i64; 2] = [110, 111];

/// OAuth access token with its local expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    /// `None` when the server did not report a lifetime
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// Create a token that expires `expires_in` seconds from now
    pub fn new(value: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            value: value.into(),
            expires_at: expires_in.map(|secs| {
                Instant::now() + Duration::from_secs(secs).saturating_sub(TOKEN_REFRESH_MARGIN)
            }),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the token can still be used
    pub fn is_valid(&self) -> bool {
        self.expires_at.is_none_or(|expires_at| Instant::now() < expires_at)
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// ERNIE chat message
#[derive(Debug, Serialize)]
pub struct ErnieMessage {
    pub role: String,
    pub content: String,
}

/// ERNIE chat completion request
#[derive(Debug, Serialize)]
pub struct ErnieRequest {
    messages: Vec<ErnieMessage>,
    temperature: f32,
    max_tokens: u32,
    penalty_score: f32,
    enable_system_memory: bool,
    disable_search: bool,
    enable_citation: bool,
    enable_trace: bool,
}

impl ErnieRequest {
    /// Build the translation request for a piece of text
    pub fn translation(text: &str) -> Self {
        Self {
            messages: vec![ErnieMessage {
                role: "user".to_string(),
                content: format!("{}:\n\n{}", TRANSLATION_INSTRUCTION, text),
            }],
            temperature: 0.7,
            max_tokens: 2000,
            penalty_score: 1.0,
            enable_system_memory: false,
            disable_search: true,
            enable_citation: false,
            enable_trace: false,
        }
    }
}

/// ERNIE chat completion response
#[derive(Debug, Deserialize)]
pub struct ErnieResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// ERNIE client
pub struct Ernie {
    api_key: String,
    secret_key: String,
    api_url: String,
    token_url: String,
    timeout: Duration,
    /// Open HTTP session, present between `initialize` and `close`
    session: RwLock<Option<Client>>,
    /// Cached access token
    token: Mutex<Option<AccessToken>>,
    /// Number of token exchanges performed
    token_requests: AtomicUsize,
}

impl std::fmt::Debug for Ernie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ernie")
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("session_open", &self.session.read().is_some())
            .finish_non_exhaustive()
    }
}

impl Ernie {
    /// Create a new ERNIE client; call `initialize` before translating
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        api_url: impl Into<String>,
        token_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            api_url: api_url.into(),
            token_url: token_url.into(),
            timeout: Duration::from_secs(timeout_secs),
            session: RwLock::new(None),
            token: Mutex::new(None),
            token_requests: AtomicUsize::new(0),
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &ErnieConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.secret_key.clone(),
            config.api_url.clone(),
            config.token_url.clone(),
            config.timeout_secs,
        )
    }

    /// Number of token exchanges performed so far
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    /// Whether the HTTP session is open
    pub fn is_initialized(&self) -> bool {
        self.session.read().is_some()
    }

    fn session(&self) -> Result<Client, ProviderError> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| ProviderError::ConnectionError("ERNIE session is not initialized".to_string()))
    }

    /// Return a valid access token, exchanging credentials when needed
    pub async fn access_token(&self, client: &Client) -> Result<String, ProviderError> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref().filter(|t| t.is_valid()) {
            return Ok(current.value().to_string());
        }

        if token.is_some() {
            debug!("ERNIE access token expired, refreshing");
        }

        let fresh = self.fetch_access_token(client).await?;
        let value = fresh.value().to_string();
        *token = Some(fresh);
        Ok(value)
    }

    /// Forget the cached token so the next call exchanges credentials again
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Forget the cached token only if it is still the one that was rejected.
    ///
    /// Returns whether the token was dropped. A sibling call may already have
    /// replaced it with a fresh token, which must survive a late rejection.
    pub async fn invalidate_token_if(&self, rejected: &str) -> bool {
        let mut token = self.token.lock().await;
        if token.as_ref().map(AccessToken::value) == Some(rejected) {
            *token = None;
            true
        } else {
            false
        }
    }

    async fn fetch_access_token(&self, client: &Client) -> Result<AccessToken, ProviderError> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);

        let response = client
            .post(&self.token_url)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("HTTP error while getting access token: {}", e);
                ProviderError::from_transport("Failed to get access token", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationError(format!(
                "Failed to get access token ({}): {}",
                status, error_text
            )));
        }

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Token response: {}", e)))?;

        Self::parse_token_response(body)
    }

    /// Turn a token endpoint response into a token
    pub fn parse_token_response(body: TokenResponse) -> Result<AccessToken, ProviderError> {
        match body.access_token.filter(|t| !t.is_empty()) {
            Some(value) => Ok(AccessToken::new(value, body.expires_in)),
            None => match body.error {
                Some(error) => Err(ProviderError::AuthenticationError(format!(
                    "{}: {}",
                    error,
                    body.error_description.unwrap_or_default()
                ))),
                None => Err(ProviderError::MissingField("access_token".to_string())),
            },
        }
    }

    /// Chat endpoint URL with the token appended as a query parameter
    pub fn translation_url(&self, access_token: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid ERNIE API URL: {}", e)))?;
        url.query_pairs_mut().append_pair("access_token", access_token);
        Ok(url)
    }

    /// Extract the translated text from a chat response
    pub fn parse_response(body: ErnieResponse) -> Result<String, ProviderError> {
        if let Some(code) = body.error_code {
            let message = format!("ERNIE error {}: {}", code, body.error_msg.unwrap_or_default());
            return Err(if INVALID_TOKEN_CODES.contains(&code) {
                ProviderError::AuthenticationError(message)
            } else {
                ProviderError::ApiError {
                    status_code: 200,
                    message,
                }
            });
        }

        match body.result.filter(|r| !r.is_empty()) {
            Some(result) => Ok(normalize_line_endings(&result)),
            None => Err(ProviderError::MissingField("result".to_string())),
        }
    }
}

#[async_trait]
impl Backend for Ernie {
    fn name(&self) -> &str {
        "ernie"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let client = self.session()?;
        let access_token = self.access_token(&client).await?;
        let url = self.translation_url(&access_token)?;

        let response = client
            .post(url)
            .json(&ErnieRequest::translation(text))
            .send()
            .await
            .map_err(|e| {
                error!("HTTP error during ERNIE translation: {}", e);
                ProviderError::from_transport("Failed to send request to ERNIE API", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("ERNIE API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .json::<ErnieResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("ERNIE response: {}", e)))?;

        if body.error_code.is_some_and(|code| INVALID_TOKEN_CODES.contains(&code)) {
            if self.invalidate_token_if(&access_token).await {
                warn!("ERNIE rejected the access token, it will be refreshed on the next call");
            } else {
                debug!("ERNIE rejected a superseded access token, keeping the current one");
            }
        }

        let translated = Self::parse_response(body)?;
        debug!("ERNIE translated text: {}", truncate_text(&translated, 80));
        Ok(translated)
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;
        *self.session.write() = Some(client);
        info!("ERNIE session initialized");
        Ok(())
    }

    async fn close(&self) {
        let closed = self.session.write().take().is_some();
        self.invalidate_token().await;
        if closed {
            info!("ERNIE session closed");
        }
    }
}
