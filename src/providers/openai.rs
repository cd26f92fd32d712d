use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{normalize_line_endings, truncate_text, Backend, TRANSLATION_INSTRUCTION};
use crate::app_config::OpenAIConfig;
use crate::errors::ProviderError;

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model to use
    model: String,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message; null for some tool-call replies
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Completion choices
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the translation request for a piece of text
    pub fn translation(model: impl Into<String>, text: &str) -> Self {
        Self::new(model)
            .add_message(
                "system",
                format!("You are a professional translator. {}.", TRANSLATION_INSTRUCTION),
            )
            .add_message("user", text)
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!(
            "Failed to build OpenAI HTTP client with a {}s timeout, requests will not time out: {}",
            timeout.as_secs(),
            e
        );
        Client::new()
    })
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: http_client(Duration::from_secs(timeout_secs)),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &OpenAIConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout_secs,
        )
    }

    /// Full URL of the chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Send a chat completion request
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport("Failed to send request to OpenAI API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("OpenAI response: {}", e)))
    }

    /// Extract the translated text from a response
    pub fn extract_text(response: OpenAIResponse) -> Result<String, ProviderError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| normalize_line_endings(&content))
            .ok_or_else(|| ProviderError::MissingField("choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let request = OpenAIRequest::translation(&self.model, text);
        let response = self.complete(&request).await?;
        let translated = Self::extract_text(response)?;
        debug!("OpenAI translated text: {}", truncate_text(&translated, 80));
        Ok(translated)
    }
}
