/// Blocking client for the Ollama text generation endpoint.
///
/// This module provides `OllamaClient`, its builder, the `TextGenerator` seam
/// used by the resolver, and the retry policy applied to transient failures.
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when talking to the Ollama API.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Connection failures, DNS resolution and other transport errors.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the client timeout.
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The response body was not the expected JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The API answered but reported a problem.
    #[error("Ollama API error: {message}")]
    Api { message: String },

    /// The configured base URL does not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl OllamaError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }

    /// Returns true for failures worth retrying: transport errors, timeouts
    /// and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status } => (500..600).contains(status),
            Self::Serialization(_) | Self::Api { .. } | Self::InvalidUrl(_) => false,
        }
    }
}

/// Anything that turns a prompt into generated text.
///
/// The resolver only depends on this trait, so tests can substitute a canned
/// responder for the HTTP client.
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for `prompt` with the named model.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError>;
}

/// How often, and after which pauses, a transient failure is retried.
///
/// The default waits 1 s, 2 s and 4 s, giving four attempts in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_delays(vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ])
    }
}

impl RetryPolicy {
    /// A policy that retries once per entry in `delays`, sleeping that long first.
    pub fn with_delays(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::with_delays(Vec::new())
    }

    /// Maximum number of attempts, the first one included.
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    /// Runs `operation`, retrying transient errors according to the policy.
    ///
    /// Returns the first success, the first non-transient error, or the last
    /// error once all retries are used up.
    pub fn run<F, T>(&self, mut operation: F) -> Result<T, OllamaError>
    where
        F: FnMut() -> Result<T, OllamaError>,
    {
        let mut last_error = match operation() {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => e,
        };

        for (attempt, delay) in self.delays.iter().enumerate() {
            warn!(error = %last_error, retry = attempt + 1, ?delay, "retrying model request");
            thread::sleep(*delay);
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use hyres::ollama::{OllamaClientBuilder, RetryPolicy};
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .temperature(0.2)
///     .retry_policy(RetryPolicy::none())
///     .build()
///     .expect("valid configuration");
/// assert_eq!(client.base_url(), "http://localhost:11434");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    temperature: Option<f64>,
    json_format: Option<bool>,
    retry_policy: Option<RetryPolicy>,
}

impl OllamaClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the Ollama server (defaults to [`DEFAULT_HOST`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the sampling temperature (defaults to [`DEFAULT_TEMPERATURE`]).
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Asks the server to constrain output to JSON (on by default).
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = Some(enabled);
        self
    }

    /// Overrides the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `OllamaError::InvalidUrl` if the base URL does not parse, or
    /// `OllamaError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<OllamaClient, OllamaError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim_end_matches('/')
            .to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| OllamaError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(OllamaError::Network)?;

        Ok(OllamaClient {
            http,
            base_url,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            json_format: self.json_format.unwrap_or(true),
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

/// Blocking HTTP client for `/api/generate`.
///
/// Construct it with [`OllamaClientBuilder`].
#[derive(Debug)]
pub struct OllamaClient {
    http: reqwest::blocking::Client,
    base_url: String,
    temperature: f64,
    json_format: bool,
    retry_policy: RetryPolicy,
}

impl OllamaClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn json_format(&self) -> bool {
        self.json_format
    }

    fn request<'a>(&self, model: &'a str, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
            format: self.json_format.then_some("json"),
        }
    }

    fn send_once(&self, url: &str, body: &GenerateRequest<'_>) -> Result<String, OllamaError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .map_err(OllamaError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Http {
                status: status.as_u16(),
            });
        }

        let text = response.text().map_err(OllamaError::from_transport)?;
        parse_generate_response(&text)
    }
}

fn parse_generate_response(text: &str) -> Result<String, OllamaError> {
    let parsed: GenerateResponse =
        serde_json::from_str(text).map_err(OllamaError::Serialization)?;
    match (parsed.response, parsed.error) {
        (_, Some(message)) => Err(OllamaError::Api { message }),
        (Some(response), None) => Ok(response),
        (None, None) => Err(OllamaError::Api {
            message: "missing 'response' field".to_string(),
        }),
    }
}

impl TextGenerator for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.request(model, prompt);
        debug!(%url, model, prompt_len = prompt.len(), "sending generate request");
        self.retry_policy.run(|| self.send_once(&url, &body))
    }
}
