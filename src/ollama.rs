/// Ollama model client.
///
/// This module provides the blocking HTTP client used to ask a local model
/// for edit proposals, together with its error type and retry policy.
mod client;

pub use client::{
    DEFAULT_HOST, DEFAULT_TEMPERATURE, OllamaClient, OllamaClientBuilder, OllamaError,
    RetryPolicy, TextGenerator,
};
