/*!
 * Provider implementations for LLM completion backends.
 *
 * This module contains the client implementations a `ProviderPort` can drive:
 * - Ollama: Local LLM server
 * - Mock: scripted behaviors for tests
 *
 * `ProviderPort` adapts any provider to the pipeline's `TranslationPort`,
 * leasing sessions from a `SessionPool` for each call.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System message to guide the model
    pub system: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.2,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind a `ProviderPort`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The generated text or an error
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod ollama;
pub mod port;
pub mod session;

pub use mock::{MockBehavior, MockProvider};
pub use ollama::Ollama;
pub use port::ProviderPort;
pub use session::{SessionLease, SessionPool};
