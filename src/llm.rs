//! LLM client wrapper
//!
//! Every prompt in the application goes through [`LlmClient::complete`], the
//! only place with a retry policy: quota / rate-limit failures are retried
//! with exponential backoff, everything else surfaces immediately.

use crate::error::AssistantError;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, warn};

/// One prompt in, one generated text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Capped exponential backoff for quota errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Delay after the `attempt`-th (0-based) quota failure: base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(move |attempt| self.delay_for(attempt))
    }
}

#[derive(Clone)]
pub struct LlmClient {
    generator: Arc<dyn TextGenerator>,
    policy: BackoffPolicy,
}

impl LlmClient {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: BackoffPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Generate text, retrying quota failures per the backoff policy.
    ///
    /// Each quota failure is followed by its delay; after `max_attempts`
    /// failures the call ends with [`AssistantError::ServiceUnavailable`].
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        for attempt in 0..self.policy.max_attempts {
            match self.generator.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs_f64(),
                        "LLM quota exceeded, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("LLM call failed: {}", e);
                    return Err(e);
                }
            }
        }

        error!(
            attempts = self.policy.max_attempts,
            "LLM retries exhausted"
        );
        Err(AssistantError::ServiceUnavailable)
    }
}

/// Replays queued responses in order and records every prompt it sees.
///
/// Useful for local development without credentials and for tests.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let generator = Self::new();
        for response in responses {
            generator.push(response);
        }
        generator
    }

    pub fn push(&self, response: Result<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Ok(text.into()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        next.unwrap_or_else(|| Err(AssistantError::Llm("no scripted response left".to_string())))
    }
}
