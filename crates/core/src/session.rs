//! Generation capability traits and session configuration.
//!
//! The pipeline never talks to a concrete model API; it drives these traits.
//! A backend implements [`TextGenerator`] (availability probe plus session
//! creation) and [`GenerationSession`] (one configured streaming handle).
//! The crate ships an HTTP-backed implementation in [`crate::generators`]
//! behind the `fetch` feature; tests drive the pipeline with scripted
//! in-memory implementations.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::Result;

/// Reported readiness of the generation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Ready for use.
    Available,
    /// Usable now, but the model is still being fetched and may be slow.
    Downloading,
    /// Not usable. Fatal to a simplify run: no session is ever created.
    Unavailable,
}

/// Configuration of one generation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sampling temperature.
    pub temperature: f64,
    /// Sampling width (top-k).
    pub sampling_width: u32,
    /// System instruction describing the rewriting task and target style.
    pub system_instruction: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { temperature: 1.0, sampling_width: 8, system_instruction: String::new() }
    }
}

/// A finite stream of cumulative output snapshots.
///
/// Cumulative-replace semantics: each yielded `String` is the full text
/// generated so far, not a delta. Consumers keep only the final value. The
/// stream is not restartable.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One live, configured handle to the generation capability.
#[async_trait]
pub trait GenerationSession: Send {
    /// Stream a generation for the given prompt.
    ///
    /// The returned stream follows the cumulative-replace contract of
    /// [`TextStream`].
    async fn generate_streaming(&mut self, prompt: &str) -> Result<TextStream>;
}

/// A generation backend: probe for readiness, create configured sessions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Probe whether the capability can be used at all.
    async fn availability(&self) -> Result<Availability>;

    /// Create a fresh session with the given configuration.
    ///
    /// Sessions are cheap by contract: the rewrite client recreates one
    /// before every attempt because a stale session has been observed to
    /// return empty output.
    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn GenerationSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.sampling_width, 8);
        assert!(config.system_instruction.is_empty());
    }
}
