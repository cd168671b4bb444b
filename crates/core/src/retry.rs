use std::time::Duration;

/// Backoff shape between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay between every attempt.
    Fixed,
    /// Base delay multiplied by the attempt index.
    Scaled,
}

/// A bounded retry policy.
///
/// One policy value covers both retry shapes in the pipeline: the main
/// simplify loop uses a flat delay, the language-fallback sub-path scales
/// the delay with the attempt index.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: usize,
    /// Base delay between attempts.
    pub base_delay: Duration,
    /// Backoff shape.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Default policy for the main simplify loop: 20 attempts, flat 500ms.
    pub fn simplify_default() -> Self {
        Self { max_attempts: 20, base_delay: Duration::from_millis(500), backoff: Backoff::Fixed }
    }

    /// Default policy for the language-fallback sub-path: 5 attempts,
    /// 500ms scaled by attempt index.
    pub fn fallback_default() -> Self {
        Self { max_attempts: 5, base_delay: Duration::from_millis(500), backoff: Backoff::Scaled }
    }

    /// Delay to wait after the given 1-based attempt index fails.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Scaled => self.base_delay * attempt as u32,
        }
    }
}
