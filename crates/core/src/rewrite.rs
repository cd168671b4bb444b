//! Resilient rewriting of one chunk's text.
//!
//! [`RewriteClient`] owns the generation session lifecycle for a run: a
//! fresh session per attempt, full streaming consumption, non-empty
//! validation, a bounded retry loop, and the unsupported-language fallback.
//! The caller supplies plain joined text and receives either non-empty
//! rewritten text or a definitive failure after retries are exhausted.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::language;
use crate::retry::RetryPolicy;
use crate::session::{SessionConfig, TextGenerator};
use crate::{LenioError, Result};

/// Configuration for the rewrite client.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Retry policy for the main simplify loop.
    pub policy: RetryPolicy,
    /// Retry policy for the language-fallback sub-path.
    pub fallback_policy: RetryPolicy,
    /// Wall-clock bound on a single generation attempt. The underlying call
    /// has no guaranteed completion bound of its own.
    pub attempt_timeout: Duration,
    /// Session configuration used for every attempt.
    pub session: SessionConfig,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::simplify_default(),
            fallback_policy: RetryPolicy::fallback_default(),
            attempt_timeout: Duration::from_secs(120),
            session: SessionConfig::default(),
        }
    }
}

/// Drives generation for one chunk at a time.
///
/// Chunks are processed strictly sequentially: a chunk's generation
/// completes (success or terminal failure) before the next begins. The
/// session is a single stateful resource and document mutation order must
/// match source order, so there is deliberately no concurrency here.
pub struct RewriteClient<'a> {
    generator: &'a dyn TextGenerator,
    config: RewriteConfig,
    cancel: CancellationToken,
}

impl<'a> RewriteClient<'a> {
    /// Create a client borrowing the run's generator.
    pub fn new(generator: &'a dyn TextGenerator, config: RewriteConfig, cancel: CancellationToken) -> Self {
        Self { generator, config, cancel }
    }

    /// Rewrite a chunk's joined text.
    ///
    /// # Errors
    ///
    /// Returns [`LenioError::GenerationFailed`] once the retry ceiling (and,
    /// for unsupported-language inputs, the fallback's own ceiling) is
    /// exhausted, or [`LenioError::Cancelled`] if the run was cancelled at a
    /// retry boundary.
    pub async fn rewrite(&self, text: &str) -> Result<String> {
        match self.rewrite_with_policy(text, &self.config.session, &self.config.policy).await {
            Err(LenioError::UnsupportedLanguage) => self.rewrite_with_fallback(text).await,
            other => other,
        }
    }

    /// Bounded retry loop around single attempts.
    async fn rewrite_with_policy(
        &self, text: &str, session_config: &SessionConfig, policy: &RetryPolicy,
    ) -> Result<String> {
        for attempt in 1..=policy.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(LenioError::Cancelled);
            }

            match tokio::time::timeout(self.config.attempt_timeout, self.attempt(text, session_config)).await {
                Ok(Ok(output)) => return Ok(output),
                Ok(Err(LenioError::UnsupportedLanguage)) => return Err(LenioError::UnsupportedLanguage),
                Ok(Err(LenioError::Cancelled)) => return Err(LenioError::Cancelled),
                Ok(Err(err)) => {
                    tracing::debug!(attempt, error = %err, "generation attempt failed");
                }
                Err(_) => {
                    tracing::debug!(attempt, "generation attempt timed out");
                }
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }

        Err(LenioError::GenerationFailed { attempts: policy.max_attempts })
    }

    /// One attempt: fresh session, full stream consumption, validation.
    ///
    /// The session is recreated every attempt; a reused session has been
    /// observed to start returning empty output.
    async fn attempt(&self, text: &str, session_config: &SessionConfig) -> Result<String> {
        let mut session = self.generator.create_session(session_config).await?;
        let mut stream = session.generate_streaming(text).await?;

        // Cumulative-replace contract: each snapshot is the full text so
        // far, so only the final one matters.
        let mut last = String::new();
        while let Some(item) = stream.next().await {
            last = item?;
        }

        if last.trim().is_empty() {
            return Err(LenioError::EmptyGeneration);
        }

        Ok(last)
    }

    /// Unsupported-language fallback: identify foreign tokens, substitute
    /// placeholders, retry the rewrite, reverse the substitution.
    async fn rewrite_with_fallback(&self, text: &str) -> Result<String> {
        tracing::info!("input language rejected, engaging fallback");

        let tokens = self.identify_foreign_tokens(text).await?;
        if tokens.is_empty() {
            // Nothing identified means the substituted retry would be the
            // same text that was just rejected.
            return Err(LenioError::GenerationFailed { attempts: 1 });
        }

        let (substituted, map) = language::substitute(text, &tokens);
        tracing::debug!(substituted_tokens = map.len(), "retrying with placeholder text");

        match self.rewrite_with_policy(&substituted, &self.config.session, &self.config.fallback_policy).await {
            Ok(output) => Ok(language::restore(&output, &map)),
            Err(LenioError::Cancelled) => Err(LenioError::Cancelled),
            Err(LenioError::UnsupportedLanguage) => {
                Err(LenioError::GenerationFailed { attempts: self.config.fallback_policy.max_attempts })
            }
            Err(err) => Err(err),
        }
    }

    /// Auxiliary identification call.
    ///
    /// Any failure here fails the whole chunk; the caller leaves the
    /// original text untouched.
    async fn identify_foreign_tokens(&self, text: &str) -> Result<Vec<String>> {
        let identify_config = SessionConfig {
            system_instruction: language::IDENTIFY_INSTRUCTION.to_string(),
            ..self.config.session.clone()
        };

        let response =
            match tokio::time::timeout(self.config.attempt_timeout, self.attempt(text, &identify_config)).await {
                Ok(Ok(response)) => response,
                Ok(Err(LenioError::Cancelled)) => return Err(LenioError::Cancelled),
                Ok(Err(err)) => {
                    tracing::debug!(error = %err, "identification call failed");
                    return Err(LenioError::GenerationFailed { attempts: 1 });
                }
                Err(_) => return Err(LenioError::GenerationFailed { attempts: 1 }),
            };

        Ok(language::filter_candidates(language::parse_identified(&response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Availability, GenerationSession, TextStream};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted response for one session creation.
    #[derive(Clone)]
    enum Script {
        Text(&'static str),
        Empty,
        Unsupported,
    }

    struct ScriptedGenerator {
        scripts: Mutex<Vec<Script>>,
        sessions_created: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(scripts: Vec<Script>) -> Self {
            Self { scripts: Mutex::new(scripts), sessions_created: AtomicUsize::new(0) }
        }

        /// Repeats the last script entry once the list is exhausted.
        fn next_script(&self) -> Script {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.len() > 1 { scripts.remove(0) } else { scripts[0].clone() }
        }
    }

    struct ScriptedSession {
        script: Script,
    }

    #[async_trait]
    impl GenerationSession for ScriptedSession {
        async fn generate_streaming(&mut self, _prompt: &str) -> Result<TextStream> {
            match &self.script {
                Script::Text(text) => {
                    // Two cumulative snapshots; the second is the full text.
                    let partial: String = text.chars().take(1).collect();
                    let full = text.to_string();
                    Ok(Box::pin(futures::stream::iter(vec![Ok(partial), Ok(full)])))
                }
                Script::Empty => Ok(Box::pin(futures::stream::iter(vec![Ok(String::new())]))),
                Script::Unsupported => Err(LenioError::UnsupportedLanguage),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn availability(&self) -> Result<Availability> {
            Ok(Availability::Available)
        }

        async fn create_session(&self, _config: &SessionConfig) -> Result<Box<dyn GenerationSession>> {
            self.sessions_created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession { script: self.next_script() }))
        }
    }

    fn client(generator: &ScriptedGenerator) -> RewriteClient<'_> {
        RewriteClient::new(generator, RewriteConfig::default(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_success_takes_final_snapshot() {
        let generator = ScriptedGenerator::new(vec![Script::Text("rewritten text")]);
        let result = client(&generator).rewrite("original").await.unwrap();
        assert_eq!(result, "rewritten text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_output_retried_then_succeeds() {
        let generator = ScriptedGenerator::new(vec![Script::Empty, Script::Empty, Script::Text("third time")]);
        let result = client(&generator).rewrite("original").await.unwrap();

        assert_eq!(result, "third time");
        assert_eq!(generator.sessions_created.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_empty_fails_after_exact_ceiling() {
        let generator = ScriptedGenerator::new(vec![Script::Empty]);
        let result = client(&generator).rewrite("original").await;

        assert!(matches!(result, Err(LenioError::GenerationFailed { attempts: 20 })));
        assert_eq!(generator.sessions_created.load(Ordering::SeqCst), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_language_fallback_succeeds() {
        let generator = ScriptedGenerator::new(vec![
            Script::Unsupported,            // main attempt is rejected
            Script::Text("schadenfreude"),  // identification call
            Script::Text("Joy about \"a\" is a human thing."),
        ]);
        let result = client(&generator).rewrite("Joy about schadenfreude is common.").await.unwrap();

        assert_eq!(result, "Joy about schadenfreude is a human thing.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_identification_failure_fails_chunk() {
        let generator = ScriptedGenerator::new(vec![Script::Unsupported]);
        let result = client(&generator).rewrite("unübersetzbar bleibt unübersetzbar").await;

        assert!(matches!(result, Err(LenioError::GenerationFailed { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_attempt() {
        let generator = ScriptedGenerator::new(vec![Script::Text("unused")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = RewriteClient::new(&generator, RewriteConfig::default(), cancel);
        let result = client.rewrite("original").await;

        assert!(matches!(result, Err(LenioError::Cancelled)));
        assert_eq!(generator.sessions_created.load(Ordering::SeqCst), 0);
    }
}
