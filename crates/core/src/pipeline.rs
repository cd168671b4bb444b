//! The end-to-end simplification pipeline.
//!
//! [`Simplifier`] drives locate → chunk → per-chunk rewrite → reconcile with
//! independent failure containment per chunk: one chunk exhausting its
//! retries never aborts the rest of the run. The pipeline context (session
//! configuration, cancellation, run guard) is owned here and passed into
//! each stage explicitly; there is no ambient module state.
//!
//! # Example
//!
//! ```rust,no_run
//! use lenio_core::{SimplifyConfig, Simplifier};
//! use lenio_core::generators::{HttpGenerator, HttpGeneratorConfig};
//!
//! # async fn example() -> lenio_core::Result<()> {
//! let generator = HttpGenerator::new(HttpGeneratorConfig::default())?;
//! let simplifier = Simplifier::new(generator, SimplifyConfig::default());
//!
//! let report = simplifier.run("<article><p>Dense prose...</p></article>").await?;
//! println!("{}/{} chunks rewritten", report.outcome.rewritten, report.outcome.total_chunks);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::annotate::annotate_nodes;
use crate::calibrate::ReadingLevel;
use crate::chunk::{Chunk, ChunkConfig, chunk_elements};
use crate::locate::{LocateConfig, locate_content};
use crate::parse::Document;
use crate::reconcile::{HtmlTreeEditor, reconcile};
use crate::retry::{Backoff, RetryPolicy};
use crate::rewrite::{RewriteClient, RewriteConfig};
use crate::session::{Availability, SessionConfig, TextGenerator};
use crate::{LenioError, Result};

/// Configuration for a simplify run.
///
/// # Example
///
/// ```rust
/// use lenio_core::{ReadingLevel, SimplifyConfig};
///
/// let config = SimplifyConfig::builder()
///     .reading_level(ReadingLevel::Simple)
///     .token_budget(600.0)
///     .build();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Target simplification intensity. Affects only the system
    /// instruction, never chunking or reconciliation.
    pub reading_level: ReadingLevel,

    /// Estimated-token budget per chunk (default: 800).
    pub token_budget: f64,

    /// Retry ceiling per chunk (default: 20).
    pub max_attempts: usize,

    /// Fixed delay between attempts in milliseconds (default: 500).
    pub retry_delay_ms: u64,

    /// Minimum trimmed text length for content paragraphs (default: 50).
    pub min_content_len: usize,

    /// Wall-clock bound on a single generation attempt in seconds
    /// (default: 120).
    pub attempt_timeout_secs: u64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            reading_level: ReadingLevel::default(),
            token_budget: 800.0,
            max_attempts: 20,
            retry_delay_ms: 500,
            min_content_len: 50,
            attempt_timeout_secs: 120,
        }
    }
}

impl SimplifyConfig {
    /// Creates a new builder for SimplifyConfig.
    pub fn builder() -> SimplifyConfigBuilder {
        SimplifyConfigBuilder::new()
    }
}

/// Builder for SimplifyConfig.
pub struct SimplifyConfigBuilder {
    config: SimplifyConfig,
}

impl SimplifyConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: SimplifyConfig::default() }
    }

    /// Sets the reading level.
    pub fn reading_level(mut self, value: ReadingLevel) -> Self {
        self.config.reading_level = value;
        self
    }

    /// Sets the per-chunk token budget.
    pub fn token_budget(mut self, value: f64) -> Self {
        self.config.token_budget = value;
        self
    }

    /// Sets the retry ceiling.
    pub fn max_attempts(mut self, value: usize) -> Self {
        self.config.max_attempts = value;
        self
    }

    /// Sets the inter-attempt delay in milliseconds.
    pub fn retry_delay_ms(mut self, value: u64) -> Self {
        self.config.retry_delay_ms = value;
        self
    }

    /// Sets the minimum content length.
    pub fn min_content_len(mut self, value: usize) -> Self {
        self.config.min_content_len = value;
        self
    }

    /// Sets the per-attempt timeout in seconds.
    pub fn attempt_timeout_secs(mut self, value: u64) -> Self {
        self.config.attempt_timeout_secs = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> SimplifyConfig {
        self.config
    }
}

impl Default for SimplifyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Rewritten and reconciled into the document.
    Rewritten,
    /// Retries exhausted; original elements left untouched.
    Failed,
    /// A header-only chunk, skipped before generation.
    SkippedHeader,
}

/// Per-run counters.
///
/// The original behavior collapsed every non-fatal outcome into a generic
/// acknowledgment; these counters expose the actual success ratio.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimplifyOutcome {
    /// Total chunks produced by the chunker.
    pub total_chunks: usize,
    /// Chunks successfully rewritten.
    pub rewritten: usize,
    /// Chunks left unchanged after exhausting retries.
    pub failed: usize,
    /// Header-only chunks skipped before generation.
    pub skipped_headers: usize,
}

impl SimplifyOutcome {
    /// Whether every rewritable chunk was rewritten.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Fraction of rewritable chunks that were rewritten (1.0 when there
    /// was nothing to rewrite).
    pub fn success_ratio(&self) -> f64 {
        let rewritable = self.total_chunks - self.skipped_headers;
        if rewritable == 0 { 1.0 } else { self.rewritten as f64 / rewritable as f64 }
    }
}

/// The result of a simplify run: the rewritten document and its outcome.
#[derive(Debug, Clone)]
pub struct SimplifyReport {
    /// The full document with replacements applied and markers stripped.
    pub html: String,
    /// Per-run counters.
    pub outcome: SimplifyOutcome,
}

/// Per-chunk progress callback.
pub type ProgressFn = Box<dyn Fn(usize, usize, ChunkStatus) + Send + Sync>;

/// Resets the run-in-progress flag when the run ends, however it ends.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return Err(LenioError::RunInProgress);
        }
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The pipeline orchestrator.
///
/// At most one run may be active at a time; a second trigger while one is
/// in flight is rejected with [`LenioError::RunInProgress`], never
/// interleaved. Cancellation is honored at chunk and retry boundaries.
pub struct Simplifier<G: TextGenerator> {
    generator: G,
    config: SimplifyConfig,
    running: AtomicBool,
    cancel: CancellationToken,
    on_progress: Option<ProgressFn>,
}

impl<G: TextGenerator> Simplifier<G> {
    /// Create a simplifier owning its generator.
    pub fn new(generator: G, config: SimplifyConfig) -> Self {
        Self { generator, config, running: AtomicBool::new(false), cancel: CancellationToken::new(), on_progress: None }
    }

    /// Attach a per-chunk progress callback.
    pub fn with_progress(mut self, callback: ProgressFn) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// A handle for cancelling the active (or a future) run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the full pipeline over a document.
    ///
    /// Fatal preconditions ([`LenioError::NoContent`],
    /// [`LenioError::CapabilityUnavailable`]) abort before any session
    /// creation or mutation. Per-chunk failures are contained: the returned
    /// report counts them and the affected elements keep their original
    /// text.
    pub async fn run(&self, html: &str) -> Result<SimplifyReport> {
        let _guard = RunGuard::acquire(&self.running)?;

        match self.generator.availability().await? {
            Availability::Unavailable => return Err(LenioError::CapabilityUnavailable),
            Availability::Downloading => {
                tracing::info!("generation capability still downloading; proceeding, may be slow");
            }
            Availability::Available => {}
        }

        // Discovery and chunking complete before any mutation: located
        // elements go stale the moment the document changes.
        let annotated = annotate_nodes(html);
        let elements = {
            let doc = Document::parse(&annotated)?;
            let locate_config =
                LocateConfig { min_content_len: self.config.min_content_len, ..Default::default() };
            locate_content(&doc, &locate_config)?
        };

        let chunks = chunk_elements(elements, &ChunkConfig { token_budget: self.config.token_budget });
        tracing::info!(chunks = chunks.len(), "content located and chunked");

        let client = RewriteClient::new(&self.generator, self.rewrite_config(), self.cancel.clone());
        let mut editor = HtmlTreeEditor::new(annotated);
        let mut outcome = SimplifyOutcome { total_chunks: chunks.len(), ..Default::default() };

        for (index, chunk) in chunks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(LenioError::Cancelled);
            }

            if chunk.is_header_only() {
                outcome.skipped_headers += 1;
                self.report(index, &chunks, ChunkStatus::SkippedHeader);
                continue;
            }

            match client.rewrite(&chunk.request_text()).await {
                Ok(text) => {
                    reconcile(chunk, &text, &mut editor);
                    outcome.rewritten += 1;
                    self.report(index, &chunks, ChunkStatus::Rewritten);
                }
                Err(LenioError::Cancelled) => return Err(LenioError::Cancelled),
                Err(err) => {
                    tracing::warn!(chunk = index, error = %err, "chunk left unchanged");
                    outcome.failed += 1;
                    self.report(index, &chunks, ChunkStatus::Failed);
                }
            }
        }

        tracing::info!(
            rewritten = outcome.rewritten,
            failed = outcome.failed,
            skipped_headers = outcome.skipped_headers,
            "simplify run complete"
        );

        Ok(SimplifyReport { html: editor.finish(), outcome })
    }

    fn rewrite_config(&self) -> RewriteConfig {
        RewriteConfig {
            policy: RetryPolicy {
                max_attempts: self.config.max_attempts,
                base_delay: Duration::from_millis(self.config.retry_delay_ms),
                backoff: Backoff::Fixed,
            },
            fallback_policy: RetryPolicy::fallback_default(),
            attempt_timeout: Duration::from_secs(self.config.attempt_timeout_secs),
            session: SessionConfig {
                system_instruction: self.config.reading_level.system_instruction(),
                ..Default::default()
            },
        }
    }

    fn report(&self, index: usize, chunks: &[Chunk], status: ChunkStatus) {
        if let Some(callback) = &self.on_progress {
            callback(index, chunks.len(), status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SimplifyConfig::default();
        assert_eq!(config.token_budget, 800.0);
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.retry_delay_ms, 500);
        assert_eq!(config.min_content_len, 50);
    }

    #[test]
    fn test_config_builder() {
        let config = SimplifyConfig::builder()
            .reading_level(ReadingLevel::Simplest)
            .token_budget(400.0)
            .max_attempts(3)
            .build();

        assert_eq!(config.reading_level, ReadingLevel::Simplest);
        assert_eq!(config.token_budget, 400.0);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_outcome_success_ratio() {
        let outcome = SimplifyOutcome { total_chunks: 5, rewritten: 3, failed: 1, skipped_headers: 1 };
        assert!((outcome.success_ratio() - 0.75).abs() < 1e-9);
        assert!(!outcome.is_complete());

        let empty = SimplifyOutcome::default();
        assert_eq!(empty.success_ratio(), 1.0);
        assert!(empty.is_complete());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = SimplifyConfig::builder().token_budget(640.0).build();
        let json = serde_json::to_string(&config).unwrap();
        let back: SimplifyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token_budget, 640.0);
    }
}
