//! Error types for Lenio operations.
//!
//! This module defines the main error type [`LenioError`] which represents
//! all possible errors that can occur while locating content, driving the
//! generation backend, and rewriting the document.
//!
//! # Example
//!
//! ```rust
//! use lenio_core::{LenioError, Result};
//!
//! fn check_input(html: &str) -> Result<()> {
//!     if html.is_empty() {
//!         return Err(LenioError::NoContent);
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for simplification operations.
///
/// Variants fall into two families: fatal errors that abort a run before any
/// document mutation (`NoContent`, `CapabilityUnavailable`, `RunInProgress`),
/// and per-chunk errors that the pipeline contains and logs
/// (`GenerationFailed`, `UnsupportedLanguage`, `EmptyGeneration`).
///
/// # Example
///
/// ```rust
/// use lenio_core::LenioError;
///
/// fn report(err: &LenioError) {
///     match err {
///         LenioError::NoContent => eprintln!("nothing to simplify on this page"),
///         LenioError::GenerationFailed { attempts } => {
///             eprintln!("gave up after {} attempts", attempts);
///         }
///         e => eprintln!("error: {}", e),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum LenioError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request or generation attempt timeout.
    #[error("Timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors.
    ///
    /// Returned when HTML cannot be parsed, often due to malformed markup
    /// or invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No content root matched any candidate selector.
    ///
    /// Fatal to the whole run. The pipeline aborts before any generation
    /// call is made and before any document mutation.
    #[error("No article content could be located in the document")]
    NoContent,

    /// The generation capability reported itself unavailable.
    ///
    /// Fatal to the whole run, same as [`LenioError::NoContent`]: no session
    /// is ever created and no mutation occurs.
    #[error("Text generation capability is unavailable")]
    CapabilityUnavailable,

    /// A chunk exhausted its retry ceiling without producing usable text.
    ///
    /// Local to the chunk: the pipeline logs it, leaves the chunk's original
    /// elements untouched, and continues with the next chunk.
    #[error("Generation failed after {attempts} attempts")]
    GenerationFailed { attempts: usize },

    /// The generator rejected the input language.
    ///
    /// This routes the chunk into the language-fallback path rather than
    /// counting as an ordinary attempt failure.
    #[error("Input language is not supported by the generator")]
    UnsupportedLanguage,

    /// The generator produced empty or whitespace-only output.
    ///
    /// Always consumed by the retry loop; callers of the public API never
    /// observe this variant directly.
    #[error("Generator returned empty output")]
    EmptyGeneration,

    /// The generation backend reported a request-level failure.
    #[error("Generation backend error: {0}")]
    Backend(String),

    /// A simplify run was triggered while another run is still in flight.
    ///
    /// Runs are never interleaved; the second trigger is rejected.
    #[error("A simplify run is already in progress")]
    RunInProgress,

    /// The run was cancelled at a chunk or retry boundary.
    #[error("Run cancelled")]
    Cancelled,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Result type alias for LenioError.
///
/// This is a convenience alias for `std::result::Result<T, LenioError>`.
pub type Result<T> = std::result::Result<T, LenioError>;
