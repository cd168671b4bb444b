pub mod annotate;
pub mod calibrate;
pub mod chunk;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
#[cfg(feature = "fetch")]
pub mod generators;
pub mod language;
pub mod locate;
pub mod parse;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod retry;
pub mod rewrite;
pub mod session;

pub use annotate::{CONTENT_TAGS, NODE_ATTR, annotate_nodes, strip_markers};
pub use calibrate::{Calibration, GUIDE_SETS, ReaderProfile, ReadingLevel, level_from_average};
pub use chunk::{Chunk, ChunkConfig, UNIT_DELIMITER, chunk_elements, estimate_tokens};
pub use error::{LenioError, Result};
#[cfg(feature = "fetch")]
pub use fetch::FetchConfig;
#[cfg(feature = "fetch")]
pub use fetch::{fetch_file, fetch_stdin, fetch_url, read_input};
#[cfg(feature = "fetch")]
pub use generators::{HttpGenerator, HttpGeneratorConfig};
pub use locate::{ContentElement, ElementKind, ListKind, LocateConfig, NodeHandle, locate_content};
pub use parse::Document;
pub use pipeline::{
    ChunkStatus, SimplifyConfig, SimplifyConfigBuilder, SimplifyOutcome, SimplifyReport, Simplifier,
};
#[doc(hidden)]
pub use reconcile::{EditOp, HtmlTreeEditor, TreeEditor, reconcile};
pub use reconcile::{ORIGINAL_ATTR, REWRITTEN_CLASS};
pub use retry::{Backoff, RetryPolicy};
pub use rewrite::{RewriteClient, RewriteConfig};
pub use session::{Availability, GenerationSession, SessionConfig, TextGenerator, TextStream};
