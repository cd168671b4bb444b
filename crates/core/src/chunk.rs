//! Token-bounded, structure-respecting chunking.
//!
//! The chunker partitions the ordered content-element sequence into groups
//! that each fit a single generation call. Grouping amortizes the fixed cost
//! of a call across short paragraphs, while headings and lists are isolated
//! into their own chunks: the model cannot be asked to blend incompatible
//! structures and still have its output split back into the right shape.

use regex::Regex;

use crate::locate::ContentElement;

/// Multiplier applied to the word count when estimating token cost.
///
/// Not a real tokenizer; the budget is a soft backpressure signal rather
/// than a hard limit enforced by the backend, so a fixed safety margin over
/// the word count is enough.
const TOKEN_MULTIPLIER: f64 = 1.3;

/// Delimiter joining element texts into one request and splitting the
/// generated output back into units.
pub const UNIT_DELIMITER: &str = "\n\n";

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Estimated-token budget per chunk.
    pub token_budget: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { token_budget: 800.0 }
    }
}

/// An ordered, non-empty group of content elements processed as one
/// generation unit.
///
/// Invariants:
/// - a header is always the sole element of its chunk;
/// - a list always occupies its own chunk;
/// - a multi-element chunk's estimated cost never exceeds the budget
///   (a single oversized element is emitted alone);
/// - chunks partition the element sequence in original order.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The elements assigned to this chunk, in document order.
    pub elements: Vec<ContentElement>,
}

impl Chunk {
    /// Whether this chunk consists of exactly one header.
    ///
    /// Header chunks are legitimate output of the chunker but are skipped
    /// before generation: headings are never rewritten.
    pub fn is_header_only(&self) -> bool {
        self.elements.len() == 1 && self.elements[0].is_header()
    }

    /// The chunk's non-header elements, the ones generation rewrites.
    pub fn non_headers(&self) -> Vec<&ContentElement> {
        self.elements.iter().filter(|el| !el.is_header()).collect()
    }

    /// The generation request text: non-header element texts joined by the
    /// unit delimiter.
    pub fn request_text(&self) -> String {
        self.non_headers()
            .iter()
            .map(|el| el.text.as_str())
            .collect::<Vec<_>>()
            .join(UNIT_DELIMITER)
    }
}

/// Estimate the token cost of a text.
pub fn estimate_tokens(text: &str) -> f64 {
    word_count(text) as f64 * TOKEN_MULTIPLIER
}

/// Count words using a simple regex pattern.
fn word_count(text: &str) -> usize {
    let word_regex = Regex::new(r"\b[\w'-]+\b").unwrap();
    word_regex.find_iter(text).count()
}

/// Partition the element sequence into chunks.
///
/// Iterates elements in order, maintaining a running chunk and its
/// estimated cost. A new chunk starts when the element is a header (which
/// becomes a one-element chunk), a list (a chunk by itself), or when adding
/// the element would push the running cost over budget.
pub fn chunk_elements(elements: Vec<ContentElement>, config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<ContentElement> = Vec::new();
    let mut current_cost = 0.0;

    for element in elements {
        if element.is_header() || element.is_list() {
            if !current.is_empty() {
                chunks.push(Chunk { elements: std::mem::take(&mut current) });
                current_cost = 0.0;
            }
            chunks.push(Chunk { elements: vec![element] });
            continue;
        }

        let cost = estimate_tokens(&element.text);
        if !current.is_empty() && current_cost + cost > config.token_budget {
            chunks.push(Chunk { elements: std::mem::take(&mut current) });
            current_cost = 0.0;
        }

        current.push(element);
        current_cost += cost;
    }

    if !current.is_empty() {
        chunks.push(Chunk { elements: current });
    }

    chunks
}
