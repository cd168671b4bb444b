//! Article content location.
//!
//! This module finds the main content root of a document and enumerates the
//! ordered sequence of content-bearing elements within it, filtering out
//! boilerplate. The resulting [`ContentElement`] values are plain data:
//! everything downstream of this module (chunking, generation) can run
//! without a live document.

use regex::Regex;

use crate::annotate::{CONTENT_TAGS, NODE_ATTR};
use crate::parse::{ChildNode, Document, Element};
use crate::{LenioError, Result};

/// Stable identity of a content element, assigned in document order by
/// [`crate::annotate::annotate_nodes`].
pub type NodeHandle = usize;

/// The flavor of a list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `<ul>`
    Unordered,
    /// `<ol>`
    Ordered,
    /// `<dl>`
    Definition,
}

impl ListKind {
    /// The container tag for this list kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
            ListKind::Definition => "dl",
        }
    }

    /// The default item tag for this list kind.
    pub fn item_tag(&self) -> &'static str {
        match self {
            ListKind::Unordered | ListKind::Ordered => "li",
            ListKind::Definition => "dd",
        }
    }
}

/// Classification of a content element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A heading, with its level (1-6). Headings act as chunk boundaries and
    /// are never rewritten.
    Header(u8),
    /// A paragraph of body text.
    Paragraph,
    /// A list container.
    List(ListKind),
}

/// One item of a located list element.
#[derive(Debug, Clone)]
pub struct ListItem {
    /// The item's tag (`li`, `dt`, or `dd`).
    pub tag: String,
    /// The item's own text, excluding any nested sub-list.
    pub text: String,
    /// Raw HTML of the first nested sub-list, re-attached by position after
    /// rewriting.
    pub nested_list: Option<String>,
}

/// A classified reference to one content-bearing element.
///
/// Value type: holds the stamped node handle plus everything the pipeline
/// needs to know about the element, so chunking and generation never touch
/// the document. Becomes stale the moment the document is mutated, which is
/// why discovery and chunking always complete before any mutation begins.
#[derive(Debug, Clone)]
pub struct ContentElement {
    /// Stable node handle addressing the underlying element.
    pub node: NodeHandle,
    /// Classification of the element.
    pub kind: ElementKind,
    /// Trimmed, whitespace-normalized text content.
    pub text: String,
    /// List items (empty unless `kind` is a list).
    pub items: Vec<ListItem>,
}

impl ContentElement {
    /// Construct a paragraph element.
    pub fn paragraph(node: NodeHandle, text: impl Into<String>) -> Self {
        Self { node, kind: ElementKind::Paragraph, text: text.into(), items: Vec::new() }
    }

    /// Construct a header element.
    pub fn header(node: NodeHandle, level: u8, text: impl Into<String>) -> Self {
        Self { node, kind: ElementKind::Header(level), text: text.into(), items: Vec::new() }
    }

    /// Construct a list element.
    pub fn list(node: NodeHandle, kind: ListKind, text: impl Into<String>, items: Vec<ListItem>) -> Self {
        Self { node, kind: ElementKind::List(kind), text: text.into(), items }
    }

    /// Whether this element is a heading.
    pub fn is_header(&self) -> bool {
        matches!(self.kind, ElementKind::Header(_))
    }

    /// Whether this element is a list container.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, ElementKind::List(_))
    }
}

/// Configuration for content location.
#[derive(Debug, Clone)]
pub struct LocateConfig {
    /// Candidate root selectors, tried in order; the first match wins.
    ///
    /// Generic semantic tags come before site-specific class names: a false
    /// container silently degrades output quality, so precision beats
    /// recall here.
    pub root_selectors: Vec<String>,
    /// Minimum trimmed text length for non-list, non-heading elements.
    pub min_content_len: usize,
    /// Ancestor tags that mark an element as boilerplate.
    pub boilerplate_tags: Vec<String>,
    /// Regex over ancestor class/id values that marks boilerplate.
    pub boilerplate_pattern: String,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            root_selectors: [
                "article",
                "main",
                "[role=\"main\"]",
                "#content",
                ".article-body",
                ".post-content",
                ".entry-content",
                ".story-body",
                ".post-body",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_content_len: 50,
            boilerplate_tags: ["header", "footer", "nav", "aside", "figure", "figcaption", "form"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            boilerplate_pattern:
                r"(?i)(author|byline|meta|bio|stats|avatar|share|social|caption|credit|comment|sidebar|promo|related|newsletter|breadcrumb)"
                    .to_string(),
        }
    }
}

/// Pattern matching byline/metadata text that should never be rewritten.
const BYLINE_PATTERNS: &str = r"(?i)^(by\s|published\b|updated\b|posted\b|\d+\s*min(ute)?s?\s+read\b)";

/// Locate the content root and enumerate its content elements in document
/// order.
///
/// The document must already carry node-handle markers (see
/// [`crate::annotate::annotate_nodes`]).
///
/// # Errors
///
/// Returns [`LenioError::NoContent`] if no candidate root selector matches;
/// the whole pipeline aborts before any generation call in that case.
pub fn locate_content(doc: &Document, config: &LocateConfig) -> Result<Vec<ContentElement>> {
    let root = find_root(doc, config)?;
    collect_elements(&root, config)
}

/// Try candidate root selectors in priority order and return the first match.
fn find_root<'a>(doc: &'a Document, config: &LocateConfig) -> Result<Element<'a>> {
    for selector in &config.root_selectors {
        if let Ok(matches) = doc.select(selector)
            && let Some(first) = matches.into_iter().next()
        {
            return Ok(first);
        }
    }

    Err(LenioError::NoContent)
}

/// Collect and filter the content elements under the root.
fn collect_elements(root: &Element<'_>, config: &LocateConfig) -> Result<Vec<ContentElement>> {
    let boilerplate_regex = Regex::new(&config.boilerplate_pattern)
        .map_err(|e| LenioError::HtmlParseError(format!("Invalid boilerplate pattern: {}", e)))?;
    let byline_regex = Regex::new(BYLINE_PATTERNS).unwrap();

    let selector = CONTENT_TAGS.join(", ");
    let mut elements = Vec::new();

    for el in root.select(&selector)? {
        let Some(node) = el.attr(NODE_ATTR).and_then(|v| v.parse::<usize>().ok()) else {
            continue;
        };

        let kind = match classify(&el.tag_name()) {
            Some(kind) => kind,
            None => continue,
        };

        // Elements nested inside a list belong to the list's own chunk.
        if has_list_ancestor(&el, root) {
            continue;
        }

        let text = normalize_whitespace(&el.text());

        if is_boilerplate_nested(&el, root, config, &boilerplate_regex) {
            continue;
        }

        match kind {
            ElementKind::Header(_) => {
                // Empty headings are dropped here, separately from content
                // filtering; non-empty headings are retained regardless of
                // length since they act as chunk boundaries.
                if text.is_empty() {
                    continue;
                }
                elements.push(ContentElement { node, kind, text, items: Vec::new() });
            }
            ElementKind::List(list_kind) => {
                if byline_regex.is_match(&text) {
                    continue;
                }
                let items = list_items(&el, list_kind);
                if items.is_empty() {
                    continue;
                }
                // Item boundaries matter downstream: the request and the
                // back-reference both carry one line per item.
                let text = items.iter().map(|i| i.text.as_str()).collect::<Vec<_>>().join("\n");
                elements.push(ContentElement { node, kind, text, items });
            }
            ElementKind::Paragraph => {
                if byline_regex.is_match(&text) {
                    continue;
                }
                if text.chars().count() < config.min_content_len {
                    continue;
                }
                elements.push(ContentElement { node, kind, text, items: Vec::new() });
            }
        }
    }

    elements.sort_by_key(|el| el.node);
    Ok(elements)
}

/// Classify a tag name into an element kind.
fn classify(tag: &str) -> Option<ElementKind> {
    match tag {
        "h1" => Some(ElementKind::Header(1)),
        "h2" => Some(ElementKind::Header(2)),
        "h3" => Some(ElementKind::Header(3)),
        "h4" => Some(ElementKind::Header(4)),
        "h5" => Some(ElementKind::Header(5)),
        "h6" => Some(ElementKind::Header(6)),
        "p" => Some(ElementKind::Paragraph),
        "ul" => Some(ElementKind::List(ListKind::Unordered)),
        "ol" => Some(ElementKind::List(ListKind::Ordered)),
        "dl" => Some(ElementKind::List(ListKind::Definition)),
        _ => None,
    }
}

/// Whether the element sits inside another list, up to the root.
fn has_list_ancestor(el: &Element<'_>, root: &Element<'_>) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.same(root) {
            break;
        }
        if matches!(ancestor.tag_name().as_str(), "ul" | "ol" | "dl") {
            return true;
        }
    }
    false
}

/// Structural boilerplate check: an element is excluded if any ancestor
/// below the root is a boilerplate tag or carries a boilerplate class/id.
fn is_boilerplate_nested(el: &Element<'_>, root: &Element<'_>, config: &LocateConfig, pattern: &Regex) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.same(root) {
            break;
        }

        let tag = ancestor.tag_name();
        if config.boilerplate_tags.iter().any(|t| *t == tag) {
            return true;
        }

        if let Some(class) = ancestor.attr("class")
            && pattern.is_match(class)
        {
            return true;
        }
        if let Some(id) = ancestor.attr("id")
            && pattern.is_match(id)
        {
            return true;
        }
    }
    false
}

/// Decompose a list element into its items.
///
/// Each item keeps its own text (nested sub-list text excluded) and the raw
/// HTML of its first nested sub-list for positional re-attachment.
fn list_items(el: &Element<'_>, kind: ListKind) -> Vec<ListItem> {
    let item_tags: &[&str] = match kind {
        ListKind::Definition => &["dt", "dd"],
        _ => &["li"],
    };

    el.child_elements()
        .into_iter()
        .filter(|child| item_tags.contains(&child.tag_name().as_str()))
        .map(|item| {
            let mut text = String::new();
            let mut nested_list = None;

            for child in item.child_nodes() {
                match child {
                    ChildNode::Text(t) => text.push_str(&t),
                    ChildNode::Element(child_el) => {
                        if matches!(child_el.tag_name().as_str(), "ul" | "ol" | "dl") {
                            if nested_list.is_none() {
                                nested_list = Some(child_el.outer_html());
                            }
                        } else {
                            text.push_str(&child_el.text());
                        }
                    }
                }
            }

            ListItem { tag: item.tag_name(), text: normalize_whitespace(&text), nested_list }
        })
        .collect()
}

/// Collapse whitespace runs and trim.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    let re = Regex::new(r"\s+").unwrap();
    re.replace_all(text.trim(), " ").to_string()
}
