//! Reconciliation of generated output onto the original document.
//!
//! The generation step does not guarantee that output paragraph counts match
//! input counts, so reconciliation is deliberately worst-effort but
//! deterministic: excess output units are truncated, excess original
//! elements are removed, and every surviving original is replaced 1:1 by a
//! rendered replacement that carries the original text as an attribute.
//!
//! Mutation goes through the [`TreeEditor`] abstraction; only
//! [`HtmlTreeEditor`] touches actual HTML, so reconciliation logic is
//! testable against a recording editor.

use std::collections::HashMap;

use crate::annotate::NODE_ATTR;
use crate::chunk::{Chunk, UNIT_DELIMITER};
use crate::locate::{ContentElement, ElementKind, ListKind, NodeHandle};
use crate::render::{escape_html, render_inline};
use crate::Result;

use regex::Regex;

/// Class marker carried by every replacement element.
pub const REWRITTEN_CLASS: &str = "lenio-rewritten";

/// Attribute on a replacement holding the original element's full text,
/// enabling hover-to-reveal style inspection by consumers.
pub const ORIGINAL_ATTR: &str = "data-lenio-original";

/// A pending mutation against one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Replace the node with an HTML fragment.
    Replace(String),
    /// Detach the node from the document.
    Remove,
}

/// Tree mutation capability.
///
/// Mutations are queued with [`TreeEditor::replace`] and
/// [`TreeEditor::remove`], then applied atomically per chunk with
/// [`TreeEditor::commit`] so a chunk's edits are visible before the next
/// chunk is processed.
pub trait TreeEditor {
    /// Queue a replacement of the node with an HTML fragment.
    fn replace(&mut self, node: NodeHandle, html: String);

    /// Queue removal of the node.
    fn remove(&mut self, node: NodeHandle);

    /// Apply all queued mutations to the live tree.
    fn commit(&mut self) -> Result<()>;
}

/// A [`TreeEditor`] over an annotated HTML document string.
///
/// Nodes are addressed by their stamped handle; each commit is one
/// streaming rewrite pass over the current document.
pub struct HtmlTreeEditor {
    html: String,
    pending: HashMap<NodeHandle, EditOp>,
}

impl HtmlTreeEditor {
    /// Create an editor over annotated HTML.
    pub fn new(html: String) -> Self {
        Self { html, pending: HashMap::new() }
    }

    /// The document in its current state, markers included.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Commit any pending edits and return the final document with all
    /// node-handle markers stripped.
    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            self.commit().ok();
        }
        crate::annotate::strip_markers(&self.html)
    }
}

impl TreeEditor for HtmlTreeEditor {
    fn replace(&mut self, node: NodeHandle, html: String) {
        self.pending.insert(node, EditOp::Replace(html));
    }

    fn remove(&mut self, node: NodeHandle) {
        self.pending.insert(node, EditOp::Remove);
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let ops = std::mem::take(&mut self.pending);
        let selector = format!("[{}]", NODE_ATTR);
        let handlers = vec![lol_html::element!(selector, move |el| {
            if let Some(id) = el.get_attribute(NODE_ATTR).and_then(|v| v.parse::<usize>().ok())
                && let Some(op) = ops.get(&id)
            {
                match op {
                    EditOp::Replace(html) => el.replace(html, lol_html::html_content::ContentType::Html),
                    EditOp::Remove => el.remove(),
                }
            }
            Ok(())
        })];

        self.html = crate::annotate::rewrite(&self.html, handlers);
        Ok(())
    }
}

/// Map a chunk's generated text back onto its original elements.
///
/// Never fails: count mismatches are resolved by the truncate/drop policy
/// and logged as diagnostics, and a commit failure degrades to leaving the
/// original content in place. A chunk with no non-header elements is a
/// no-op.
pub fn reconcile(chunk: &Chunk, rewritten: &str, editor: &mut dyn TreeEditor) {
    let units: Vec<&str> = rewritten
        .split(UNIT_DELIMITER)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .collect();

    let originals = chunk.non_headers();
    if originals.is_empty() {
        return;
    }
    if units.is_empty() {
        // The rewrite client treats empty output as failure, so this is
        // unreachable in the pipeline; guard anyway rather than dropping
        // every original.
        tracing::warn!("empty rewrite result reached reconciliation, skipping chunk");
        return;
    }

    if units.len() != originals.len() {
        tracing::debug!(
            output_units = units.len(),
            originals = originals.len(),
            "output unit count mismatch, applying truncate/drop policy"
        );
    }

    // Fewer output units than originals: the excess trailing originals are
    // removed from the document entirely, not left in original form.
    let keep = units.len().min(originals.len());
    for original in &originals[keep..] {
        editor.remove(original.node);
    }

    for (original, unit) in originals.iter().zip(units.iter()) {
        let replacement = match original.kind {
            ElementKind::List(kind) => build_list(unit, original, kind),
            _ => build_paragraph(unit, original),
        };
        editor.replace(original.node, replacement);
    }

    if let Err(err) = editor.commit() {
        tracing::warn!(error = %err, "reconciliation commit failed, leaving original content");
    }
}

/// Build a replacement paragraph fragment.
fn build_paragraph(unit: &str, original: &ContentElement) -> String {
    format!(
        r#"<p class="{}" {}="{}">{}</p>"#,
        REWRITTEN_CLASS,
        ORIGINAL_ATTR,
        escape_html(&original.text),
        render_inline(unit)
    )
}

/// Build a replacement list fragment.
///
/// The generated unit is split into line-separated items with leading
/// bullet characters stripped. Item tags follow the original item at the
/// same position, and a nested sub-list found in the corresponding original
/// item is re-attached after the item's rewritten text.
fn build_list(unit: &str, original: &ContentElement, kind: ListKind) -> String {
    let bullet = Regex::new(r"^\s*(?:[-*•‣◦+]|\d+[.)])\s*").unwrap();

    let mut items_html = String::new();
    for (position, line) in unit.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        let text = bullet.replace(line, "");

        let (tag, nested) = match original.items.get(position) {
            Some(item) => (item.tag.as_str(), item.nested_list.clone()),
            None => (kind.item_tag(), None),
        };

        items_html.push_str(&format!(
            "<{tag}>{}{}</{tag}>",
            render_inline(&text),
            nested.unwrap_or_default()
        ));
    }

    format!(
        r#"<{tag} class="{}" {}="{}">{}</{tag}>"#,
        REWRITTEN_CLASS,
        ORIGINAL_ATTR,
        escape_html(&original.text),
        items_html,
        tag = kind.tag()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate_nodes;
    use crate::locate::{ContentElement, ListItem, ListKind};

    /// Records queued operations without touching any HTML.
    #[derive(Default)]
    struct RecordingEditor {
        ops: Vec<(NodeHandle, EditOp)>,
        commits: usize,
    }

    impl TreeEditor for RecordingEditor {
        fn replace(&mut self, node: NodeHandle, html: String) {
            self.ops.push((node, EditOp::Replace(html)));
        }

        fn remove(&mut self, node: NodeHandle) {
            self.ops.push((node, EditOp::Remove));
        }

        fn commit(&mut self) -> Result<()> {
            self.commits += 1;
            Ok(())
        }
    }

    fn chunk_of(elements: Vec<ContentElement>) -> Chunk {
        Chunk { elements }
    }

    #[test]
    fn test_matching_counts_replace_pairwise() {
        let chunk = chunk_of(vec![
            ContentElement::paragraph(0, "first original"),
            ContentElement::paragraph(1, "second original"),
        ]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "x\n\ny", &mut editor);

        assert_eq!(editor.ops.len(), 2);
        assert_eq!(editor.commits, 1);
        assert!(matches!(&editor.ops[0], (0, EditOp::Replace(html)) if html.contains(">x</p>")));
        assert!(matches!(&editor.ops[1], (1, EditOp::Replace(html)) if html.contains(">y</p>")));
    }

    #[test]
    fn test_replacement_carries_original_text() {
        let chunk = chunk_of(vec![ContentElement::paragraph(0, "the original words")]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "simpler words", &mut editor);

        let (_, EditOp::Replace(html)) = &editor.ops[0] else { panic!("expected replace") };
        assert!(html.contains(r#"class="lenio-rewritten""#));
        assert!(html.contains(r#"data-lenio-original="the original words""#));
    }

    #[test]
    fn test_fewer_units_removes_excess_originals() {
        let chunk = chunk_of(vec![
            ContentElement::paragraph(0, "first"),
            ContentElement::paragraph(1, "second"),
        ]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "x", &mut editor);

        assert!(editor.ops.contains(&(1, EditOp::Remove)));
        assert!(matches!(&editor.ops.iter().find(|(n, _)| *n == 0).unwrap().1, EditOp::Replace(_)));
    }

    #[test]
    fn test_excess_units_truncated() {
        let chunk = chunk_of(vec![ContentElement::paragraph(0, "only one")]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "x\n\ny\n\nz", &mut editor);

        assert_eq!(editor.ops.len(), 1);
        assert!(matches!(&editor.ops[0], (0, EditOp::Replace(html)) if html.contains(">x</p>")));
    }

    #[test]
    fn test_headers_never_replaced() {
        let chunk = chunk_of(vec![ContentElement::header(0, 2, "Title")]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "anything", &mut editor);

        assert!(editor.ops.is_empty());
        assert_eq!(editor.commits, 0);
    }

    #[test]
    fn test_list_rebuilt_with_bullets_stripped() {
        let items = vec![
            ListItem { tag: "li".to_string(), text: "one".to_string(), nested_list: None },
            ListItem { tag: "li".to_string(), text: "two".to_string(), nested_list: None },
        ];
        let chunk = chunk_of(vec![ContentElement::list(0, ListKind::Unordered, "one two", items)]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "- simpler one\n- simpler two", &mut editor);

        let (_, EditOp::Replace(html)) = &editor.ops[0] else { panic!("expected replace") };
        assert!(html.starts_with("<ul"));
        assert!(html.contains("<li>simpler one</li>"));
        assert!(html.contains("<li>simpler two</li>"));
    }

    #[test]
    fn test_list_nested_sublist_reattached_by_position() {
        let items = vec![
            ListItem {
                tag: "li".to_string(),
                text: "outer".to_string(),
                nested_list: Some("<ul><li>inner</li></ul>".to_string()),
            },
            ListItem { tag: "li".to_string(), text: "plain".to_string(), nested_list: None },
        ];
        let chunk = chunk_of(vec![ContentElement::list(0, ListKind::Unordered, "outer plain", items)]);
        let mut editor = RecordingEditor::default();

        reconcile(&chunk, "first\nsecond", &mut editor);

        let (_, EditOp::Replace(html)) = &editor.ops[0] else { panic!("expected replace") };
        assert!(html.contains("<li>first<ul><li>inner</li></ul></li>"));
        assert!(html.contains("<li>second</li>"));
    }

    #[test]
    fn test_html_tree_editor_replaces_by_handle() {
        let annotated = annotate_nodes("<article><p>alpha</p><p>beta</p></article>");
        let mut editor = HtmlTreeEditor::new(annotated);

        editor.replace(0, "<p>rewritten alpha</p>".to_string());
        editor.remove(1);
        editor.commit().unwrap();

        let html = editor.finish();
        assert!(html.contains("rewritten alpha"));
        assert!(!html.contains("beta"));
        assert!(!html.contains(NODE_ATTR));
    }

    #[test]
    fn test_finish_strips_markers_without_edits() {
        let annotated = annotate_nodes("<article><p>text stays</p></article>");
        let editor = HtmlTreeEditor::new(annotated);

        let html = editor.finish();
        assert!(html.contains("text stays"));
        assert!(!html.contains(NODE_ATTR));
    }
}
