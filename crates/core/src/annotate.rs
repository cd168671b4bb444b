use std::cell::Cell;
use std::rc::Rc;

/// Attribute carrying the stable node handle stamped onto content elements.
pub const NODE_ATTR: &str = "data-lenio-node";

/// Tags considered content-bearing: headings, paragraphs, list containers.
///
/// The same set drives both stamping here and collection in
/// [`crate::locate`], so every collected element is guaranteed a handle.
pub const CONTENT_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "dl"];

/// Stamp every content-bearing element with an incrementing node handle.
///
/// Handles are assigned in document order, so ascending handle order is
/// document order. Discovery, chunking, and reconciliation all address
/// elements through these handles instead of live tree pointers, which keeps
/// everything but the tree editor testable without a document.
pub fn annotate_nodes(html: &str) -> String {
    let counter = Rc::new(Cell::new(0usize));

    let handlers = CONTENT_TAGS
        .iter()
        .map(|tag| {
            let counter = Rc::clone(&counter);
            lol_html::element!(*tag, move |el| {
                let id = counter.get();
                counter.set(id + 1);
                el.set_attribute(NODE_ATTR, &id.to_string()).ok();
                Ok(())
            })
        })
        .collect();

    rewrite(html, handlers)
}

/// Remove all node-handle markers from the document.
///
/// Called once at the end of a run so the returned HTML carries no trace of
/// the pipeline's bookkeeping.
pub fn strip_markers(html: &str) -> String {
    let selector = format!("[{}]", NODE_ATTR);
    let handlers = vec![lol_html::element!(selector, |el| {
        el.remove_attribute(NODE_ATTR);
        Ok(())
    })];

    rewrite(html, handlers)
}

/// Run a set of element handlers over the document, returning the input
/// unchanged if rewriting fails.
pub(crate) fn rewrite(html: &str, handlers: Vec<(std::borrow::Cow<'_, lol_html::Selector>, lol_html::ElementContentHandlers<'_>)>) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    if output.is_empty() { html.to_string() } else { output }
}
