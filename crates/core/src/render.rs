//! Rendering of generated text into replacement HTML fragments.
//!
//! Generated paragraph text may carry lightweight inline markup (bold,
//! italic, code, links). With the `markdown` feature enabled it is rendered
//! through pulldown-cmark; without it, text is escaped verbatim.

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one output unit as inline HTML.
///
/// Block structure is not wanted here: the unit becomes the content of an
/// existing paragraph or list item, so a wrapping `<p>` produced by the
/// renderer is stripped.
#[cfg(feature = "markdown")]
pub fn render_inline(text: &str) -> String {
    use pulldown_cmark::{Parser, html};

    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new(text));

    let rendered = rendered.trim();
    let rendered = rendered.strip_prefix("<p>").unwrap_or(rendered);
    let rendered = rendered.strip_suffix("</p>").unwrap_or(rendered);
    rendered.trim().to_string()
}

/// Render one output unit as escaped plain text.
#[cfg(not(feature = "markdown"))]
pub fn render_inline(text: &str) -> String {
    escape_html(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a < b & "c""#), "a &lt; b &amp; &quot;c&quot;");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_render_inline_markup() {
        let rendered = render_inline("plain **bold** and `code`");
        assert_eq!(rendered, "plain <strong>bold</strong> and <code>code</code>");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_render_strips_paragraph_wrapper() {
        let rendered = render_inline("just text");
        assert_eq!(rendered, "just text");
    }

    #[cfg(not(feature = "markdown"))]
    #[test]
    fn test_render_escapes_without_markdown() {
        assert_eq!(render_inline("a <b>"), "a &lt;b&gt;");
    }
}
