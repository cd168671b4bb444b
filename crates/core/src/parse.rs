//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the tree using CSS selectors. Parsing is read-only;
//! all mutation goes through the tree editor in [`crate::reconcile`].
//!
//! # Example
//!
//! ```rust
//! use lenio_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <article><p>Paragraph</p></article>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("article p").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{Html, Selector};

use crate::{LenioError, Result};

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page and provides methods for querying elements
/// using CSS selectors. The underlying tree is immutable; the pipeline
/// addresses elements through stamped node handles (see [`crate::annotate`])
/// so that discovery can be separated from mutation.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lenio_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Gets the entire HTML as a string.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector.
    ///
    /// Results are in document order.
    ///
    /// # Errors
    ///
    /// Returns [`LenioError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lenio_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel =
            Selector::parse(selector).map_err(|e| LenioError::HtmlParseError(format!("Invalid selector: {}", e)))?;

        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A single child of an element: either a run of text or a nested element.
///
/// Used when decomposing list items into their own text and any nested
/// sub-list that must be re-attached after rewriting.
pub enum ChildNode<'a> {
    /// A text node's content.
    Text(String),
    /// A child element.
    Element(Element<'a>),
}

/// A wrapper around scraper's ElementRef for easier DOM navigation.
///
/// # Example
///
/// ```rust
/// use lenio_core::parse::Document;
///
/// let html = r#"<p data-x="1">Body text</p>"#;
/// let doc = Document::parse(html).unwrap();
/// let p = &doc.select("p").unwrap()[0];
///
/// assert_eq!(p.text(), "Body text");
/// assert_eq!(p.attr("data-x"), Some("1"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the outer HTML of this element, including its own tags.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    ///
    /// Returns the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute, or `None` if absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`LenioError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel =
            Selector::parse(selector).map_err(|e| LenioError::HtmlParseError(format!("Invalid selector: {}", e)))?;

        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the direct child elements of this element, in document order.
    pub fn child_elements(&self) -> Vec<Element<'a>> {
        self.element
            .children()
            .filter_map(scraper::ElementRef::wrap)
            .map(|el| Element { element: el })
            .collect()
    }

    /// Gets the direct children of this element as text runs and elements.
    pub fn child_nodes(&self) -> Vec<ChildNode<'a>> {
        self.element
            .children()
            .filter_map(|node| {
                if let Some(el) = scraper::ElementRef::wrap(node) {
                    Some(ChildNode::Element(Element { element: el }))
                } else {
                    node.value().as_text().map(|t| ChildNode::Text(t.to_string()))
                }
            })
            .collect()
    }

    /// Whether two handles refer to the same node in the same tree.
    pub fn same(&self, other: &Element<'_>) -> bool {
        self.element.id() == other.element.id()
    }

    /// Gets the ancestor elements of this element, nearest first.
    pub fn ancestors(&self) -> Vec<Element<'a>> {
        self.element
            .ancestors()
            .filter_map(scraper::ElementRef::wrap)
            .map(|el| Element { element: el })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <div class="byline"><p>By Someone</p></div>
            <article>
                <h1>Heading</h1>
                <p class="content">Paragraph 1</p>
                <ul><li>one<ul><li>nested</li></ul></li><li>two</li></ul>
            </article>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text(), "Paragraph 1");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(LenioError::HtmlParseError(_))));
    }

    #[test]
    fn test_ancestors() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let p = &doc.select("div.byline p").unwrap()[0];

        let ancestors = p.ancestors();
        assert!(ancestors.iter().any(|a| a.attr("class") == Some("byline")));
        assert!(ancestors.iter().any(|a| a.tag_name() == "body"));
    }

    #[test]
    fn test_child_nodes_split_text_and_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let li = &doc.select("ul > li").unwrap()[0];

        let mut text = String::new();
        let mut nested_lists = 0;
        for child in li.child_nodes() {
            match child {
                ChildNode::Text(t) => text.push_str(&t),
                ChildNode::Element(el) if el.tag_name() == "ul" => nested_lists += 1,
                ChildNode::Element(_) => {}
            }
        }

        assert_eq!(text.trim(), "one");
        assert_eq!(nested_lists, 1);
    }
}
