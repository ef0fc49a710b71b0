//! The page-session capability interface.
//!
//! Every check in the harness talks to the page under test through a
//! [`PageSession`]. Backends (headless Chrome, the static mock DOM, or a
//! hand-written fake in a test) are interchangeable as long as they answer the
//! same geometry, style, and interaction queries.

use crate::fixture::FileFixture;
use crate::geometry::Rect;
use crate::{Result, Viewport};

/// An element with rendered text, as returned by [`PageSession::text_nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// Short description such as `p#meme-text`
    pub path: String,
    /// Text content with whitespace collapsed and trimmed
    pub text: String,
    /// Nesting depth below `<body>` (body children have depth 1)
    pub depth: usize,
    /// Whether the element is currently visible
    pub visible: bool,
}

/// Live handle on the page under test.
///
/// Selector-taking methods resolve the selector to exactly one element and
/// fail with [`crate::Error::ElementNotFound`] or
/// [`crate::Error::AmbiguousSelector`] otherwise. Reads are never cached:
/// each call reflects the document as it is at call time.
pub trait PageSession {
    /// Navigate to `path`, resolved against the session's base URL.
    /// Discards all state left behind by earlier actions.
    fn visit(&mut self, path: &str) -> Result<()>;

    /// Reload the current document from scratch.
    fn reload(&mut self) -> Result<()>;

    /// Resize the viewport.
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Bounding box of the element, like `getBoundingClientRect()`.
    fn bounding_rect(&mut self, selector: &str) -> Result<Rect>;

    /// Computed value of a CSS property, like `getComputedStyle()`.
    fn computed_style(&mut self, selector: &str, property: &str) -> Result<String>;

    /// Current value of an attribute, `None` when absent.
    fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Current value of a form control.
    fn value(&mut self, selector: &str) -> Result<String>;

    /// Type `text` into the element one keystroke at a time.
    fn type_text(&mut self, selector: &str, text: &str) -> Result<()>;

    /// Click the element.
    fn click(&mut self, selector: &str) -> Result<()>;

    /// Select `file` on a file input.
    fn upload_file(&mut self, selector: &str, file: &FileFixture) -> Result<()>;

    /// Whether the element is rendered and visible.
    fn is_visible(&mut self, selector: &str) -> Result<bool>;

    /// All elements under `<body>` that carry text, in document order.
    fn text_nodes(&mut self) -> Result<Vec<TextNode>>;

    /// URL of the current document, if one is loaded.
    fn current_url(&self) -> Option<String>;
}

/// Collapse runs of whitespace and trim, the way text matching sees it.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  My\n  awesome\tmeme "), "My awesome meme");
        assert_eq!(normalize_text(""), "");
    }
}
