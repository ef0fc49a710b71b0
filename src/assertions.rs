//! Single-shot checks against the current page state.
//!
//! Each helper reads once and either returns `Ok(())` or an
//! [`Error::AssertionFailed`] carrying the expected and actual values. There
//! are no retries.

use crate::session::{normalize_text, PageSession, TextNode};
use crate::{Error, Result};
use log::debug;
use regex::Regex;

/// The computed value of `property` on `selector` equals `expected`.
pub fn expect_css(
    session: &mut dyn PageSession,
    selector: &str,
    property: &str,
    expected: &str,
) -> Result<()> {
    let actual = session.computed_style(selector, property)?;
    debug!("css {} {} = {:?}", selector, property, actual);
    if actual.trim() != expected {
        return Err(Error::assertion(
            format!("css `{}` of {}", property, selector),
            format!("{:?}", expected),
            format!("{:?}", actual),
        ));
    }
    Ok(())
}

/// The form control's value equals `expected` exactly.
pub fn expect_value(session: &mut dyn PageSession, selector: &str, expected: &str) -> Result<()> {
    let actual = session.value(selector)?;
    if actual != expected {
        return Err(Error::assertion(
            format!("value of {}", selector),
            format!("{:?}", expected),
            format!("{:?}", actual),
        ));
    }
    Ok(())
}

/// The attribute is present and matches `pattern`.
pub fn expect_attr_matches(
    session: &mut dyn PageSession,
    selector: &str,
    name: &str,
    pattern: &str,
) -> Result<()> {
    let re = Regex::new(pattern)?;
    let subject = format!("attribute `{}` of {}", name, selector);
    match session.attribute(selector, name)? {
        Some(actual) if re.is_match(&actual) => Ok(()),
        Some(actual) => Err(Error::assertion(
            subject,
            format!("a match for /{}/", pattern),
            format!("{:?}", actual),
        )),
        None => Err(Error::assertion(
            subject,
            format!("a match for /{}/", pattern),
            "no attribute",
        )),
    }
}

/// The element is rendered and visible.
pub fn expect_visible(session: &mut dyn PageSession, selector: &str) -> Result<()> {
    if !session.is_visible(selector)? {
        return Err(Error::assertion(
            format!("visibility of {}", selector),
            "visible",
            "hidden",
        ));
    }
    Ok(())
}

/// Find the element a `contains(pattern)` lookup would pick: the first
/// element in document order whose text matches and none of whose
/// descendants also match.
pub fn find_text<'a>(nodes: &'a [TextNode], pattern: &Regex) -> Option<&'a TextNode> {
    let matches = |n: &TextNode| pattern.is_match(&normalize_text(&n.text));
    nodes.iter().enumerate().find_map(|(i, node)| {
        if !matches(node) {
            return None;
        }
        let deeper_match = nodes[i + 1..]
            .iter()
            .take_while(|n| n.depth > node.depth)
            .any(|n| matches(n));
        if deeper_match {
            None
        } else {
            Some(node)
        }
    })
}

/// Some element's rendered text matches `pattern` and that element is visible.
pub fn expect_text_visible(session: &mut dyn PageSession, pattern: &str) -> Result<()> {
    let re = Regex::new(pattern)?;
    let nodes = session.text_nodes()?;
    match find_text(&nodes, &re) {
        Some(node) if node.visible => {
            debug!("text /{}/ found visible in {}", pattern, node.path);
            Ok(())
        }
        Some(node) => Err(Error::assertion(
            format!("text /{}/ in {}", pattern, node.path),
            "visible",
            "hidden",
        )),
        None => Err(Error::assertion(
            format!("text /{}/", pattern),
            "an element containing it",
            "no matching element",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str, text: &str, depth: usize, visible: bool) -> TextNode {
        TextNode {
            path: path.into(),
            text: text.into(),
            depth,
            visible,
        }
    }

    #[test]
    fn deepest_match_wins() {
        let nodes = vec![
            node("div#wrap", "My awesome meme", 1, false),
            node("p#meme-text", "My awesome meme", 2, true),
            node("p#other", "unrelated", 1, true),
        ];
        let re = Regex::new("^My awesome meme$").unwrap();
        assert_eq!(find_text(&nodes, &re).unwrap().path, "p#meme-text");
    }

    #[test]
    fn anchored_pattern_rejects_partial_text() {
        let nodes = vec![node("p", "My awesome meme!!", 1, true)];
        let re = Regex::new("^My awesome meme$").unwrap();
        assert!(find_text(&nodes, &re).is_none());
    }

    #[test]
    fn sibling_after_match_is_not_descendant() {
        let nodes = vec![
            node("p#a", "hello", 1, true),
            node("p#b", "hello", 1, true),
        ];
        let re = Regex::new("^hello$").unwrap();
        assert_eq!(find_text(&nodes, &re).unwrap().path, "p#a");
    }
}
