//! In-memory document for the static DOM: an element arena built from the
//! parsed markup, the style cascade, and the mutable state actions change.

use super::css::{self, Declaration, Rule};
use crate::{Error, Result, Viewport};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeMap, HashMap};

/// A piece of an element's content, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Child(usize),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub content: Vec<Content>,
    pub parent: Option<usize>,
    /// Form-control value
    pub value: String,
    /// Cascaded longhand declarations from stylesheets and `style`
    declared: BTreeMap<String, String>,
    /// Styles set at runtime, winning over `declared`
    overrides: BTreeMap<String, String>,
    /// `!important` declarations, winning over everything else
    important: BTreeMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = usize> + '_ {
        self.content.iter().filter_map(|c| match c {
            Content::Child(i) => Some(*i),
            Content::Text(_) => None,
        })
    }

    /// Concatenated direct text children.
    pub fn own_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Child(_) => None,
            })
            .collect()
    }

    fn specified(&self, prop: &str) -> Option<&str> {
        self.important
            .get(prop)
            .or_else(|| self.overrides.get(prop))
            .or_else(|| self.declared.get(prop))
            .map(String::as_str)
    }
}

const NON_RENDERED: &[&str] = &["head", "title", "meta", "link", "style", "script", "template"];

fn default_display(tag: &str) -> &'static str {
    match tag {
        t if NON_RENDERED.contains(&t) => "none",
        "span" | "a" | "b" | "i" | "em" | "strong" | "label" | "img" | "input" | "button"
        | "select" | "textarea" => "inline",
        _ => "block",
    }
}

fn apply(target: &mut Element, declaration: &Declaration) {
    let longhands = css::expand(&declaration.property, &declaration.value);
    let map = if declaration.important {
        &mut target.important
    } else {
        &mut target.declared
    };
    map.extend(longhands);
}

/// Parsed page plus its runtime state.
///
/// Selectors (for queries and for the cascade) are matched against the markup
/// as it was loaded: attributes changed at runtime through [`Document::set_attr`]
/// are visible to reads but not to attribute selectors.
pub struct Document {
    html: Html,
    elements: Vec<Element>,
    /// Stylesheet text in cascade order: linked sheets, then `<style>` blocks
    sheets: Vec<String>,
}

impl Document {
    /// Parse markup and style it for the default viewport.
    pub fn parse(markup: &str, external_css: &[String]) -> Self {
        Self::parse_for_viewport(markup, external_css, Viewport::default())
    }

    /// Parse markup; `external_css` are linked stylesheets, applied before
    /// the document's own `<style>` blocks. Media queries are evaluated
    /// against `viewport`.
    pub fn parse_for_viewport(markup: &str, external_css: &[String], viewport: Viewport) -> Self {
        let html = Html::parse_document(markup);

        let mut positions = HashMap::new();
        let ordered: Vec<ElementRef> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        for (idx, el) in ordered.iter().enumerate() {
            positions.insert(el.id(), idx);
        }

        let elements: Vec<Element> = ordered
            .iter()
            .map(|el| {
                let tag = el.value().name().to_ascii_lowercase();
                let attrs: BTreeMap<String, String> = el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                    .collect();
                let content = el
                    .children()
                    .filter_map(|child| match child.value() {
                        Node::Text(t) => {
                            let text: &str = &t.text;
                            Some(Content::Text(text.to_string()))
                        }
                        Node::Element(_) => positions.get(&child.id()).map(|i| Content::Child(*i)),
                        _ => None,
                    })
                    .collect();
                let parent = el
                    .parent()
                    .and_then(|p| positions.get(&p.id()).copied());
                let value = match tag.as_str() {
                    "textarea" => el.text().collect(),
                    _ => attrs.get("value").cloned().unwrap_or_default(),
                };
                Element {
                    tag,
                    attrs,
                    content,
                    parent,
                    value,
                    declared: BTreeMap::new(),
                    overrides: BTreeMap::new(),
                    important: BTreeMap::new(),
                }
            })
            .collect();

        let mut sheets: Vec<String> = external_css.to_vec();
        let style_sel = Selector::parse("style").expect("static selector");
        sheets.extend(html.select(&style_sel).map(|s| s.text().collect::<String>()));

        let mut document = Self {
            html,
            elements,
            sheets,
        };
        document.restyle(viewport);
        document
    }

    /// Recompute the cascade for `viewport`: stylesheet rules by specificity
    /// then source order, then the `style` attribute, with `!important`
    /// declarations in a tier above both. Runtime overrides are kept.
    pub fn restyle(&mut self, viewport: Viewport) {
        let mut rules: Vec<Rule> = Vec::new();
        for sheet in &self.sheets {
            let next = rules.len();
            rules.extend(css::parse_stylesheet(sheet, next, viewport));
        }
        rules.sort_by_key(|r| (r.specificity, r.order));

        for element in self.elements.iter_mut() {
            element.declared.clear();
            element.important.clear();
        }
        for rule in &rules {
            let Ok(sel) = Selector::parse(&rule.selector) else {
                continue;
            };
            for idx in self.matching(&sel) {
                for declaration in &rule.declarations {
                    apply(&mut self.elements[idx], declaration);
                }
            }
        }
        for element in self.elements.iter_mut() {
            if let Some(style) = element.attrs.get("style").cloned() {
                for declaration in css::parse_declarations(&style) {
                    apply(element, &declaration);
                }
            }
        }
    }

    /// Arena indices of the elements `sel` matches, in document order.
    fn matching(&self, sel: &Selector) -> Vec<usize> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .filter(|(_, el)| sel.matches(el))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, idx: usize) -> &Element {
        &self.elements[idx]
    }

    pub fn element_mut(&mut self, idx: usize) -> &mut Element {
        &mut self.elements[idx]
    }

    /// Index of the first element with tag `tag`.
    pub fn find_tag(&self, tag: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.tag == tag)
    }

    /// All elements matching `selector`, in document order. Matching runs
    /// against the markup as loaded (see [`Document`]).
    pub fn select_all(&self, selector: &str) -> Result<Vec<usize>> {
        let sel = Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.into()))?;
        Ok(self.matching(&sel))
    }

    /// Exactly one element matching `selector`.
    pub fn select_one(&self, selector: &str) -> Result<usize> {
        let found = self.select_all(selector)?;
        match found.len() {
            0 => Err(Error::ElementNotFound(selector.into())),
            1 => Ok(found[0]),
            count => Err(Error::AmbiguousSelector {
                selector: selector.into(),
                count,
            }),
        }
    }

    /// Short human-readable name, e.g. `p#meme-text`.
    pub fn describe(&self, idx: usize) -> String {
        let el = &self.elements[idx];
        match (el.attr("id"), el.attr("class")) {
            (Some(id), _) => format!("{}#{}", el.tag, id),
            (None, Some(class)) => format!(
                "{}.{}",
                el.tag,
                class.split_whitespace().collect::<Vec<_>>().join(".")
            ),
            _ => el.tag.clone(),
        }
    }

    pub fn set_attr(&mut self, idx: usize, name: &str, value: &str) {
        self.elements[idx]
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Set a style at runtime, like `element.style.prop = value`.
    pub fn set_style(&mut self, idx: usize, prop: &str, value: &str) {
        for (p, v) in css::expand(&prop.to_ascii_lowercase(), value) {
            self.elements[idx].overrides.insert(p, v);
        }
    }

    /// Replace all content with a single text run, like `textContent = ...`.
    pub fn set_text(&mut self, idx: usize, text: &str) {
        self.elements[idx].content = vec![Content::Text(text.to_string())];
    }

    pub fn text_content(&self, idx: usize) -> String {
        let el = &self.elements[idx];
        if matches!(el.tag.as_str(), "style" | "script") {
            return String::new();
        }
        el.content
            .iter()
            .map(|c| match c {
                Content::Text(t) => t.clone(),
                Content::Child(i) => self.text_content(*i),
            })
            .collect()
    }

    fn specified(&self, idx: usize, prop: &str) -> Option<&str> {
        self.elements[idx].specified(prop)
    }

    fn inherited_or(&self, idx: usize, prop: &str, initial: &str) -> String {
        match self.elements[idx].parent {
            Some(parent) => self.computed_style(parent, prop),
            None => initial.to_string(),
        }
    }

    /// Computed value of `prop`, normalised the way `getComputedStyle` reports it.
    pub fn computed_style(&self, idx: usize, prop: &str) -> String {
        let prop = prop.to_ascii_lowercase();
        let specified = self
            .specified(idx, &prop)
            .filter(|v| !v.eq_ignore_ascii_case("inherit"));
        match prop.as_str() {
            "border" => format!(
                "{} {} {}",
                self.computed_style(idx, "border-width"),
                self.computed_style(idx, "border-style"),
                self.computed_style(idx, "border-color")
            ),
            "border-style" => specified.unwrap_or("none").to_ascii_lowercase(),
            "border-width" => {
                let style = self.computed_style(idx, "border-style");
                if style == "none" || style == "hidden" {
                    "0px".to_string()
                } else {
                    let px = specified.and_then(css::parse_px).unwrap_or(3.0);
                    css::format_px(px)
                }
            }
            "border-color" => match specified {
                Some(v) if !v.eq_ignore_ascii_case("currentcolor") => {
                    css::normalize_color(v).unwrap_or_else(|| v.to_string())
                }
                _ => self.computed_style(idx, "color"),
            },
            "color" => match specified.and_then(css::normalize_color) {
                Some(c) => c,
                None => self.inherited_or(idx, "color", "rgb(0, 0, 0)"),
            },
            "background-color" => specified
                .and_then(css::normalize_color)
                .unwrap_or_else(|| "rgba(0, 0, 0, 0)".to_string()),
            "font-size" => {
                let parent_px = self.elements[idx]
                    .parent
                    .map(|p| self.font_size_px(p))
                    .unwrap_or(16.0);
                let px = specified
                    .and_then(|v| css::resolve_font_size(v, parent_px))
                    .unwrap_or(parent_px);
                css::format_px(px)
            }
            "text-shadow" => match specified {
                Some(v) => css::normalize_text_shadow(v, &self.computed_style(idx, "color")),
                None => self.inherited_or(idx, "text-shadow", "none"),
            },
            "display" => specified
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| default_display(&self.elements[idx].tag).to_string()),
            "visibility" => match specified {
                Some(v) => v.to_ascii_lowercase(),
                None => self.inherited_or(idx, "visibility", "visible"),
            },
            "position" => specified.unwrap_or("static").to_ascii_lowercase(),
            p => match specified {
                Some(v) => match css::parse_px(v) {
                    Some(px) => css::format_px(px),
                    None => css::normalize_color(v).unwrap_or_else(|| v.to_string()),
                },
                None if css::INHERITED.contains(&p) => self.inherited_or(idx, p, ""),
                None => String::new(),
            },
        }
    }

    pub fn font_size_px(&self, idx: usize) -> f64 {
        css::parse_px(&self.computed_style(idx, "font-size")).unwrap_or(16.0)
    }

    /// Pixel value of a declared length property, if set.
    pub fn length_px(&self, idx: usize, prop: &str) -> Option<f64> {
        self.specified(idx, prop).and_then(css::parse_px)
    }

    /// False when the element or an ancestor has `display: none`.
    pub fn is_displayed(&self, idx: usize) -> bool {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            if self.computed_style(i, "display") == "none" {
                return false;
            }
            cur = self.elements[i].parent;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><style>
        p { color: blue; }
        #frame { border: 1px solid black; background-color: white; color: white; }
        .big { font-size: 2em; }
        #frame p { font-size: 30px; }
    </style></head><body>
        <div id="frame"><p id="t" class="big" style="text-shadow: 5px 5px 5px black">Hi <b>there</b></p></div>
        <p class="dup">a</p><p class="dup">b</p>
    </body></html>"#;

    #[test]
    fn cascade_orders_by_specificity_then_inline() {
        let doc = Document::parse(PAGE, &[]);
        let t = doc.select_one("#t").unwrap();
        // `p` rule beats inheritance from #frame
        assert_eq!(doc.computed_style(t, "color"), "rgb(0, 0, 255)");
        // `#frame p` (1,0,1) beats `.big` (0,1,0)
        assert_eq!(doc.computed_style(t, "font-size"), "30px");
        assert_eq!(doc.computed_style(t, "text-shadow"), "rgb(0, 0, 0) 5px 5px 5px");
        let frame = doc.select_one("#frame").unwrap();
        assert_eq!(doc.computed_style(frame, "border"), "1px solid rgb(0, 0, 0)");
        assert_eq!(doc.computed_style(frame, "background-color"), "rgb(255, 255, 255)");
    }

    #[test]
    fn important_declarations_beat_specificity() {
        let doc = Document::parse(
            r#"<style>p { color: white !important } #t { color: yellow } #u { color: red !important }</style>
               <p id="t">a</p><p id="u" style="color: green">b</p><p id="v" style="color: green !important">c</p>"#,
            &[],
        );
        let t = doc.select_one("#t").unwrap();
        assert_eq!(doc.computed_style(t, "color"), "rgb(255, 255, 255)");
        // stylesheet `!important` beats a normal inline declaration
        let u = doc.select_one("#u").unwrap();
        assert_eq!(doc.computed_style(u, "color"), "rgb(255, 0, 0)");
        let v = doc.select_one("#v").unwrap();
        assert_eq!(doc.computed_style(v, "color"), "rgb(0, 128, 0)");
    }

    #[test]
    fn media_rules_restyle_with_the_viewport() {
        let markup = r#"<style>#t { color: black } @media (max-width: 500px) { #t { color: white } }</style><p id="t">a</p>"#;
        let mut doc = Document::parse(markup, &[]);
        let t = doc.select_one("#t").unwrap();
        assert_eq!(doc.computed_style(t, "color"), "rgb(0, 0, 0)");
        doc.set_style(t, "font-size", "20px");

        doc.restyle(Viewport {
            width: 400,
            height: 800,
        });
        assert_eq!(doc.computed_style(t, "color"), "rgb(255, 255, 255)");
        assert_eq!(doc.computed_style(t, "font-size"), "20px");

        let narrow = Document::parse_for_viewport(
            markup,
            &[],
            Viewport {
                width: 400,
                height: 800,
            },
        );
        let t = narrow.select_one("#t").unwrap();
        assert_eq!(narrow.computed_style(t, "color"), "rgb(255, 255, 255)");
    }

    #[test]
    fn attribute_selectors_see_the_loaded_markup() {
        let mut doc = Document::parse(r#"<img id="i" src="a.png"><img id="j" src="b.png">"#, &[]);
        let i = doc.select_one("#i").unwrap();
        doc.set_attr(i, "src", "c.png");
        assert_eq!(doc.element(i).attr("src"), Some("c.png"));
        assert_eq!(doc.select_one(r#"[src="a.png"]"#).unwrap(), i);
        assert!(doc.select_all(r#"[src="c.png"]"#).unwrap().is_empty());
        assert_eq!(doc.select_all("img").unwrap(), vec![i, doc.select_one("#j").unwrap()]);
    }

    #[test]
    fn border_color_defaults_to_current_color() {
        let doc = Document::parse(
            r#"<div id="d" style="color: red; border: 2px dashed"></div><div id="e"></div>"#,
            &[],
        );
        let d = doc.select_one("#d").unwrap();
        assert_eq!(doc.computed_style(d, "border"), "2px dashed rgb(255, 0, 0)");
        let e = doc.select_one("#e").unwrap();
        assert_eq!(doc.computed_style(e, "border"), "0px none rgb(0, 0, 0)");
        assert_eq!(doc.computed_style(e, "background-color"), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn runtime_styles_override_declared() {
        let mut doc = Document::parse(PAGE, &[]);
        let frame = doc.select_one("#frame").unwrap();
        doc.set_style(frame, "border", "3px dashed red");
        assert_eq!(doc.computed_style(frame, "border"), "3px dashed rgb(255, 0, 0)");
    }

    #[test]
    fn selectors_resolve_to_one_element() {
        let doc = Document::parse(PAGE, &[]);
        assert!(matches!(doc.select_one("#missing"), Err(Error::ElementNotFound(_))));
        assert!(matches!(
            doc.select_one(".dup"),
            Err(Error::AmbiguousSelector { count: 2, .. })
        ));
        assert!(matches!(doc.select_one("[[["), Err(Error::InvalidSelector(_))));
        assert_eq!(doc.describe(doc.select_one("#t").unwrap()), "p#t");
    }

    #[test]
    fn text_content_follows_document_order() {
        let mut doc = Document::parse(PAGE, &[]);
        let t = doc.select_one("#t").unwrap();
        assert_eq!(doc.text_content(t), "Hi there");
        doc.set_text(t, "My awesome meme");
        assert_eq!(doc.text_content(t), "My awesome meme");
    }

    #[test]
    fn head_content_is_not_displayed() {
        let doc = Document::parse(PAGE, &[]);
        let style = doc.find_tag("style").unwrap();
        assert!(!doc.is_displayed(style));
        assert!(doc.is_displayed(doc.select_one("#t").unwrap()));
    }
}
