//! Static DOM: a browser-less page session.
//!
//! The page is parsed with `scraper`, styled by a small cascade and laid out
//! with a simple block model. It runs no scripts; page reactions come from
//! [`Behaviors`]. Good enough to exercise the whole scenario catalog without
//! Chrome, and to test the harness itself against known-good and known-bad
//! pages.

pub mod behavior;
pub mod css;
pub mod document;
pub mod layout;

pub use behavior::{Behaviors, ClickBehavior, Effect, TextMirror, UploadPreview};
pub use document::Document;

use crate::fixture::FileFixture;
use crate::geometry::Rect;
use crate::session::{normalize_text, PageSession, TextNode};
use crate::{Error, HarnessConfig, Result, Viewport};
use log::{debug, info};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

enum PageSource {
    /// Markup held in memory; every path serves it
    Markup(String),
    /// Fetched over HTTP relative to a base URL
    Remote { client: Client, base: Url },
}

/// A [`PageSession`] backed by the static DOM.
pub struct StaticSession {
    source: PageSource,
    behaviors: Behaviors,
    viewport: Viewport,
    document: Option<Document>,
    current_url: Option<String>,
    current_path: Option<String>,
}

impl StaticSession {
    /// Serve `markup` for every visited path.
    pub fn from_html(markup: impl Into<String>, behaviors: Behaviors) -> Self {
        Self {
            source: PageSource::Markup(markup.into()),
            behaviors,
            viewport: Viewport::default(),
            document: None,
            current_url: None,
            current_path: None,
        }
    }

    /// Fetch pages relative to `config.base_url`.
    pub fn from_url(config: &HarnessConfig, behaviors: Behaviors) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::ConfigError(format!("bad base url {}: {}", config.base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            source: PageSource::Remote { client, base },
            behaviors,
            viewport: config.viewport,
            document: None,
            current_url: None,
            current_path: None,
        })
    }

    fn doc(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| Error::LoadError("no document loaded; visit a page first".into()))
    }

    fn doc_mut(&mut self) -> Result<&mut Document> {
        self.document
            .as_mut()
            .ok_or_else(|| Error::LoadError("no document loaded; visit a page first".into()))
    }

    fn load(&mut self, path: &str) -> Result<()> {
        let (url, document) = match &self.source {
            PageSource::Markup(markup) => (
                format!("about:static{}", path),
                Document::parse_for_viewport(markup, &[], self.viewport),
            ),
            PageSource::Remote { client, base } => {
                let url = base
                    .join(path)
                    .map_err(|e| Error::LoadError(format!("cannot resolve {}: {}", path, e)))?;
                let resp = client.get(url.clone()).send()?;
                if !resp.status().is_success() {
                    return Err(Error::LoadError(format!("{} returned {}", url, resp.status())));
                }
                let body = resp.text()?;
                let sheets = fetch_stylesheets(client, &url, &body);
                (
                    url.to_string(),
                    Document::parse_for_viewport(&body, &sheets, self.viewport),
                )
            }
        };
        info!("loaded {} ({} elements)", url, document.len());
        self.document = Some(document);
        self.current_url = Some(url);
        self.current_path = Some(path.to_string());
        Ok(())
    }

    fn rects(&self) -> Result<Vec<Rect>> {
        Ok(layout::layout_document(self.doc()?, self.viewport))
    }

    fn visible(&self, idx: usize, rects: &[Rect]) -> Result<bool> {
        let doc = self.doc()?;
        Ok(doc.is_displayed(idx)
            && doc.computed_style(idx, "visibility") != "hidden"
            && rects[idx].has_volume())
    }

    /// Elements matching `selector`; an empty match is an error.
    fn targets(&self, selector: &str) -> Result<Vec<usize>> {
        let found = self.doc()?.select_all(selector)?;
        if found.is_empty() {
            return Err(Error::ElementNotFound(selector.into()));
        }
        Ok(found)
    }

    fn apply(&mut self, effect: &Effect) -> Result<()> {
        match effect {
            Effect::SetStyle {
                target,
                property,
                value,
            } => {
                for idx in self.targets(target)? {
                    self.doc_mut()?.set_style(idx, property, value);
                }
            }
            Effect::SetAttribute {
                target,
                name,
                value,
            } => {
                for idx in self.targets(target)? {
                    self.doc_mut()?.set_attr(idx, name, value);
                }
            }
        }
        Ok(())
    }

    fn matches(&self, selector: &str, idx: usize) -> Result<bool> {
        Ok(self.doc()?.select_all(selector)?.contains(&idx))
    }

    fn refuse(action: &'static str, selector: &str, reason: impl Into<String>) -> Error {
        Error::InvalidTarget {
            action,
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fetch `<link rel="stylesheet">` targets; failures are skipped.
fn fetch_stylesheets(client: &Client, base: &Url, markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let link_sel = Selector::parse("link[rel=\"stylesheet\"]").expect("static selector");
    let hrefs: Vec<String> = document
        .select(&link_sel)
        .filter_map(|n| n.value().attr("href").map(str::to_string))
        .collect();
    hrefs
        .iter()
        .filter_map(|href| {
            let css_url = base.join(href).ok()?;
            let text = client.get(css_url.clone()).send().ok()?.text().ok()?;
            debug!("stylesheet {} ({} bytes)", css_url, text.len());
            Some(text)
        })
        .collect()
}

impl PageSession for StaticSession {
    fn visit(&mut self, path: &str) -> Result<()> {
        self.load(path)
    }

    fn reload(&mut self) -> Result<()> {
        let path = self.current_path.clone().unwrap_or_else(|| "/".to_string());
        self.load(&path)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport != self.viewport {
            self.viewport = viewport;
            if let Some(document) = self.document.as_mut() {
                document.restyle(viewport);
            }
        }
        Ok(())
    }

    fn bounding_rect(&mut self, selector: &str) -> Result<Rect> {
        let idx = self.doc()?.select_one(selector)?;
        Ok(self.rects()?[idx])
    }

    fn computed_style(&mut self, selector: &str, property: &str) -> Result<String> {
        let doc = self.doc()?;
        let idx = doc.select_one(selector)?;
        Ok(doc.computed_style(idx, property))
    }

    fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let doc = self.doc()?;
        let idx = doc.select_one(selector)?;
        Ok(doc.element(idx).attr(name).map(str::to_string))
    }

    fn value(&mut self, selector: &str) -> Result<String> {
        let doc = self.doc()?;
        let idx = doc.select_one(selector)?;
        Ok(doc.element(idx).value.clone())
    }

    fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let idx = self.doc()?.select_one(selector)?;
        let el = self.doc()?.element(idx);
        let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
        let typeable = el.tag == "textarea"
            || (el.tag == "input"
                && !matches!(
                    kind.as_str(),
                    "file" | "checkbox" | "radio" | "button" | "submit" | "hidden"
                ));
        if !typeable {
            return Err(Self::refuse("type into", selector, format!("<{}> is not a text field", el.tag)));
        }
        if el.attr("disabled").is_some() || el.attr("readonly").is_some() {
            return Err(Self::refuse("type into", selector, "field is disabled or read-only"));
        }
        let max_length = el.attr("maxlength").and_then(|v| v.trim().parse::<usize>().ok());

        let mut value = el.value.clone();
        for ch in text.chars() {
            if max_length.map_or(true, |max| value.chars().count() < max) {
                value.push(ch);
            }
        }
        debug!("typed into {}: {:?}", selector, value);
        self.doc_mut()?.element_mut(idx).value = value.clone();

        let mirrors = self.behaviors.mirrors.clone();
        for mirror in mirrors {
            if self.matches(&mirror.input, idx)? {
                for target in self.targets(&mirror.target)? {
                    self.doc_mut()?.set_text(target, &value);
                }
            }
        }
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<()> {
        let idx = self.doc()?.select_one(selector)?;
        if self.doc()?.element(idx).attr("disabled").is_some() {
            return Err(Self::refuse("click", selector, "element is disabled"));
        }
        let clicks = self.behaviors.clicks.clone();
        for behavior in clicks {
            if self.matches(&behavior.trigger, idx)? {
                debug!("click on {} fires {} effect(s)", selector, behavior.effects.len());
                for effect in &behavior.effects {
                    self.apply(effect)?;
                }
            }
        }
        Ok(())
    }

    fn upload_file(&mut self, selector: &str, file: &FileFixture) -> Result<()> {
        let idx = self.doc()?.select_one(selector)?;
        let el = self.doc()?.element(idx);
        if el.tag != "input" || el.attr("type").map(str::to_ascii_lowercase).as_deref() != Some("file") {
            return Err(Self::refuse("upload into", selector, "not a file input"));
        }
        if let Some(accept) = el.attr("accept") {
            if !file.matches_accept(accept) {
                return Err(Self::refuse(
                    "upload into",
                    selector,
                    format!("accept=\"{}\" rejects {}", accept, file.mime),
                ));
            }
        }
        self.doc_mut()?.element_mut(idx).value = format!("C:\\fakepath\\{}", file.name);

        let uploads = self.behaviors.uploads.clone();
        for preview in uploads {
            if self.matches(&preview.input, idx)? {
                let src = file.data_url();
                for image in self.targets(&preview.image)? {
                    self.doc_mut()?.set_attr(image, "src", &src);
                }
            }
        }
        Ok(())
    }

    fn is_visible(&mut self, selector: &str) -> Result<bool> {
        let idx = self.doc()?.select_one(selector)?;
        let rects = self.rects()?;
        self.visible(idx, &rects)
    }

    fn text_nodes(&mut self) -> Result<Vec<TextNode>> {
        let doc = self.doc()?;
        let rects = self.rects()?;
        let Some(body) = doc.find_tag("body") else {
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        let mut stack: Vec<(usize, usize)> = doc
            .element(body)
            .children()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|c| (c, 1))
            .collect();
        while let Some((idx, depth)) = stack.pop() {
            let text = normalize_text(&doc.text_content(idx));
            if !text.is_empty() {
                nodes.push(TextNode {
                    path: doc.describe(idx),
                    text,
                    depth,
                    visible: self.visible(idx, &rects)?,
                });
            }
            let children: Vec<usize> = doc.element(idx).children().collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        Ok(nodes)
    }

    fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }
}
