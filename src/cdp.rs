//! Chrome DevTools Protocol session
//!
//! Drives a single headless Chrome tab. Element queries run as small page
//! scripts that return JSON, so selector resolution (exactly one match) and
//! computed styles come straight from the browser.

use crate::fixture::FileFixture;
use crate::geometry::Rect;
use crate::session::{normalize_text, PageSession, TextNode};
use crate::{Error, HarnessConfig, Result, Viewport};
use headless_chrome::browser::tab::Tab;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Headless Chrome page session (uses the `headless_chrome` crate)
pub struct CdpSession {
    _browser: Browser,
    tab: Arc<Tab>,
    base: Url,
    config: HarnessConfig,
}

/// Reply shape of every element query script
#[derive(Debug, Deserialize)]
struct QueryReply<T> {
    count: usize,
    invalid: Option<String>,
    /// Wrapped in a one-element array so a `null` result stays distinguishable
    value: Option<(T,)>,
}

#[derive(Debug, Deserialize)]
struct RawTextNode {
    path: String,
    text: String,
    depth: usize,
    visible: bool,
}

const TEXT_WALK: &str = r#"(() => {
    const out = [];
    const describe = (el) => {
        let d = el.tagName.toLowerCase();
        if (el.id) return d + '#' + el.id;
        if (el.classList.length) d += '.' + el.classList[0];
        return d;
    };
    const visible = (el) => {
        const s = getComputedStyle(el);
        const r = el.getBoundingClientRect();
        return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0;
    };
    const walk = (el, depth) => {
        for (const child of el.children) {
            const tag = child.tagName.toLowerCase();
            if (tag === 'script' || tag === 'style') continue;
            out.push({ path: describe(child), text: child.innerText || child.textContent || '', depth, visible: visible(child) });
            walk(child, depth + 1);
        }
    };
    walk(document.body, 1);
    return JSON.stringify(out);
})()"#;

const IMAGE_SOURCES: &str =
    "JSON.stringify(Array.from(document.images, (img) => img.getAttribute('src')))";

/// Poll interval while waiting for the page to react.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Call `done` every `interval` until it returns true or `timeout` passes.
/// Returns whether the condition was met.
fn poll_until(
    timeout: Duration,
    interval: Duration,
    mut done: impl FnMut() -> Result<bool>,
) -> Result<bool> {
    let started = Instant::now();
    loop {
        if done()? {
            return Ok(true);
        }
        if started.elapsed() >= timeout {
            return Ok(false);
        }
        std::thread::sleep(interval);
    }
}

impl CdpSession {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::ConfigError(format!("bad base url {}: {}", config.base_url, e)))?;

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(Duration::from_millis(config.timeout_ms.max(30_000)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        Ok(Self {
            _browser: browser,
            tab,
            base,
            config,
        })
    }

    fn eval_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;
        let raw = result
            .value
            .ok_or_else(|| Error::ScriptError("No value returned from evaluation".into()))?;
        let text = raw.as_str().unwrap_or("null");
        serde_json::from_str(text).map_err(|e| Error::ScriptError(format!("Unexpected reply {}: {}", text, e)))
    }

    /// Run `body` (an expression over `el`) against the single match of `selector`.
    fn query<T: DeserializeOwned>(&self, selector: &str, body: &str) -> Result<T> {
        let quoted = serde_json::to_string(selector).map_err(|e| Error::Other(e.to_string()))?;
        let script = format!(
            r#"(() => {{
                let els;
                try {{ els = document.querySelectorAll({sel}); }}
                catch (e) {{ return JSON.stringify({{ count: 0, invalid: String(e) }}); }}
                if (els.length !== 1) return JSON.stringify({{ count: els.length }});
                const el = els[0];
                return JSON.stringify({{ count: 1, value: [({body})] }});
            }})()"#,
            sel = quoted,
            body = body
        );
        let reply: QueryReply<T> = self.eval_json(&script)?;
        if reply.invalid.is_some() {
            return Err(Error::InvalidSelector(selector.to_string()));
        }
        match reply.count {
            0 => Err(Error::ElementNotFound(selector.to_string())),
            1 => reply
                .value
                .map(|(v,)| v)
                .ok_or_else(|| Error::ScriptError(format!("no value for `{}`", selector))),
            count => Err(Error::AmbiguousSelector {
                selector: selector.to_string(),
                count,
            }),
        }
    }

    fn wait_loaded(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    /// Files handed to Chrome must exist on disk; in-memory fixtures are spilled
    /// to the temp directory first.
    fn fixture_path(file: &FileFixture) -> Result<PathBuf> {
        if file.path.is_file() {
            return file.path.canonicalize().map_err(|source| Error::FixtureError {
                name: file.name.clone(),
                source,
            });
        }
        let spilled = std::env::temp_dir().join(format!("memeprobe-{}", file.name));
        std::fs::write(&spilled, &file.bytes).map_err(|source| Error::FixtureError {
            name: file.name.clone(),
            source,
        })?;
        Ok(spilled)
    }
}

impl PageSession for CdpSession {
    fn visit(&mut self, path: &str) -> Result<()> {
        let url = self
            .base
            .join(path)
            .map_err(|e| Error::LoadError(format!("cannot resolve {}: {}", path, e)))?;
        debug!("visiting {}", url);
        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;
        self.wait_loaded()
    }

    fn reload(&mut self) -> Result<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| Error::LoadError(format!("Reload failed: {}", e)))?;
        self.wait_loaded()
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport == self.config.viewport {
            return Ok(());
        }
        self.tab
            .set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(viewport.width as f64),
                height: Some(viewport.height as f64),
            })
            .map_err(|e| Error::CdpError(format!("Failed to resize window: {}", e)))?;
        self.config.viewport = viewport;
        Ok(())
    }

    fn bounding_rect(&mut self, selector: &str) -> Result<Rect> {
        self.query(
            selector,
            "(() => { const r = el.getBoundingClientRect(); \
             return { top: r.top, left: r.left, width: r.width, height: r.height }; })()",
        )
    }

    fn computed_style(&mut self, selector: &str, property: &str) -> Result<String> {
        let prop = serde_json::to_string(property).map_err(|e| Error::Other(e.to_string()))?;
        self.query(selector, &format!("getComputedStyle(el).getPropertyValue({})", prop))
    }

    fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let name = serde_json::to_string(name).map_err(|e| Error::Other(e.to_string()))?;
        self.query(selector, &format!("el.getAttribute({})", name))
    }

    fn value(&mut self, selector: &str) -> Result<String> {
        self.query(selector, "el.value === undefined ? '' : String(el.value)")
    }

    fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let editable: bool = self.query(
            selector,
            "(el.tagName === 'TEXTAREA' || (el.tagName === 'INPUT' && \
             !['file','checkbox','radio','button','submit','image','reset','hidden'].includes(el.type))) \
             && !el.disabled && !el.readOnly",
        )?;
        if !editable {
            return Err(Error::InvalidTarget {
                action: "type into",
                selector: selector.to_string(),
                reason: "not an editable text field".into(),
            });
        }
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| Error::ElementNotFound(format!("{}: {}", selector, e)))?;
        element
            .type_into(text)
            .map_err(|e| Error::CdpError(format!("Typing into {} failed: {}", selector, e)))?;
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<()> {
        // resolve first so ambiguity is reported instead of clicking the first match
        let _: bool = self.query(selector, "true")?;
        self.tab
            .find_element(selector)
            .and_then(|el| el.click().map(|_| ()))
            .map_err(|e| Error::CdpError(format!("Click on {} failed: {}", selector, e)))?;
        Ok(())
    }

    fn upload_file(&mut self, selector: &str, file: &FileFixture) -> Result<()> {
        let is_file_input: bool = self.query(selector, "el.tagName === 'INPUT' && el.type === 'file'")?;
        if !is_file_input {
            return Err(Error::InvalidTarget {
                action: "upload into",
                selector: selector.to_string(),
                reason: "not a file input".into(),
            });
        }
        let path = Self::fixture_path(file)?;
        let path_str = path.to_string_lossy().to_string();
        let sources_before: Vec<Option<String>> = self.eval_json(IMAGE_SOURCES)?;
        self.tab
            .find_element(selector)
            .and_then(|el| el.set_input_files(&[path_str.as_str()]).map(|_| ()))
            .map_err(|e| Error::CdpError(format!("Upload into {} failed: {}", selector, e)))?;

        // the page previews asynchronously; wait for an image source to change
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let changed = poll_until(timeout, POLL_INTERVAL, || {
            let sources: Vec<Option<String>> = self.eval_json(IMAGE_SOURCES)?;
            Ok(sources != sources_before)
        })?;
        if !changed {
            debug!("no image changed within {:?} of uploading {}", timeout, file.name);
        }
        Ok(())
    }

    fn is_visible(&mut self, selector: &str) -> Result<bool> {
        self.query(
            selector,
            "(() => { const s = getComputedStyle(el); const r = el.getBoundingClientRect(); \
             return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0; })()",
        )
    }

    fn text_nodes(&mut self) -> Result<Vec<TextNode>> {
        let raw: Vec<RawTextNode> = self.eval_json(TEXT_WALK)?;
        Ok(raw
            .into_iter()
            .map(|n| TextNode {
                path: n.path,
                text: normalize_text(&n.text),
                depth: n.depth,
                visible: n.visible,
            })
            .collect())
    }

    fn current_url(&self) -> Option<String> {
        Some(self.tab.get_url())
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            warn!("Failed to close tab: {}", e);
        }
    }
}
