//! Memeprobe
//!
//! An end-to-end verification harness for the meme generator page. It drives
//! the page through a [`PageSession`], checks geometry and computed styles, and
//! reports one pass/fail outcome per check.
//!
//! # Features
//!
//! - **Static DOM backend** (always built): parses the page with `scraper`,
//!   computes a simple cascade and layout, and emulates page behaviour from
//!   declarative [`static_dom::Behaviors`]
//! - **CDP backend** (`cdp` feature): drives a headless Chrome tab
//! - **Scenario catalog**: the full set of meme generator checks, each run
//!   against a freshly visited page
//!
//! # Example
//!
//! ```no_run
//! use memeprobe::{HarnessConfig, Runner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig {
//!     base_url: "http://localhost:3000".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut session = memeprobe::open_session(&config)?;
//! let report = Runner::new(&config).run(session.as_mut(), &memeprobe::scenarios::catalog());
//! println!("{} passed, {} failed", report.passed(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod assertions;
pub mod contract;
pub mod driver;
pub mod fixture;
pub mod geometry;
pub mod queue;
pub mod runner;
pub mod scenarios;
pub mod session;

// Pure-Rust mock DOM used when no browser is available
pub mod static_dom;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use fixture::{FileFixture, FixtureStore};
pub use geometry::Rect;
pub use runner::{CheckOutcome, Report, Runner};
pub use session::{PageSession, TextNode};

/// Which backend drives the page under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Headless Chrome over the DevTools protocol
    Cdp,
    /// Pure-Rust mock DOM fetched over HTTP
    Static,
}

impl std::str::FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cdp" | "chrome" => Ok(Backend::Cdp),
            "static" => Ok(Backend::Static),
            other => Err(Error::ConfigError(format!("unknown backend: {}", other))),
        }
    }
}

/// Configuration for a verification run
///
/// The defaults match the page contract: every scenario runs at 1366×768
/// against a locally served page, with fixtures read from `fixtures/`.
///
/// # Examples
///
/// ```
/// let cfg = memeprobe::HarnessConfig::default();
/// assert_eq!(cfg.viewport.width, 1366);
/// ```
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root URL of the page under test; scenarios visit `/` relative to it
    pub base_url: String,
    /// Viewport applied before every check
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Directory holding upload fixtures
    pub fixtures_dir: PathBuf,
    /// Backend used by [`open_session`]
    pub backend: Backend,
    /// Behaviour emulation for the static backend
    pub behaviors: static_dom::Behaviors,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) memeprobe/0.1".to_string(),
            fixtures_dir: PathBuf::from("fixtures"),
            backend: if cfg!(feature = "cdp") {
                Backend::Cdp
            } else {
                Backend::Static
            },
            behaviors: static_dom::Behaviors::default(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

impl std::str::FromStr for Viewport {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`, e.g. `1366x768`
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::ConfigError(format!("viewport must be WxH, got {}", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| Error::ConfigError(format!("bad viewport size {}: {}", v, e)))
        };
        Ok(Viewport {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// Open a page session with the backend named in `config`.
pub fn open_session(config: &HarnessConfig) -> Result<Box<dyn PageSession>> {
    match config.backend {
        Backend::Static => {
            let session = static_dom::StaticSession::from_url(config, config.behaviors.clone())?;
            Ok(Box::new(session))
        }
        #[cfg(feature = "cdp")]
        Backend::Cdp => Ok(Box::new(cdp::CdpSession::new(config.clone())?)),
        #[cfg(not(feature = "cdp"))]
        Backend::Cdp => Err(Error::ConfigError(
            "the cdp backend requires building with `--features cdp`".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.viewport.width, 1366);
        assert_eq!(config.viewport.height, 768);
        assert_eq!(config.fixtures_dir, PathBuf::from("fixtures"));
    }

    #[test]
    fn test_viewport_parse() {
        let viewport: Viewport = "1920x1080".parse().unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
        assert!("1920".parse::<Viewport>().is_err());
        assert!("ax1".parse::<Viewport>().is_err());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("CDP".parse::<Backend>().unwrap(), Backend::Cdp);
        assert_eq!("static".parse::<Backend>().unwrap(), Backend::Static);
        assert!("gecko".parse::<Backend>().is_err());
    }
}
