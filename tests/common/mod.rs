//! Shared fixtures for the integration tests: a conforming meme generator page
//! and the behaviours that stand in for its script on the static backend.

#![allow(dead_code)]

use memeprobe::static_dom::{Behaviors, StaticSession};
use memeprobe::FixtureStore;
use std::path::PathBuf;
use std::sync::Once;
use tiny_http::{Header, Response, Server};

pub const PAGE_HTML: &str = include_str!("../pages/meme-generator.html");
pub const PAGE_CSS: &str = include_str!("../pages/meme-generator.css");
pub const BEHAVIORS_JSON: &str = include_str!("../pages/meme-generator.behaviors.json");

const LINK_TAG: &str = r#"<link rel="stylesheet" href="/style.css">"#;

/// The page with its stylesheet inlined, for sessions that fetch nothing.
pub fn inline_page() -> String {
    PAGE_HTML.replace(LINK_TAG, &format!("<style>{}</style>", PAGE_CSS))
}

/// The inlined page with `css` appended after the page's own rules.
pub fn page_with_extra_css(css: &str) -> String {
    PAGE_HTML.replace(LINK_TAG, &format!("<style>{}\n{}</style>", PAGE_CSS, css))
}

pub fn behaviors() -> Behaviors {
    Behaviors::from_json(BEHAVIORS_JSON).expect("bundled behaviors parse")
}

pub fn session(markup: impl Into<String>) -> StaticSession {
    StaticSession::from_html(markup, behaviors())
}

pub fn fixtures() -> FixtureStore {
    FixtureStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
}

static SERVER: Once = Once::new();
pub const SERVER_ADDR: &str = "127.0.0.1:18091";

/// Serve the page and its stylesheet; returns the base URL.
pub fn start_page_server() -> String {
    SERVER.call_once(|| {
        let server = Server::http(SERVER_ADDR).expect("bind test server");
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let html = "Content-Type: text/html; charset=utf-8"
                    .parse::<Header>()
                    .unwrap();
                let css = "Content-Type: text/css".parse::<Header>().unwrap();
                let response = match request.url() {
                    "/" => Response::from_string(PAGE_HTML).with_header(html),
                    "/style.css" => Response::from_string(PAGE_CSS).with_header(css),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
    });
    format!("http://{}", SERVER_ADDR)
}
