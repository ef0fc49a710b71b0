//! Static backend fetching the page over HTTP

mod common;

use memeprobe::static_dom::StaticSession;
use memeprobe::{contract, scenarios, Backend, Error, HarnessConfig, PageSession, Runner};

fn config() -> HarnessConfig {
    HarnessConfig {
        base_url: common::start_page_server(),
        backend: Backend::Static,
        fixtures_dir: common::fixtures().root().to_path_buf(),
        behaviors: common::behaviors(),
        timeout_ms: 5000,
        ..Default::default()
    }
}

#[test]
fn linked_stylesheet_is_applied() {
    let config = config();
    let mut session = StaticSession::from_url(&config, config.behaviors.clone()).unwrap();
    session.visit("/").unwrap();
    assert_eq!(
        session.current_url().as_deref(),
        Some(format!("{}/", config.base_url).as_str())
    );
    assert_eq!(
        session
            .computed_style(contract::IMAGE_CONTAINER, "background-color")
            .unwrap(),
        contract::WHITE
    );
    assert_eq!(
        session.computed_style("#fire", "background-color").unwrap(),
        "rgb(255, 0, 0)"
    );
}

#[test]
fn full_catalog_over_http() {
    let config = config();
    let mut session = memeprobe::open_session(&config).unwrap();
    let report = Runner::new(&config).run(session.as_mut(), &scenarios::catalog());
    assert!(
        report.all_passed(),
        "unexpected failures: {:#?}",
        report.failures().collect::<Vec<_>>()
    );
}

#[test]
fn missing_page_is_a_load_error() {
    let config = config();
    let mut session = StaticSession::from_url(&config, Default::default()).unwrap();
    let err = session.visit("/nope").unwrap_err();
    assert!(matches!(err, Error::LoadError(_)), "{}", err);
}

#[test]
fn reads_before_a_visit_fail() {
    let config = config();
    let mut session = StaticSession::from_url(&config, Default::default()).unwrap();
    assert!(session.value(contract::TEXT_INPUT).is_err());
    assert!(session.current_url().is_none());
}

#[test]
fn unreachable_server_is_a_network_error() {
    let config = HarnessConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_ms: 2000,
        ..config()
    };
    let mut session = StaticSession::from_url(&config, Default::default()).unwrap();
    let err = session.visit("/").unwrap_err();
    assert!(matches!(err, Error::NetworkError(_)), "{}", err);
    assert!(!err.is_assertion());
}
