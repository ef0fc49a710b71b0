//! The catalog against headless Chrome

#![cfg(feature = "cdp")]

mod common;

use memeprobe::{scenarios, Backend, HarnessConfig, Runner};

#[test]
#[ignore] // Requires Chrome to be installed
fn full_catalog_in_chrome() {
    let config = HarnessConfig {
        base_url: common::start_page_server(),
        backend: Backend::Cdp,
        fixtures_dir: common::fixtures().root().to_path_buf(),
        ..Default::default()
    };
    let mut session = memeprobe::open_session(&config).expect("launch chrome");
    let report = Runner::new(&config).run(session.as_mut(), &scenarios::catalog());
    for failure in report.failures() {
        eprintln!("{} / {}: {:?}", failure.scenario, failure.check, failure.error);
    }
    assert!(report.all_passed());
}
