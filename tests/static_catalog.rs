//! The scenario catalog against the static backend

mod common;

use memeprobe::contract;
use memeprobe::geometry::check_full_overlap;
use memeprobe::scenarios::{self, catalog};
use memeprobe::static_dom::{Behaviors, StaticSession};
use memeprobe::{Error, PageSession, Report, Runner};

fn run(markup: impl Into<String>) -> Report {
    let mut session = common::session(markup);
    Runner::with_fixtures(common::fixtures()).run(&mut session, &catalog())
}

fn failed_checks(report: &Report) -> Vec<&str> {
    report.failures().map(|o| o.check.as_str()).collect()
}

/// The conforming page driven by behaviours with `from` replaced by `to`.
fn run_with_behaviors(from: &str, to: &str) -> Report {
    let json = common::BEHAVIORS_JSON.replace(from, to);
    assert_ne!(json, common::BEHAVIORS_JSON);
    let behaviors = Behaviors::from_json(&json).unwrap();
    let mut session = StaticSession::from_html(common::inline_page(), behaviors);
    Runner::with_fixtures(common::fixtures()).run(&mut session, &catalog())
}

#[test]
fn conforming_page_passes_every_check() {
    let report = run(common::inline_page());
    assert_eq!(report.outcomes.len(), 19);
    assert!(
        report.all_passed(),
        "unexpected failures: {:#?}",
        report.failures().collect::<Vec<_>>()
    );
}

#[test]
fn missing_maxlength_fails_only_the_truncation_check() {
    let report = run(common::inline_page().replace(r#" maxlength="60""#, ""));
    assert_eq!(failed_checks(&report), vec!["typing 61 characters keeps the first 60"]);
    let failure = report
        .outcome("typing 61 characters keeps the first 60")
        .unwrap();
    assert!(failure.error.as_deref().unwrap().contains("sixty-one characters"));
}

#[test]
fn wrong_frame_border_is_reported() {
    let report = run(common::page_with_extra_css(
        "#meme-image-container { border: 2px solid black; }",
    ));
    assert_eq!(
        failed_checks(&report),
        vec!["the container has a 1px solid black border"]
    );
}

#[test]
fn text_style_failures_name_the_property() {
    let report = run(common::page_with_extra_css(
        "#meme-text { color: yellow; font-size: 24px; }",
    ));
    let failed = failed_checks(&report);
    assert_eq!(failed, vec!["the text font size is 30px", "the text is white"]);
    let colour = report.outcome("the text is white").unwrap();
    assert!(colour.error.as_deref().unwrap().contains("rgb(255, 255, 0)"));
    assert!(!colour.fault);
}

#[test]
fn media_wrapped_and_important_rules_are_honoured() {
    let report = run(common::page_with_extra_css(
        "#meme-text { color: black; } @media (min-width: 100px) { #meme-text { color: white } }",
    ));
    assert!(report.all_passed(), "{:#?}", report.failures().collect::<Vec<_>>());

    let report = run(common::page_with_extra_css(
        "p { color: white !important; } #meme-text { color: yellow; }",
    ));
    assert!(report.all_passed(), "{:#?}", report.failures().collect::<Vec<_>>());

    let report = run(common::page_with_extra_css(
        "@media (max-width: 100px) { #meme-text { color: yellow } }",
    ));
    assert!(report.all_passed(), "{:#?}", report.failures().collect::<Vec<_>>());
}

#[test]
fn wrong_border_style_fails_only_its_button() {
    let report = run_with_behaviors("3px dashed red", "3px solid red");
    assert_eq!(failed_checks(&report), vec!["the `fire` button works"]);
    let fire = report.outcome("the `fire` button works").unwrap();
    assert!(fire.error.as_deref().unwrap().contains("3px solid rgb(255, 0, 0)"));
}

#[test]
fn thumbnail_with_wrong_image_is_reported() {
    let report = run_with_behaviors("imgs/meme3.png", "imgs/meme9.png");
    assert_eq!(failed_checks(&report), vec!["each thumbnail swaps the main image"]);
    let thumbnails = report.outcome("each thumbnail swaps the main image").unwrap();
    assert!(thumbnails.error.as_deref().unwrap().contains("meme9"));
}

#[test]
fn empty_text_has_no_volume_to_overlap() {
    let mut session = common::session(common::inline_page());
    session.visit("/").unwrap();
    let rect = session.bounding_rect(contract::MEME_TEXT).unwrap();
    assert_eq!(rect.height, 0.0);
    match check_full_overlap(&mut session, contract::IMAGE_CONTAINER, contract::MEME_TEXT) {
        Err(Error::AssertionFailed { subject, .. }) => {
            assert_eq!(subject, format!("extent of {}", contract::MEME_TEXT))
        }
        other => panic!("expected a collapsed-box failure, got {:?}", other),
    }
}

#[test]
fn text_escaping_the_container_fails_the_overlap_checks() {
    let report = run(common::page_with_extra_css("#meme-text { top: 600px; }"));
    assert_eq!(
        failed_checks(&report),
        vec![
            "a container element hosts the typed text",
            "the text is placed over the uploaded image",
        ]
    );
}

#[test]
fn page_without_scripted_behaviour_fails_the_interactive_checks() {
    let mut session = memeprobe::static_dom::StaticSession::from_html(
        common::inline_page(),
        Behaviors::default(),
    );
    let report = Runner::with_fixtures(common::fixtures()).run(&mut session, &catalog());
    let failed = failed_checks(&report);
    assert!(failed.contains(&"the typed text is visible on the page"));
    assert!(failed.contains(&"the uploaded image is shown in the image element"));
    assert!(failed.contains(&"the `fire` button works"));
    assert!(failed.contains(&"each thumbnail swaps the main image"));
    // plain input and style checks do not depend on page behaviour
    assert!(!failed.contains(&"the text input exists and accepts typed text"));
    assert!(!failed.contains(&"the text has a black 5px 5px 5px shadow"));
}

#[test]
fn checks_do_not_leak_state_into_each_other() {
    let mut session = common::session(common::inline_page());
    let border = scenarios::filtered(Some("border style"));
    let report = Runner::with_fixtures(common::fixtures()).run(&mut session, &border);
    assert!(report.all_passed());

    // the last click left an earth border behind; the next visit starts clean
    session.visit("/").unwrap();
    assert_eq!(
        session
            .computed_style(contract::IMAGE_CONTAINER, "border")
            .unwrap(),
        contract::DEFAULT_BORDER
    );
    assert_eq!(session.value(contract::TEXT_INPUT).unwrap(), "");
}

#[test]
fn missing_fixture_fails_upload_checks() {
    let mut session = common::session(common::inline_page());
    let store = memeprobe::FixtureStore::new(std::env::temp_dir().join("memeprobe-no-fixtures"));
    let report = Runner::with_fixtures(store).run(&mut session, &scenarios::filtered(Some("upload")));
    assert_eq!(report.failed(), 4);
    assert!(report.failures().all(|o| o.fault));
    assert!(report.outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .contains(contract::UPLOAD_FIXTURE));
}
