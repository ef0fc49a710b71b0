//! Scenario catalog for the meme generator page.
//!
//! A scenario groups checks that share a page-load precondition. The runner
//! re-applies that precondition before every single check, so no check sees
//! state left behind by another.

use crate::assertions::{expect_attr_matches, expect_css, expect_value, expect_visible};
use crate::contract::{self, BorderPreset, BORDER_PRESETS};
use crate::driver::{
    check_typed_text_is_visible, meme_upload, type_text, type_text_and_check_its_position,
};
use crate::fixture::FixtureStore;
use crate::geometry::check_full_overlap;
use crate::session::PageSession;
use crate::{Error, Result, Viewport};

/// Body of a check.
pub type CheckFn = fn(&mut dyn PageSession, &FixtureStore) -> Result<()>;

/// One pass/fail assertion against a freshly loaded page.
#[derive(Clone)]
pub struct Check {
    pub name: &'static str,
    pub run: CheckFn,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish()
    }
}

/// Page-load precondition shared by a scenario's checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setup {
    pub viewport: Viewport,
    /// Force a full reload after the visit so styles are recomputed
    pub reload: bool,
}

impl Setup {
    fn visit() -> Self {
        Self {
            viewport: Viewport::default(),
            reload: false,
        }
    }

    fn visit_and_reload() -> Self {
        Self {
            reload: true,
            ..Self::visit()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub setup: Setup,
    pub checks: Vec<Check>,
}

/// Every scenario, in the order they are run.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "text input overlays text on the chosen image",
            setup: Setup::visit(),
            checks: vec![
                Check {
                    name: "the text input exists and accepts typed text",
                    run: |s, _| type_text(s),
                },
                Check {
                    name: "the typed text is visible on the page",
                    run: |s, _| {
                        type_text(s)?;
                        check_typed_text_is_visible(s)
                    },
                },
                Check {
                    name: "a container element hosts the typed text",
                    run: |s, _| {
                        type_text(s)?;
                        check_typed_text_is_visible(s)?;
                        check_full_overlap(s, contract::IMAGE_CONTAINER, contract::MEME_TEXT)
                    },
                },
            ],
        },
        Scenario {
            name: "image upload from the user's computer",
            setup: Setup::visit(),
            checks: vec![
                Check {
                    name: "an image can be uploaded through the upload control",
                    run: |s, f| meme_upload(s, f),
                },
                Check {
                    name: "the uploaded image is shown in the image element",
                    run: |s, f| {
                        meme_upload(s, f)?;
                        expect_visible(s, contract::MEME_IMAGE)
                    },
                },
                Check {
                    name: "the uploaded image is rendered",
                    run: check_uploaded_image_rendered,
                },
                Check {
                    name: "the text is placed over the uploaded image",
                    run: |s, f| {
                        meme_upload(s, f)?;
                        expect_visible(s, contract::MEME_IMAGE)?;
                        type_text_and_check_its_position(s, contract::MEME_IMAGE, contract::MEME_TEXT)
                    },
                },
            ],
        },
        Scenario {
            name: "image container frame",
            setup: Setup::visit_and_reload(),
            checks: vec![
                Check {
                    name: "the container has a white background",
                    run: |s, _| {
                        expect_css(s, contract::IMAGE_CONTAINER, "background-color", contract::WHITE)
                    },
                },
                Check {
                    name: "the container has a 1px solid black border",
                    run: |s, _| {
                        expect_css(s, contract::IMAGE_CONTAINER, "border", contract::DEFAULT_BORDER)
                    },
                },
                Check {
                    name: "the uploaded image is fully inside the container",
                    run: |s, f| {
                        meme_upload(s, f)?;
                        check_full_overlap(s, contract::IMAGE_CONTAINER, contract::MEME_IMAGE)
                    },
                },
            ],
        },
        Scenario {
            name: "meme text colour, shadow and size",
            setup: Setup::visit_and_reload(),
            checks: vec![
                Check {
                    name: "the text has a black 5px 5px 5px shadow",
                    run: |s, _| expect_css(s, contract::MEME_TEXT, "text-shadow", contract::TEXT_SHADOW),
                },
                Check {
                    name: "the text font size is 30px",
                    run: |s, _| {
                        expect_css(s, contract::MEME_TEXT, "font-size", contract::TEXT_FONT_SIZE)
                    },
                },
                Check {
                    name: "the text is white",
                    run: |s, _| expect_css(s, contract::MEME_TEXT, "color", contract::WHITE),
                },
            ],
        },
        Scenario {
            name: "text length limit",
            setup: Setup::visit_and_reload(),
            checks: vec![
                Check {
                    name: "typing 61 characters keeps the first 60",
                    run: |s, _| {
                        s.type_text(contract::TEXT_INPUT, contract::OVERLONG_TEXT)?;
                        expect_value(s, contract::TEXT_INPUT, contract::TRUNCATED_TEXT)
                    },
                },
                Check {
                    name: "typing exactly 60 characters is accepted verbatim",
                    run: |s, _| {
                        s.type_text(contract::TEXT_INPUT, contract::TRUNCATED_TEXT)?;
                        expect_value(s, contract::TEXT_INPUT, contract::TRUNCATED_TEXT)
                    },
                },
            ],
        },
        Scenario {
            name: "border style buttons",
            setup: Setup::visit(),
            checks: vec![
                Check {
                    name: "the `fire` button works",
                    run: |s, _| check_border_preset(s, &BORDER_PRESETS[0]),
                },
                Check {
                    name: "the `water` button works",
                    run: |s, _| check_border_preset(s, &BORDER_PRESETS[1]),
                },
                Check {
                    name: "the `earth` button works",
                    run: |s, _| check_border_preset(s, &BORDER_PRESETS[2]),
                },
            ],
        },
        Scenario {
            name: "preset meme thumbnails",
            setup: Setup::visit(),
            checks: vec![Check {
                name: "each thumbnail swaps the main image",
                run: |s, _| check_thumbnails(s),
            }],
        },
    ]
}

/// Scenarios whose name contains `filter` (case-insensitive).
pub fn filtered(filter: Option<&str>) -> Vec<Scenario> {
    let all = catalog();
    match filter {
        None => all,
        Some(f) => {
            let f = f.to_lowercase();
            all.into_iter()
                .filter(|s| s.name.to_lowercase().contains(&f))
                .collect()
        }
    }
}

fn check_border_preset(session: &mut dyn PageSession, preset: &BorderPreset) -> Result<()> {
    expect_css(session, preset.selector, "background-color", preset.background_color)?;
    session.click(preset.selector)?;
    expect_css(session, contract::IMAGE_CONTAINER, "border", preset.border)
}

fn check_thumbnails(session: &mut dyn PageSession) -> Result<()> {
    for index in 1..=contract::THUMBNAIL_COUNT {
        session.click(&contract::thumbnail_selector(index))?;
        expect_attr_matches(
            session,
            contract::MEME_IMAGE,
            "src",
            &contract::thumbnail_src_pattern(index),
        )?;
    }
    Ok(())
}

/// After the upload the image element shows a new, non-empty source.
fn check_uploaded_image_rendered(
    session: &mut dyn PageSession,
    fixtures: &FixtureStore,
) -> Result<()> {
    let before = session.attribute(contract::MEME_IMAGE, "src")?;
    meme_upload(session, fixtures)?;
    expect_visible(session, contract::MEME_IMAGE)?;
    let after = session.attribute(contract::MEME_IMAGE, "src")?;
    match after {
        Some(src) if !src.is_empty() && Some(&src) != before.as_ref() => Ok(()),
        other => Err(Error::assertion(
            format!("src of {}", contract::MEME_IMAGE),
            "a new image source after upload",
            format!("{:?}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_shape() {
        let all = catalog();
        assert_eq!(all.len(), 7);
        let checks: usize = all.iter().map(|s| s.checks.len()).sum();
        assert_eq!(checks, 19);
        assert!(all.iter().all(|s| s.setup.viewport == Viewport::default()));
    }

    #[test]
    fn style_scenarios_force_a_reload() {
        let reloads: Vec<_> = catalog()
            .into_iter()
            .filter(|s| s.setup.reload)
            .map(|s| s.name)
            .collect();
        assert_eq!(
            reloads,
            vec![
                "image container frame",
                "meme text colour, shadow and size",
                "text length limit"
            ]
        );
    }

    #[test]
    fn filter_by_name() {
        assert_eq!(filtered(Some("BORDER")).len(), 1);
        assert_eq!(filtered(Some("nothing like this")).len(), 0);
        assert_eq!(filtered(None).len(), 7);
    }
}
