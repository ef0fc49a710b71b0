//! Interaction driver: the user actions the scenarios perform.
//!
//! None of these reset the page. Callers visit (or reload) first so every
//! action starts from a known state.

use crate::assertions::{expect_text_visible, expect_value};
use crate::contract::{
    MEME_INSERT, TEXT_INPUT, TYPED_TEXT, TYPED_TEXT_PATTERN, UPLOAD_FIXTURE, UPLOAD_MIME,
};
use crate::fixture::FixtureStore;
use crate::geometry::check_full_overlap;
use crate::session::PageSession;
use crate::Result;
use log::debug;

/// Type the fixed meme text and check the input holds it verbatim.
pub fn type_text(session: &mut dyn PageSession) -> Result<()> {
    debug!("typing {:?} into {}", TYPED_TEXT, TEXT_INPUT);
    session.type_text(TEXT_INPUT, TYPED_TEXT)?;
    expect_value(session, TEXT_INPUT, TYPED_TEXT)
}

/// The typed text shows up, exactly and visibly, somewhere on the page.
pub fn check_typed_text_is_visible(session: &mut dyn PageSession) -> Result<()> {
    expect_text_visible(session, TYPED_TEXT_PATTERN)
}

/// Select the `meme.jpeg` fixture on the upload control.
pub fn meme_upload(session: &mut dyn PageSession, fixtures: &FixtureStore) -> Result<()> {
    let fixture = fixtures.load(UPLOAD_FIXTURE)?.with_mime(UPLOAD_MIME);
    debug!("uploading {} into {}", fixture.name, MEME_INSERT);
    session.upload_file(MEME_INSERT, &fixture)
}

/// Type, check the text is visible, then check `child` sits over `container`.
pub fn type_text_and_check_its_position(
    session: &mut dyn PageSession,
    container: &str,
    child: &str,
) -> Result<()> {
    type_text(session)?;
    check_typed_text_is_visible(session)?;
    check_full_overlap(session, container, child)
}
