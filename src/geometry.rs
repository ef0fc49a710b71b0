//! Geometry checker: decides whether one rendered element sits fully over
//! another.
//!
//! Containment is symmetric. The same check is used for "image
//! inside frame" and "text inside image", and either box may be the larger
//! one, so each axis passes when one interval nests inside the other in
//! either direction.

use crate::session::PageSession;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// An element's bounding box in CSS pixels.
///
/// `bottom` and `right` are derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// True when the box spans some area on both axes.
    pub fn has_volume(&self) -> bool {
        self.right() != self.left && self.top != self.bottom()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[top {} left {} bottom {} right {}]",
            self.top,
            self.left,
            self.bottom(),
            self.right()
        )
    }
}

/// One vertical interval nests inside the other.
pub fn is_on_same_horizontal(first: &Rect, second: &Rect) -> bool {
    (first.top >= second.top && first.bottom() <= second.bottom())
        || (second.top >= first.top && second.bottom() <= first.bottom())
}

/// One horizontal interval nests inside the other.
pub fn is_on_same_vertical(first: &Rect, second: &Rect) -> bool {
    (first.left >= second.left && first.right() <= second.right())
        || (second.left >= first.left && second.right() <= first.right())
}

/// Full overlap: nested on both axes.
pub fn is_over_each_other(background: &Rect, forefront: &Rect) -> bool {
    is_on_same_horizontal(background, forefront) && is_on_same_vertical(background, forefront)
}

/// Read an element's box straight from the session.
pub fn measure(session: &mut dyn PageSession, selector: &str) -> Result<Rect> {
    let rect = session.bounding_rect(selector)?;
    debug!("measured {} at {}", selector, rect);
    Ok(rect)
}

/// Assert that `forefront` lies fully over `background` and is not collapsed.
///
/// Both rectangles are read fresh, immediately before the comparison.
pub fn check_full_overlap(
    session: &mut dyn PageSession,
    background_selector: &str,
    forefront_selector: &str,
) -> Result<()> {
    let background = measure(session, background_selector)?;
    let forefront = measure(session, forefront_selector)?;

    if !is_over_each_other(&background, &forefront) {
        return Err(Error::assertion(
            format!("{} over {}", forefront_selector, background_selector),
            format!("a box nested with {}", background),
            forefront,
        ));
    }

    if !forefront.has_volume() {
        return Err(Error::assertion(
            format!("extent of {}", forefront_selector),
            "a box with non-zero width and height",
            forefront,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.bottom(), 50.0);
        assert_eq!(r.right(), 50.0);
    }

    #[test]
    fn nested_boxes_overlap_in_both_directions() {
        let frame = Rect::new(0.0, 0.0, 500.0, 500.0);
        let text = Rect::new(10.0, 10.0, 200.0, 36.0);
        assert!(is_over_each_other(&frame, &text));
        assert!(is_over_each_other(&text, &frame));
    }

    #[test]
    fn identical_boxes_overlap() {
        let a = Rect::new(1.0, 1.0, 500.0, 500.0);
        assert!(is_over_each_other(&a, &a));
    }

    #[test]
    fn disjoint_boxes_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(200.0, 200.0, 50.0, 50.0);
        assert!(!is_over_each_other(&a, &b));
    }

    #[test]
    fn partial_overlap_fails_one_axis() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        // vertically nested, horizontally sticking out on the right
        let b = Rect::new(10.0, 50.0, 100.0, 20.0);
        assert!(is_on_same_horizontal(&a, &b));
        assert!(!is_on_same_vertical(&a, &b));
        assert!(!is_over_each_other(&a, &b));
    }

    #[test]
    fn crossing_boxes_pass_per_axis() {
        // tall-narrow vs wide-short: each axis nests, but in opposite directions
        let tall = Rect::new(0.0, 40.0, 20.0, 100.0);
        let wide = Rect::new(40.0, 0.0, 100.0, 20.0);
        assert!(is_on_same_horizontal(&tall, &wide));
        assert!(is_on_same_vertical(&tall, &wide));
        // axes are judged independently
        assert!(is_over_each_other(&tall, &wide));
    }

    #[test]
    fn collapsed_box_has_no_volume() {
        assert!(!Rect::new(5.0, 5.0, 0.0, 10.0).has_volume());
        assert!(!Rect::new(5.0, 5.0, 10.0, 0.0).has_volume());
        assert!(Rect::new(5.0, 5.0, 1.0, 1.0).has_volume());
    }
}
