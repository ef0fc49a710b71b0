//! Very small block layout for the static DOM
//!
//! - Blocks stack vertically inside their parent's content box
//! - `position: absolute|fixed` boxes are placed from `top`/`left` and take
//!   no space in the flow
//! - Content-box sizing: `width`/`height` exclude border and padding
//! - Text height comes from the font size (0.5em per character, 1.2em lines)
//! - Images without a `src` have no box

use super::document::Document;
use crate::geometry::Rect;
use crate::Viewport;

const REPLACED_WIDTH: f64 = 300.0;
const REPLACED_HEIGHT: f64 = 150.0;

struct Frame {
    /// Where the next in-flow box starts
    flow_top: f64,
    flow_left: f64,
    available_width: f64,
    /// Content-box origin that positioned children are offset from
    origin_top: f64,
    origin_left: f64,
}

/// Compute a bounding box for every element of `doc`, indexed like the
/// document's element arena. Elements that are not rendered get an empty box.
pub fn layout_document(doc: &Document, viewport: Viewport) -> Vec<Rect> {
    let mut rects = vec![Rect::default(); doc.len()];
    if doc.is_empty() {
        return rects;
    }

    let frame = Frame {
        flow_top: 0.0,
        flow_left: 0.0,
        available_width: viewport.width as f64,
        origin_top: 0.0,
        origin_left: 0.0,
    };
    place(doc, 0, &frame, &mut rects);
    // The root box always covers at least the viewport
    rects[0].width = rects[0].width.max(viewport.width as f64);
    rects[0].height = rects[0].height.max(viewport.height as f64);
    rects
}

fn text_height(text: &str, font_px: f64, content_width: f64) -> f64 {
    let chars = text.split_whitespace().collect::<Vec<_>>().join(" ").chars().count();
    if chars == 0 {
        return 0.0;
    }
    let char_width = font_px * 0.5;
    let per_line = ((content_width / char_width).floor() as usize).max(1);
    let lines = chars.div_ceil(per_line);
    lines as f64 * font_px * 1.2
}

/// Lay out `idx` and its subtree; returns the height it takes in the flow.
fn place(doc: &Document, idx: usize, frame: &Frame, rects: &mut Vec<Rect>) -> f64 {
    if doc.computed_style(idx, "display") == "none" {
        rects[idx] = Rect::new(frame.flow_top, frame.flow_left, 0.0, 0.0);
        return 0.0;
    }

    let el = doc.element(idx);
    let positioned = matches!(
        doc.computed_style(idx, "position").as_str(),
        "absolute" | "fixed"
    );
    let (top, left) = if positioned {
        (
            frame.origin_top + doc.length_px(idx, "top").unwrap_or(0.0),
            frame.origin_left + doc.length_px(idx, "left").unwrap_or(0.0),
        )
    } else {
        (frame.flow_top, frame.flow_left)
    };

    if el.tag == "img" && el.attr("src").map_or(true, |s| s.trim().is_empty()) {
        rects[idx] = Rect::new(top, left, 0.0, 0.0);
        return 0.0;
    }

    let border = crate::static_dom::css::parse_px(&doc.computed_style(idx, "border-width"))
        .unwrap_or(0.0);
    let padding = doc.length_px(idx, "padding").unwrap_or(0.0);
    let chrome = 2.0 * (border + padding);

    let attr_px = |name: &str| el.attr(name).and_then(|v| v.trim().parse::<f64>().ok());
    let explicit_width = doc.length_px(idx, "width").or_else(|| attr_px("width"));
    let explicit_height = doc.length_px(idx, "height").or_else(|| attr_px("height"));

    let content_width = match (explicit_width, el.tag.as_str()) {
        (Some(w), _) => w,
        (None, "img") => REPLACED_WIDTH,
        (None, _) => (frame.available_width - chrome).max(0.0),
    };
    let content_top = top + border + padding;
    let content_left = left + border + padding;

    let font_px = doc.font_size_px(idx);
    let mut cursor = content_top;
    match el.tag.as_str() {
        "img" => {}
        "input" | "select" => cursor += font_px * 1.2,
        _ => cursor += text_height(&el.own_text(), font_px, content_width),
    }

    let child_frame_origin = (content_top, content_left);
    let children: Vec<usize> = el.children().collect();
    for child in children {
        let child_frame = Frame {
            flow_top: cursor,
            flow_left: content_left,
            available_width: content_width,
            origin_top: child_frame_origin.0,
            origin_left: child_frame_origin.1,
        };
        cursor += place(doc, child, &child_frame, rects);
    }

    let content_height = match (explicit_height, el.tag.as_str()) {
        (Some(h), _) => h,
        (None, "img") => REPLACED_HEIGHT,
        (None, _) => cursor - content_top,
    };

    let rect = Rect::new(top, left, content_width + chrome, content_height + chrome);
    rects[idx] = rect;
    if positioned {
        0.0
    } else {
        rect.height
    }
}
