//! The meme generator page contract: element ids and the values the page is
//! expected to produce.

pub const TEXT_INPUT: &str = "#text-input";
pub const MEME_TEXT: &str = "#meme-text";
pub const IMAGE_CONTAINER: &str = "#meme-image-container";
pub const MEME_IMAGE: &str = "#meme-image";
pub const MEME_INSERT: &str = "#meme-insert";

/// Literal typed by the text scenarios.
pub const TYPED_TEXT: &str = "My awesome meme";
/// Anchored pattern the typed text must match as rendered content.
pub const TYPED_TEXT_PATTERN: &str = r"^My awesome meme$";

pub const MAX_TEXT_LENGTH: usize = 60;
/// Sixty-one characters, one over the limit.
pub const OVERLONG_TEXT: &str = "I have written a line that has precisely sixty-one characters";
/// What the input must hold after typing [`OVERLONG_TEXT`].
pub const TRUNCATED_TEXT: &str = "I have written a line that has precisely sixty-one character";

pub const UPLOAD_FIXTURE: &str = "meme.jpeg";
pub const UPLOAD_MIME: &str = "image/jpeg";

pub const WHITE: &str = "rgb(255, 255, 255)";
pub const DEFAULT_BORDER: &str = "1px solid rgb(0, 0, 0)";
pub const TEXT_SHADOW: &str = "rgb(0, 0, 0) 5px 5px 5px";
pub const TEXT_FONT_SIZE: &str = "30px";

/// A border toggle button and what clicking it must do to the container.
#[derive(Debug, Clone, Copy)]
pub struct BorderPreset {
    pub selector: &'static str,
    pub background_color: &'static str,
    pub border: &'static str,
}

pub const BORDER_PRESETS: [BorderPreset; 3] = [
    BorderPreset {
        selector: "#fire",
        background_color: "rgb(255, 0, 0)",
        border: "3px dashed rgb(255, 0, 0)",
    },
    BorderPreset {
        selector: "#water",
        background_color: "rgb(0, 0, 255)",
        border: "5px double rgb(0, 0, 255)",
    },
    BorderPreset {
        selector: "#earth",
        background_color: "rgb(0, 128, 0)",
        border: "6px groove rgb(0, 128, 0)",
    },
];

/// Preset thumbnails `#meme-1`..`#meme-4`.
pub const THUMBNAIL_COUNT: usize = 4;

pub fn thumbnail_selector(index: usize) -> String {
    format!("#meme-{}", index)
}

/// Pattern the main image `src` must match after clicking thumbnail `index`.
pub fn thumbnail_src_pattern(index: usize) -> String {
    format!(r"imgs/meme{}\.png$", index)
}
