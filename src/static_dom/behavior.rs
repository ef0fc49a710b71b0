//! Declarative stand-ins for the page's own scripts.
//!
//! The static DOM runs no JavaScript, so the reactions the page would wire up
//! (mirroring typed text, previewing an upload, restyling on click) are
//! declared here and applied by the session when the matching action happens.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A change applied to the document when a trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    SetStyle {
        target: String,
        property: String,
        value: String,
    },
    SetAttribute {
        target: String,
        name: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickBehavior {
    pub trigger: String,
    pub effects: Vec<Effect>,
}

/// Copy an input's value into another element's text after each keystroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMirror {
    pub input: String,
    pub target: String,
}

/// Show the selected file in an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPreview {
    pub input: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Behaviors {
    pub clicks: Vec<ClickBehavior>,
    pub mirrors: Vec<TextMirror>,
    pub uploads: Vec<UploadPreview>,
}

impl Behaviors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `effect` to the effects fired by clicking `trigger`.
    pub fn on_click(mut self, trigger: &str, effect: Effect) -> Self {
        match self.clicks.iter_mut().find(|c| c.trigger == trigger) {
            Some(existing) => existing.effects.push(effect),
            None => self.clicks.push(ClickBehavior {
                trigger: trigger.to_string(),
                effects: vec![effect],
            }),
        }
        self
    }

    pub fn mirror_text(mut self, input: &str, target: &str) -> Self {
        self.mirrors.push(TextMirror {
            input: input.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn preview_upload(mut self, input: &str, image: &str) -> Self {
        self.uploads.push(UploadPreview {
            input: input.to_string(),
            image: image.to_string(),
        });
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ConfigError(format!("behaviors: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read behaviors {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl Effect {
    pub fn set_style(target: &str, property: &str, value: &str) -> Self {
        Effect::SetStyle {
            target: target.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn set_attribute(target: &str, name: &str, value: &str) -> Self {
        Effect::SetAttribute {
            target: target.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
