use serde::Deserialize;
use serde_json::{json, Value};

/// Card options as injected by the dashboard configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CardConfig {
    #[serde(default)]
    pub name: Option<String>,
}

impl CardConfig {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GlyphSet {
    Ascii,
    #[default]
    Unicode,
}

#[derive(Debug)]
pub struct Settings {
    /// Card configuration as injected by the dashboard, validated on instantiation.
    pub card: Value,
    pub glyphs: GlyphSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            card: json!({}),
            glyphs: GlyphSet::default(),
        }
    }
}
