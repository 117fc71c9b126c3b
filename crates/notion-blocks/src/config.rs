use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBED_HOST: &str = "https://tube.rvere.com";
pub const DEFAULT_STYLE_ELEMENT_ID: &str = "notion-toggle-styles";

fn default_embed_host() -> String {
    DEFAULT_EMBED_HOST.to_string()
}

fn default_style_element_id() -> String {
    DEFAULT_STYLE_ELEMENT_ID.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    /// Origin serving `/embed?v=<id>` frames for video blocks.
    #[serde(default = "default_embed_host")]
    pub embed_host: String,
    #[serde(default = "default_style_element_id")]
    pub style_element_id: String,
    #[serde(default = "default_true")]
    pub toggle_open_by_default: bool,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            embed_host: default_embed_host(),
            style_element_id: default_style_element_id(),
            toggle_open_by_default: true,
        }
    }
}

impl ShortcutConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn with_defaults(mut self) -> Self {
        self.embed_host = self.embed_host.trim().trim_end_matches('/').to_string();
        if self.embed_host.is_empty() {
            self.embed_host = default_embed_host();
        }
        if self.style_element_id.trim().is_empty() {
            self.style_element_id = default_style_element_id();
        }
        self
    }
}
