use serde::{Deserialize, Serialize};
use sheen_formatter::FormatterOptions;
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "sheen.config.json";

/// Options for one compile pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Location of the stylesheet; relative resource urls resolve against it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// One indentation step
    #[serde(default = "default_indent")]
    pub indent: String,

    /// Directory `data-uri` loads files from. Without it, `data-uri` keeps
    /// the plain url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<String>,
}

fn default_indent() -> String {
    "  ".to_string()
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            indent: default_indent(),
            resource_dir: None,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load options from a JSON file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(Self::from_json(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// `sheen.config.json` in `dir`
    pub fn load_from_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load(dir.as_ref().join(DEFAULT_CONFIG_NAME))
    }

    pub fn formatter_options(&self) -> FormatterOptions {
        FormatterOptions {
            indent: self.indent.clone(),
        }
    }
}
