use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Result};
use crate::value::{Dict, Format, Source, Yaml};

/// The user's site configuration.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Which remote template (and schema) the configuration targets.
    #[serde(default)]
    pub template_id: String,
    /// Data shared by every page. Its presence switches rendering to go
    /// through `base.html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Arc<Dict>>,
    /// Page name to page context.
    #[serde(default)]
    pub pages: Dict,
    /// Collection name to collection definition.
    #[serde(default)]
    pub collections: Dict,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = path.try_read::<Arc<str>>().chain_with(|| error! {
            [ConfigRead] "error reading config file",
            "path" => path.display(),
            "hint" => "run with --template <id> first to download a config file",
        })?;

        Self::from_yaml(&text).chain_with(|| error! {
            [ConfigParse] "error parsing config file",
            "path" => path.display(),
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Yaml::from_str(text).map_err(|e| error!([ConfigParse] "invalid YAML", e))
    }

    /// The JSON document validated against the template's schema.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
