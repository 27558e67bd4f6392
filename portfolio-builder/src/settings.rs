use serde::Deserialize;

use portfolio::error;
use portfolio::error::{Chainable, Result};
use portfolio::remote::RemoteSettings;

/// Environment variables with this prefix override [`Settings`] fields, e.g.
/// `PORTFOLIO_BUILDER_BRANCH=dev`.
pub const ENV_PREFIX: &str = "PORTFOLIO_BUILDER_";

#[derive(Default, Debug, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub remote: RemoteSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> Result<Self> {
        let fields: serde_json::Map<String, serde_json::Value> = vars.into_iter()
            .filter_map(|(key, value)| {
                let field = key.strip_prefix(ENV_PREFIX)?.to_ascii_lowercase();
                Some((field, value.into()))
            })
            .collect();

        serde_json::from_value(fields.into()).chain_with(|| error! {
            "invalid settings in environment",
            "prefix" => ENV_PREFIX,
        })
    }
}
