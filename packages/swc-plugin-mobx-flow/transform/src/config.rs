use serde::Deserialize;
use swc_core::common::{errors::HANDLER, DUMMY_SP};

/// Package whose `action` and `flow` exports are tracked unless configured otherwise.
pub const DEFAULT_MARKER_PACKAGE: &str = "mobx";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid mobx-flow plugin config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "marker-package", default = "default_marker_package")]
    pub marker_package: String,
}

fn default_marker_package() -> String {
    DEFAULT_MARKER_PACKAGE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker_package: default_marker_package(),
        }
    }
}

impl Config {
    pub fn new(marker_package: impl Into<String>) -> Self {
        Self {
            marker_package: marker_package.into(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        // Hosts pass an empty string when the plugin is listed without options.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode the config handed over by the plugin host.
    ///
    /// A malformed config is reported as a diagnostic on the current
    /// `HANDLER` and the defaults are used, so the build still gets a result.
    pub fn from_plugin_config(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match Self::from_json(&raw) {
            Ok(config) => config,
            Err(err) => {
                let msg = err.to_string();
                HANDLER.with(|handler| handler.struct_span_err(DUMMY_SP, &msg).emit());
                Self::default()
            }
        }
    }
}
