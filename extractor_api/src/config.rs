use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable pointing to a TOML file read by [`ExtractorConfig::load`].
pub const CONFIG_ENV: &str = "DRAGNET_CONFIG";

#[derive(Deserialize, SmartDefault, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Probe hosts that are not known instances of a self-hosted service.
    /// Without it, unknown hosts are only accepted when the URL asserts the service.
    pub check_instances: bool,
    /// Hosts to treat as known instances, on top of the built-in lists
    pub known_instances: Vec<String>,
    /// Scheme used to talk to self-hosted instances
    #[default = "https"]
    pub instance_scheme: String,
    /// default, probably overriden by extractors
    #[default = "okhttp/4.9.3"]
    pub user_agent: String,
    #[default = 30]
    pub timeout_secs: u64,
    /// Preferred locales, system locale is used when empty
    pub locales: Vec<String>,
}

impl ExtractorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
