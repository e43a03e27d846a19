use std::path::Path;

use anyhow::Context;
use burrow_coord::CoordinatorConfig;
use burrow_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Settings read from the `--config` file. Missing sections and keys take
/// their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurrowConfig {
    pub coordinator: CoordinatorConfig,
    pub store: StoreConfig,
}

impl BurrowConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        if config.store.max_batch_ops == 0 {
            anyhow::bail!("store.max_batch_ops must be at least 1");
        }
        Ok(config)
    }
}
