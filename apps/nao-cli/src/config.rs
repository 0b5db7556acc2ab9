use anyhow::{ensure, Context, Result};
use event_bridge::{DEFAULT_TOUCH_SENSOR, DEFAULT_VOCABULARY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Module name every subscription is registered under
    pub module_name: String,
    pub vocabulary: Vec<String>,
    pub word_spotting: bool,
    pub touch_sensor: String,
    /// Spoken when a behavior fails
    pub error_phrase: String,
    /// Pause between simulated stimuli on the mock platform
    pub stimulus_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: "RobertaBridge".to_string(),
            vocabulary: DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect(),
            word_spotting: true,
            touch_sensor: DEFAULT_TOUCH_SENSOR.to_string(),
            error_phrase: "Error!".to_string(),
            stimulus_interval_ms: 200,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing yaml: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating config: {}", path.display()))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.module_name.trim().is_empty(), "module_name is empty");
        ensure!(!self.vocabulary.is_empty(), "vocabulary is empty");
        ensure!(!self.touch_sensor.trim().is_empty(), "touch_sensor is empty");
        Ok(())
    }
}
