use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a batch of offset spectrum plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpmConfig {
    /// Directory holding the measurement files; plots are written beneath it.
    pub directory: PathBuf,
    /// File name pattern. `*` matches anything, `{device}` is the device name.
    pub pattern: String,
    pub devices: Vec<String>,
    pub start_wavelength: u32,
    pub end_wavelength: u32,
    pub step: u32,
    pub offset_step: f64,
}

impl Default for SpmConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pattern: String::from("SPM-NA-WG-SERP-{device}-*.0nm-*-18dec23.csv"),
            devices: (0..5).map(|i| format!("L{i}-D0")).collect(),
            start_wavelength: 1500,
            end_wavelength: 1560,
            step: 10,
            offset_step: 0.15,
        }
    }
}

pub fn parse_spm_config(path: impl AsRef<Path>) -> Result<SpmConfig> {
    super::parse_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_devices() {
        let config: SpmConfig = toml::from_str("directory = \"/data/NA-WG-Serp\"").unwrap();
        assert_eq!(config.directory, PathBuf::from("/data/NA-WG-Serp"));
        assert_eq!(config.devices, vec!["L0-D0", "L1-D0", "L2-D0", "L3-D0", "L4-D0"]);
        assert_eq!(config.offset_step, 0.15);
    }
}
