use anyhow::Result;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::blocks::directional_coupler::DirectionalCouplerParams;
use crate::blocks::edge_coupler::EdgeCouplerParams;

pub mod spm;

pub use spm::{parse_spm_config, SpmConfig};

/// Reads a TOML file into any parameter type. Missing keys take their defaults.
pub fn parse_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

pub fn parse_edge_coupler_config(path: impl AsRef<Path>) -> Result<EdgeCouplerParams> {
    parse_config(path)
}

pub fn parse_directional_coupler_config(
    path: impl AsRef<Path>,
) -> Result<DirectionalCouplerParams> {
    parse_config(path)
}
