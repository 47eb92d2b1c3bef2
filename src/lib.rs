pub use anyhow::{anyhow, Result};

pub mod blocks;
pub mod cli;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod paths;
pub mod spm;

pub const BUILD_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

#[cfg(test)]
pub mod tests {
    use std::path::PathBuf;

    use super::BUILD_PATH;

    pub(crate) fn test_work_dir(name: &str) -> PathBuf {
        PathBuf::from(BUILD_PATH).join(name)
    }
}
