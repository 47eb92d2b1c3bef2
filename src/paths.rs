use std::path::{Path, PathBuf};

pub fn out_gds(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.gds"))
}

pub fn out_params(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.params.json"))
}

pub fn out_offset_plot(work_dir: impl AsRef<Path>, wavelength: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("offset_plot_{wavelength}.png"))
}
