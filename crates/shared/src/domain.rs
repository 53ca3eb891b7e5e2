use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension every connection profile in the regions directory carries.
pub const PROFILE_EXTENSION: &str = ".conf";

/// The region code is whatever follows the last separator in a profile stem.
pub const CODE_SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub code: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl RegionProfile {
    /// Builds a profile from a file path, or `None` when the file name does not
    /// end in [`PROFILE_EXTENSION`].
    pub fn from_path(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_name()?.to_str()?;
        if !file_name.ends_with(PROFILE_EXTENSION) {
            return None;
        }
        let code = region_code_from_file_name(file_name);
        Some(Self {
            display_name: code.to_uppercase(),
            code,
            file_path,
        })
    }
}

/// `proton-jp.conf` -> `jp`, `us.conf` -> `us`, `a-b-nl.conf` -> `nl`.
pub fn region_code_from_file_name(file_name: &str) -> String {
    let stem = file_name
        .strip_suffix(PROFILE_EXTENSION)
        .unwrap_or(file_name);
    match stem.rsplit_once(CODE_SEPARATOR) {
        Some((_, code)) => code.to_string(),
        None => stem.to_string(),
    }
}

/// Derives a region code from a full path using only its final component.
pub fn region_code_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    Some(region_code_from_file_name(file_name))
}
