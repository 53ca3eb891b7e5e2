use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use shared::domain::{region_code_from_path, RegionProfile};
use tracing::warn;

use crate::active_config::ConfigStore;

/// Directory-backed view of the available regions. Nothing is cached; every
/// call lists the directory again.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions_dir: PathBuf,
}

impl RegionCatalog {
    pub fn new(regions_dir: impl Into<PathBuf>) -> Self {
        Self {
            regions_dir: regions_dir.into(),
        }
    }

    pub fn regions_dir(&self) -> &Path {
        &self.regions_dir
    }

    /// Region code to profile. A missing directory yields an empty map. When
    /// two files derive the same code, whichever the directory listing yields
    /// last wins.
    pub async fn list(&self) -> BTreeMap<String, RegionProfile> {
        match self.scan().await {
            Ok(regions) => regions,
            Err(error) if error.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                warn!(
                    regions_dir = %self.regions_dir.display(),
                    %error,
                    "failed to list region profiles"
                );
                BTreeMap::new()
            }
        }
    }

    async fn scan(&self) -> io::Result<BTreeMap<String, RegionProfile>> {
        let mut regions = BTreeMap::new();
        let mut entries = tokio::fs::read_dir(&self.regions_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(profile) = RegionProfile::from_path(self.regions_dir.join(entry.file_name()))
            else {
                continue;
            };
            regions.insert(profile.code.clone(), profile);
        }
        Ok(regions)
    }

    /// The code derived from the profile path recorded in the active config.
    /// The referenced file is not checked for existence or catalog membership.
    pub async fn current_region_code(&self, store: &ConfigStore) -> Option<String> {
        let config = match store.read().await {
            Ok(config) => config?,
            Err(error) => {
                warn!(
                    path = %store.path().display(),
                    %error,
                    "failed to read active config"
                );
                return None;
            }
        };
        region_code_from_path(&config.wg_config_path?)
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
