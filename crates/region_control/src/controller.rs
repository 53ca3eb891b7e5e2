use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use shared::{
    domain::RegionProfile,
    error::ControlError,
    protocol::{DaemonResponse, RegionSummary, RegionsResponse, StatusResponse, SwitchResponse},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    active_config::{ActiveConfig, ConfigStore, ACTIVE_CONFIG_FILE},
    catalog::RegionCatalog,
    service::{ServiceAction, ServiceManager},
};

pub const REGIONS_DIR: &str = "regions";
pub const DEFAULT_CONFIG_DIR: &str = "/etc/wireproxy";
pub const DEFAULT_SERVICE_NAME: &str = "wireproxy-proton";
pub const DEFAULT_SOCKS_BIND: &str = "127.0.0.1:25345";
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub config_dir: PathBuf,
    pub service_name: String,
    pub socks_bind_address: String,
    pub status_timeout: Duration,
    pub action_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl ControllerConfig {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            service_name: DEFAULT_SERVICE_NAME.into(),
            socks_bind_address: DEFAULT_SOCKS_BIND.into(),
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    pub fn active_config_path(&self) -> PathBuf {
        self.config_dir.join(ACTIVE_CONFIG_FILE)
    }

    pub fn regions_dir(&self) -> PathBuf {
        self.config_dir.join(REGIONS_DIR)
    }
}

/// Drives region selection and the daemon's running state. All persistent
/// state lives in the active config file and the service manager.
pub struct RegionController {
    config: ControllerConfig,
    catalog: RegionCatalog,
    store: ConfigStore,
    manager: Arc<dyn ServiceManager>,
    // Serialises switch/start/stop; read-only queries never take it.
    mutations: Mutex<()>,
}

impl RegionController {
    pub fn new(config: &ControllerConfig, manager: Arc<dyn ServiceManager>) -> Self {
        Self {
            catalog: RegionCatalog::new(config.regions_dir()),
            store: ConfigStore::new(config.active_config_path()),
            config: config.clone(),
            manager,
            mutations: Mutex::new(()),
        }
    }

    pub fn config_file(&self) -> &Path {
        self.store.path()
    }

    pub async fn is_running(&self) -> bool {
        let name = &self.config.service_name;
        match self
            .manager
            .query_status(name, self.config.status_timeout)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                debug!(service = %name, "daemon reported stopped");
                false
            }
            Err(error) => {
                warn!(
                    service = %name,
                    %error,
                    "could not determine daemon state; reporting not running"
                );
                false
            }
        }
    }

    pub async fn list_regions(&self) -> BTreeMap<String, RegionProfile> {
        self.catalog.list().await
    }

    pub async fn current_region(&self) -> Option<String> {
        self.catalog.current_region_code(&self.store).await
    }

    pub async fn status(&self) -> StatusResponse {
        StatusResponse {
            running: self.is_running().await,
            region: self.current_region().await,
            config_file: self.config_file().display().to_string(),
        }
    }

    pub async fn list_regions_with_current(&self) -> RegionsResponse {
        let regions = self
            .list_regions()
            .await
            .iter()
            .map(|(code, profile)| (code.clone(), RegionSummary::from(profile)))
            .collect();
        RegionsResponse {
            regions,
            current: self.current_region().await,
        }
    }

    /// Points the active config at `requested` and restarts the daemon if it
    /// was running. A failed restart leaves the new config in place.
    pub async fn switch_region(&self, requested: &str) -> Result<SwitchResponse, ControlError> {
        if requested.is_empty() {
            return Err(ControlError::InvalidRequest);
        }

        let _guard = self.mutations.lock().await;

        let regions = self.list_regions().await;
        let Some(profile) = regions.get(requested) else {
            info!(region = %requested, "rejected switch to unknown region");
            return Err(ControlError::UnknownRegion {
                region: requested.to_string(),
                available: regions.keys().cloned().collect(),
            });
        };

        let active = ActiveConfig::new(
            profile.file_path.clone(),
            self.config.socks_bind_address.clone(),
        );
        self.store.write(&active).await.map_err(|error| {
            error!(
                path = %self.store.path().display(),
                %error,
                "failed to write active config"
            );
            ControlError::ConfigWrite(error.to_string())
        })?;

        let was_running = self.is_running().await;
        info!(
            region = %requested,
            profile = %profile.file_path.display(),
            was_running,
            "active region updated"
        );

        if was_running {
            self.manager
                .invoke(
                    ServiceAction::Restart,
                    &self.config.service_name,
                    self.config.action_timeout,
                )
                .await
                .map_err(|error| {
                    error!(
                        service = %self.config.service_name,
                        region = %requested,
                        %error,
                        "restart after region switch failed; config already points at new region"
                    );
                    ControlError::RestartFailed(error.to_string())
                })?;
            info!(service = %self.config.service_name, region = %requested, "daemon restarted");
        }

        Ok(SwitchResponse {
            success: true,
            region: requested.to_string(),
            restarted: was_running,
        })
    }

    pub async fn start_daemon(&self) -> Result<DaemonResponse, ControlError> {
        let _guard = self.mutations.lock().await;

        if !self.store.exists().await {
            return Err(ControlError::NotConfigured);
        }

        self.invoke(ServiceAction::Start)
            .await
            .map_err(ControlError::StartFailed)?;
        Ok(DaemonResponse {
            success: true,
            running: true,
        })
    }

    /// Always asks the service manager to stop; stopping a stopped daemon is
    /// left to its own idempotence.
    pub async fn stop_daemon(&self) -> Result<DaemonResponse, ControlError> {
        let _guard = self.mutations.lock().await;

        self.invoke(ServiceAction::Stop)
            .await
            .map_err(ControlError::StopFailed)?;
        Ok(DaemonResponse {
            success: true,
            running: false,
        })
    }

    async fn invoke(&self, action: ServiceAction) -> Result<(), String> {
        let name = &self.config.service_name;
        match self
            .manager
            .invoke(action, name, self.config.action_timeout)
            .await
        {
            Ok(()) => {
                info!(service = %name, %action, "service action completed");
                Ok(())
            }
            Err(error) => {
                error!(service = %name, %action, %error, "service action failed");
                Err(error.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
