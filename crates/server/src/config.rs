use std::{fs, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use region_control::controller::{
    ControllerConfig, DEFAULT_CONFIG_DIR, DEFAULT_SERVICE_NAME, DEFAULT_SOCKS_BIND,
};
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "proton-ctl.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub config_dir: String,
    pub service_name: String,
    pub socks_bind_address: String,
    pub systemctl_path: String,
    pub status_timeout_secs: u64,
    pub action_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8081".into(),
            config_dir: DEFAULT_CONFIG_DIR.into(),
            service_name: DEFAULT_SERVICE_NAME.into(),
            socks_bind_address: DEFAULT_SOCKS_BIND.into(),
            systemctl_path: "systemctl".into(),
            status_timeout_secs: 5,
            action_timeout_secs: 30,
        }
    }
}

/// Optional overrides read from the settings file. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    config_dir: Option<String>,
    service_name: Option<String>,
    socks_bind_address: Option<String>,
    systemctl_path: Option<String>,
    status_timeout_secs: Option<u64>,
    action_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            config_dir: PathBuf::from(&self.config_dir),
            service_name: self.service_name.clone(),
            socks_bind_address: self.socks_bind_address.clone(),
            status_timeout: Duration::from_secs(self.status_timeout_secs),
            action_timeout: Duration::from_secs(self.action_timeout_secs),
        }
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat settings file, then environment variables.
pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(file = SETTINGS_FILE, %error, "ignoring unparsable settings file"),
        }
    }

    if let Some(v) = env("PROTON_CONFIG_DIR") {
        settings.config_dir = v;
    }
    if let Some(v) = env("APP__CONFIG_DIR") {
        settings.config_dir = v;
    }

    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.config_dir {
        settings.config_dir = v;
    }
    if let Some(v) = file_cfg.service_name {
        settings.service_name = v;
    }
    if let Some(v) = file_cfg.socks_bind_address {
        settings.socks_bind_address = v;
    }
    if let Some(v) = file_cfg.systemctl_path {
        settings.systemctl_path = v;
    }
    if let Some(v) = file_cfg.status_timeout_secs.filter(|v| *v > 0) {
        settings.status_timeout_secs = v;
    }
    if let Some(v) = file_cfg.action_timeout_secs.filter(|v| *v > 0) {
        settings.action_timeout_secs = v;
    }
}

/// The control surface has no authentication, so it only ever listens on
/// loopback.
pub fn resolve_bind_addr(raw: &str) -> anyhow::Result<SocketAddr> {
    let addr: SocketAddr = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid bind address '{raw}'"))?;
    if !addr.ip().is_loopback() {
        bail!("refusing to bind non-loopback address {addr}");
    }
    Ok(addr)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
