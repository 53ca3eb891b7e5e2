use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const ACTIVE_CONFIG_FILE: &str = "proton.conf";

const WG_CONFIG_KEY: &str = "WGConfig";
const BIND_ADDRESS_KEY: &str = "BindAddress";

/// The single file wireproxy reads to decide which profile to load and where
/// to expose its SOCKS5 listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    pub wg_config_path: Option<PathBuf>,
    pub socks_bind_address: Option<String>,
}

impl ActiveConfig {
    pub fn new(wg_config_path: impl Into<PathBuf>, socks_bind_address: impl Into<String>) -> Self {
        Self {
            wg_config_path: Some(wg_config_path.into()),
            socks_bind_address: Some(socks_bind_address.into()),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("# Proton VPN Configuration\n# Managed by proton-ctl API\n\n");
        if let Some(path) = &self.wg_config_path {
            out.push_str(&format!("{WG_CONFIG_KEY} = {}\n", path.display()));
        }
        if let Some(bind) = &self.socks_bind_address {
            out.push_str(&format!("\n[Socks5]\n{BIND_ADDRESS_KEY} = {bind}\n"));
        }
        out
    }

    /// Line-prefix scan; the first matching line for each key wins and any
    /// other content is ignored.
    pub fn parse(content: &str) -> Self {
        Self {
            wg_config_path: prefixed_value(content, WG_CONFIG_KEY).map(PathBuf::from),
            socks_bind_address: prefixed_value(content, BIND_ADDRESS_KEY),
        }
    }
}

fn prefixed_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// `Ok(None)` when the file has never been written.
    pub async fn read(&self) -> io::Result<Option<ActiveConfig>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(ActiveConfig::parse(&content))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Overwrites the file in place and restricts it to the owner. A new file
    /// is created owner-only; an existing one is tightened before rewriting.
    pub async fn write(&self, config: &ActiveConfig) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if self.exists().await {
            restrict_to_owner(&self.path).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;
        file.write_all(config.render().as_bytes()).await?;
        file.flush().await?;
        drop(file);

        restrict_to_owner(&self.path).await?;
        debug!(path = %self.path.display(), "active config written");
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_config_round_trips_through_line_scan() {
        let config = ActiveConfig::new("/etc/wireproxy/regions/proton-jp.conf", "127.0.0.1:25345");
        let rendered = config.render();

        assert!(rendered.starts_with("# Proton VPN Configuration\n"));
        assert!(rendered.contains("\nWGConfig = /etc/wireproxy/regions/proton-jp.conf\n"));
        assert!(rendered.contains("\n[Socks5]\nBindAddress = 127.0.0.1:25345\n"));
        assert_eq!(ActiveConfig::parse(&rendered), config);
    }

    #[test]
    fn parse_takes_first_wg_config_line() {
        let parsed = ActiveConfig::parse(
            "# comment\nWGConfig = /a/proton-us.conf\nWGConfig = /b/proton-nl.conf\n",
        );
        assert_eq!(
            parsed.wg_config_path,
            Some(PathBuf::from("/a/proton-us.conf"))
        );
        assert_eq!(parsed.socks_bind_address, None);
    }

    #[test]
    fn parse_ignores_comments_and_indented_keys() {
        let parsed = ActiveConfig::parse("# WGConfig = /nope.conf\n  WGConfig = /also-nope.conf\n");
        assert_eq!(parsed.wg_config_path, None);
    }

    #[tokio::test]
    async fn store_reports_missing_file_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join(ACTIVE_CONFIG_FILE));
        assert!(!store.exists().await);
        assert_eq!(store.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn store_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("nested").join(ACTIVE_CONFIG_FILE));

        store
            .write(&ActiveConfig::new("/r/proton-jp.conf", "127.0.0.1:1"))
            .await
            .expect("first write");
        store
            .write(&ActiveConfig::new("/r/proton-us.conf", "127.0.0.1:2"))
            .await
            .expect("second write");

        let read = store.read().await.expect("read").expect("present");
        assert_eq!(read.wg_config_path, Some(PathBuf::from("/r/proton-us.conf")));
        assert_eq!(read.socks_bind_address.as_deref(), Some("127.0.0.1:2"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join(ACTIVE_CONFIG_FILE));
        store
            .write(&ActiveConfig::new("/r/proton-jp.conf", "127.0.0.1:1"))
            .await
            .expect("write");

        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rewriting_a_world_readable_file_tightens_it() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(ACTIVE_CONFIG_FILE);
        std::fs::write(&path, "WGConfig = /old/proton-us.conf\n").expect("seed");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

        let store = ConfigStore::new(&path);
        store
            .write(&ActiveConfig::new("/r/proton-jp.conf", "127.0.0.1:1"))
            .await
            .expect("write");

        let mode = std::fs::metadata(&path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        let read = store.read().await.expect("read").expect("present");
        assert_eq!(read.wg_config_path, Some(PathBuf::from("/r/proton-jp.conf")));
    }
}
