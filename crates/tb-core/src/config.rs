use crate::error::ConfigError;
use crate::hook::HookOptions;
use crate::links::LinkOptions;
use crate::mutate::DEFAULT_CLOSE_STATUS;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tb_vcs::git::DEFAULT_FETCH_COMMAND;

pub const DEFAULT_CONFIG_PATH: &str = ".ticketbridge/config.toml";
pub const DEFAULT_DB_PATH: &str = ".ticketbridge/tickets.db";
pub const DEFAULT_PORT: u16 = 4830;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

pub const ENV_CONFIG: &str = "TB_CONFIG";
pub const ENV_DB_PATH: &str = "TB_DB_PATH";
pub const ENV_PORT: &str = "TB_PORT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub apitoken: String,
    pub closestatus: String,
    pub browser: Option<String>,
    pub autofetch: bool,
    pub repository_dir: PathBuf,
    pub fetch_command: String,
    pub fetch_timeout_secs: u64,
    pub svn_revmap: Option<PathBuf>,
    pub enable_revmap: bool,
    pub long_tooltips: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            apitoken: String::new(),
            closestatus: String::new(),
            browser: None,
            autofetch: false,
            repository_dir: PathBuf::from("."),
            fetch_command: DEFAULT_FETCH_COMMAND.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            svn_revmap: None,
            enable_revmap: false,
            long_tooltips: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub github: GithubConfig,
    pub server: ServerConfig,
    /// Directory relative paths are resolved against. Not read from the file.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl BridgeConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    message: err.to_string(),
                });
            }
        };
        let mut config = Self::from_toml(&content).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: err.to_string(),
        })
    }

    /// Applies `TB_DB_PATH` and `TB_PORT`. An unparsable port is ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_DB_PATH).ok(),
            std::env::var(ENV_PORT).ok(),
        );
    }

    fn apply_overrides(&mut self, db_path: Option<String>, port: Option<String>) {
        if let Some(db_path) = db_path.filter(|value| !value.is_empty()) {
            self.server.db_path = PathBuf::from(db_path);
        }
        if let Some(port) = port.and_then(|value| value.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn close_status(&self) -> &str {
        let status = self.github.closestatus.trim();
        if status.is_empty() {
            DEFAULT_CLOSE_STATUS
        } else {
            status
        }
    }

    pub fn hook_options(&self, repo_name: &str) -> HookOptions {
        HookOptions {
            close_status: self.close_status().to_string(),
            revmap_enabled: self.github.enable_revmap,
            repo_name: repo_name.to_string(),
        }
    }

    /// `changeset_base` is the path prefix served by the changeset redirect.
    pub fn link_options(&self, changeset_base: &str) -> LinkOptions {
        LinkOptions {
            changeset_base: changeset_base.trim_end_matches('/').to_string(),
            long_tooltips: self.github.long_tooltips,
            revmap_enabled: self.github.enable_revmap,
        }
    }

    pub fn browser(&self) -> Option<&str> {
        self.github
            .browser
            .as_deref()
            .map(str::trim)
            .filter(|browser| !browser.is_empty())
    }

    pub fn repository_dir(&self) -> PathBuf {
        self.resolve(&self.github.repository_dir)
    }

    pub fn revmap_path(&self) -> Option<PathBuf> {
        self.github.svn_revmap.as_deref().map(|path| self.resolve(path))
    }

    /// The configured revmap source, which must exist.
    pub fn require_revmap_file(&self) -> Result<PathBuf, ConfigError> {
        let Some(path) = self.revmap_path() else {
            return Err(ConfigError::MissingRevmapFile {
                path: "<unset>".to_string(),
            });
        };
        if !path.is_file() {
            return Err(ConfigError::MissingRevmapFile {
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.github.fetch_timeout_secs)
    }

    /// Empty token means the webhook lives at plain `/github`.
    pub fn token_matches(&self, token: Option<&str>) -> bool {
        let expected = self.github.apitoken.trim();
        match token {
            Some(token) => !expected.is_empty() && token == expected,
            None => expected.is_empty(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
