use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::page::Lang;

pub const CONFIG_FILE: &str = "embed.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("unsupported default_lang {0:?}")]
    UnsupportedLang(String),
    #[error("failed to read catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] game_core::CatalogError),
    #[error("unknown argument {0:?} (expected --paths)")]
    UnknownArgument(String),
}

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    /// Print every servable game page and exit.
    PrintPaths,
}

impl Command {
    /// Parses arguments after the program name.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, ConfigError> {
        let mut command = Command::Serve;
        for arg in args {
            match arg.as_str() {
                "--paths" => command = Command::PrintPaths,
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }
        Ok(command)
    }
}

/// Server settings, read from `embed.toml` and then `EMBED_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// JSON catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,
    pub default_lang: String,
    pub site_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            catalog_path: None,
            default_lang: "en".to_string(),
            site_name: "Educational Games".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Self {
        let mut config = Self::load_file(Path::new(CONFIG_FILE));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Missing or unparsable files fall back to defaults.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "loaded configuration");
                    cfg
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), "failed to parse config: {err}, using defaults");
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "failed to read config: {err}, using defaults");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(addr) = var("EMBED_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(path) = var("EMBED_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(lang) = var("EMBED_DEFAULT_LANG") {
            self.default_lang = lang;
        }
        if let Some(name) = var("EMBED_SITE_NAME") {
            self.site_name = name;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.lang()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(self.listen_addr.clone()))
    }

    pub fn lang(&self) -> Result<Lang, ConfigError> {
        Lang::parse(&self.default_lang)
            .ok_or_else(|| ConfigError::UnsupportedLang(self.default_lang.clone()))
    }
}
