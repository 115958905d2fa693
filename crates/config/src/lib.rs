//! Layered configuration for the crosswiki index.
//!
//! Sources are merged in order, later sources winning:
//! 1. Built-in defaults.
//! 2. A configuration file (TOML, YAML or JSON, picked by extension).
//! 3. Environment variables prefixed with `CROSSWIKI_` (`CROSSWIKI_READ_ONLY=true`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CROSSWIKI_";
const DATABASE_FILENAME: &str = "index.sqlite3";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite index database shared by every site.
    pub database: PathBuf,
    /// Database name of the site this process acts for.
    pub db_name: String,
    /// Refuse every write to the index (e.g. during a database migration).
    pub read_only: bool,
    /// Namespaces whose pages are indexed. Only core namespaces are allowed.
    pub namespaces: Vec<i32>,
    /// Rows per statement for bulk maintenance operations.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            db_name: String::new(),
            read_only: false,
            namespaces: vec![0],
            batch_size: 500,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the optional file and the environment.
    ///
    /// Without an explicit file, the platform config directory is checked for
    /// `config.toml`; a missing default file is not an error.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.map(Path::to_path_buf).or_else(default_config_file);
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// Merged configuration sources, for callers that want to layer more.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = merge_file(figment, path);
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("batch_size must be at least 1"));
        }
        if self.namespaces.iter().any(|ns| !(0..=15).contains(ns)) {
            exn::bail!(ErrorKind::Invalid("namespaces must be between 0 and 15"));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    tracing::debug!(path = %path.display(), "Reading configuration file");
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "crosswiki", "crosswiki")
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME))
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME)).filter(|path| path.is_file())
}
