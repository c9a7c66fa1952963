use crate::error::ESResult;
use derive_more::Display;
use directories::ProjectDirs;
use error_stack::ResultExt;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub static PROJECT_DIRS: LazyLock<ProjectDirs> = LazyLock::new(|| {
    ProjectDirs::from("dev", "setup-jdk", "setup-jdk")
        .expect("Could not determine project directories")
});

static CONFIG_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PROJECT_DIRS.preference_dir().join("config.toml"));

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display("Could not access config file")]
    Io,
    #[display("Could not parse config file")]
    Parse,
}

impl Error for ConfigError {}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetupConfig {
    /// Distribution used when none is given on the command line or in a version file.
    #[serde(default)]
    pub default_distribution: Option<String>,
    /// Toolcache root used when `RUNNER_TOOL_CACHE` is unset.
    #[serde(default)]
    pub toolcache_dir: Option<PathBuf>,
    /// Token for GitHub API requests, used when `GITHUB_TOKEN` is unset.
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(skip)]
    pub(crate) path: PathBuf,
}

impl SetupConfig {
    pub fn load() -> ESResult<SetupConfig, ConfigError> {
        Self::load_from(&CONFIG_PATH)
    }

    pub fn load_from(path: &Path) -> ESResult<SetupConfig, ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .change_context(ConfigError::Io)
                .attach_with(|| format!("Could not create config directory at {:?}", parent))?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .change_context(ConfigError::Io)
            .attach_with(|| format!("Could not open config file at {:?}", path))?;
        let contents = std::fs::read_to_string(path)
            .change_context(ConfigError::Io)
            .attach_with(|| format!("Could not read config file at {:?}", path))?;
        let mut config: SetupConfig = toml::from_str(&contents)
            .change_context(ConfigError::Parse)
            .attach_with(|| format!("Could not parse config file at {:?}", path))?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Edit the file in place, keeping comments and layout, then reload.
    pub fn edit_config(
        &mut self,
        edit: impl FnOnce(&mut toml_edit::DocumentMut),
    ) -> ESResult<(), ConfigError> {
        let contents = std::fs::read_to_string(&self.path)
            .change_context(ConfigError::Io)
            .attach_with(|| format!("Could not read config file at {:?}", self.path))?;
        let mut doc = contents
            .parse::<toml_edit::DocumentMut>()
            .change_context(ConfigError::Parse)
            .attach_with(|| format!("Could not parse config file at {:?}", self.path))?;
        edit(&mut doc);
        std::fs::write(&self.path, doc.to_string())
            .change_context(ConfigError::Io)
            .attach_with(|| format!("Could not write config file to {:?}", self.path))?;
        *self = Self::load_from(&self.path)?;
        Ok(())
    }
}
