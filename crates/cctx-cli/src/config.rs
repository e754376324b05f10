use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cctx_store::Scope;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CCTX_CONFIG";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Scope used when neither `--local` nor `--in-project` is given.
    pub default_scope: Scope,
    /// Editor command for `cctx edit`.
    pub editor: Option<String>,
    /// Colored terminal output.
    pub color: bool,
    /// `error`, `warn`, `info`, `debug`, or `trace`.
    pub log_level: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_scope: Scope::User,
            editor: None,
            color: true,
            log_level: None,
        }
    }
}

impl CliConfig {
    /// Load from `$CCTX_CONFIG` or the platform config directory. A missing
    /// file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read config {}", path.display()))
            }
        };
        toml::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// The editor to launch: config, then `$VISUAL`, then `$EDITOR`, then `vi`.
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| env::var("VISUAL").ok().filter(|v| !v.is_empty()))
            .or_else(|| env::var("EDITOR").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "vi".to_string())
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs_next::config_dir().map(|dir| dir.join("cctx").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert_eq!(c.default_scope, Scope::User);
        assert!(c.color);
        assert!(c.editor.is_none());
        assert!(c.log_level.is_none());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = CliConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(c, CliConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_scope = \"local\"\neditor = \"nano\"\n").unwrap();

        let c = CliConfig::load_from(&path).unwrap();
        assert_eq!(c.default_scope, Scope::Local);
        assert_eq!(c.editor(), "nano");
        assert!(c.color);
    }

    #[test]
    fn parse_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_scope = \"galaxy\"\n").unwrap();
        assert!(CliConfig::load_from(&path).is_err());
    }
}
