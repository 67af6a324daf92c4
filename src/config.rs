//! Run configuration loaded from `sqlsift.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::{SiftError, SiftResult};
use crate::extract::Markers;
use crate::qualifier::DEFAULT_QUALIFIER_KEY;

/// File name searched for in the working directory and the user config dir.
pub const CONFIG_FILE: &str = "sqlsift.toml";

/// Everything a pipeline run needs, passed explicitly to every worker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Root of changelogs, temp files and outputs.
    pub work_dir: PathBuf,
    /// Directory holding the Liquibase properties files.
    pub config_dir: PathBuf,
    /// Target dialect names, resolved leniently.
    pub dialects: Vec<String>,
    /// Keep the raw tool output after extraction.
    pub keep_temp: bool,
    /// Substring that marks schema/catalog binding lines.
    pub qualifier_key: String,
    pub tool: ToolConfig,
    pub markers: Markers,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("workdir"),
            config_dir: PathBuf::from("config"),
            dialects: vec![Dialect::MySql.name().to_string()],
            keep_temp: false,
            qualifier_key: DEFAULT_QUALIFIER_KEY.to_string(),
            tool: ToolConfig::default(),
            markers: Markers::default(),
        }
    }
}

/// How to launch the diffing tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub command: String,
    /// Arguments placed before the generated ones (e.g. `--logLevel=info`).
    pub extra_args: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: "liquibase".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> SiftResult<Self> {
        let config: RunConfig =
            toml::from_str(content).map_err(|e| SiftError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> SiftResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SiftError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load the run configuration.
    ///
    /// An explicit path must exist. Otherwise `./sqlsift.toml`, then
    /// `<config dir>/sqlsift/sqlsift.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> SiftResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in Self::search_paths() {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlsift").join(CONFIG_FILE));
        }
        paths
    }

    fn validate(&self) -> SiftResult<()> {
        if self.tool.command.trim().is_empty() {
            return Err(SiftError::Config("tool.command must not be empty".to_string()));
        }
        if self.markers.changeset.is_empty() || self.markers.terminator.is_empty() {
            return Err(SiftError::Config(
                "markers.changeset and markers.terminator must not be empty".to_string(),
            ));
        }
        if self.markers.insert_keyword.is_empty() {
            return Err(SiftError::Config("markers.insert_keyword must not be empty".to_string()));
        }
        if self.qualifier_key.is_empty() {
            return Err(SiftError::Config("qualifier_key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the configured dialect names.
    ///
    /// Unknown names fall back to MySQL; duplicates are dropped so that no
    /// two workers ever write the same paths.
    pub fn target_dialects(&self) -> Vec<Dialect> {
        let mut dialects = Vec::new();
        for name in &self.dialects {
            let dialect = Dialect::resolve(name);
            if dialects.contains(&dialect) {
                tracing::warn!(%dialect, requested = %name, "dialect listed twice, ignoring duplicate");
                continue;
            }
            dialects.push(dialect);
        }
        dialects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config.work_dir, PathBuf::from("workdir"));
        assert_eq!(config.tool.command, "liquibase");
        assert_eq!(config.markers, Markers::default());
        assert_eq!(config.target_dialects(), vec![Dialect::MySql]);
    }

    #[test]
    fn test_full_document() {
        let config = RunConfig::from_toml(
            r#"
work_dir = "/tmp/sift"
config_dir = "props"
dialects = ["mysql", "mssql", "oracle"]
keep_temp = true

[tool]
command = "/opt/liquibase/liquibase"
extra_args = ["--logLevel=info"]

[markers]
changeset = "-- Changeset"
"#,
        )
        .unwrap();

        assert_eq!(config.work_dir, PathBuf::from("/tmp/sift"));
        assert!(config.keep_temp);
        assert_eq!(config.tool.extra_args, vec!["--logLevel=info".to_string()]);
        assert_eq!(config.markers.changeset, "-- Changeset");
        assert_eq!(config.markers.terminator, "INSERT INTO");
        assert_eq!(
            config.target_dialects(),
            vec![Dialect::MySql, Dialect::SqlServer, Dialect::Oracle]
        );
        assert_eq!(config.config_dir, PathBuf::from("props"));
    }

    #[test]
    fn test_unknown_and_duplicate_dialects() {
        let config = RunConfig::from_toml(r#"dialects = ["oracle", "db2", "mysql", "Oracle"]"#).unwrap();
        assert_eq!(config.target_dialects(), vec![Dialect::Oracle, Dialect::MySql]);
    }

    #[test]
    fn test_rejects_empty_markers() {
        let err = RunConfig::from_toml("[markers]\nterminator = \"\"\n").unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(RunConfig::from_toml("dialects = mysql").is_err());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(RunConfig::load(Some(&missing)).is_err());

        let present = dir.path().join(CONFIG_FILE);
        fs::write(&present, "dialects = [\"oracle\"]\n").unwrap();
        let config = RunConfig::load(Some(&present)).unwrap();
        assert_eq!(config.target_dialects(), vec![Dialect::Oracle]);
    }
}
