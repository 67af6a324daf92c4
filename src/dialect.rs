//! Target dialects and change kinds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SiftError;

/// Supported target dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    #[serde(rename = "mssql")]
    SqlServer,
    Oracle,
}

impl Dialect {
    /// Every supported dialect, in reporting order.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::SqlServer, Dialect::Oracle];

    /// Short name used for directories and output files.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::SqlServer => "mssql",
            Dialect::Oracle => "oracle",
        }
    }

    /// Human-readable engine name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::MySql => "MySQL",
            Dialect::SqlServer => "SQL Server",
            Dialect::Oracle => "Oracle",
        }
    }

    /// Liquibase properties file that drives `updateSql` for this dialect.
    ///
    /// The same file carries the schema/catalog bindings the qualifier
    /// resolver strips.
    pub fn properties_file(&self) -> &'static str {
        match self {
            Dialect::MySql => "liquibase-update-mysql.properties",
            Dialect::SqlServer => "liquibase-update-sqlserver.properties",
            Dialect::Oracle => "liquibase-update-oracle.properties",
        }
    }

    /// Location of [`Dialect::properties_file`] under `config_dir`.
    pub fn properties_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(self.properties_file())
    }

    /// Resolve a dialect name, falling back to MySQL for anything unknown.
    pub fn resolve(name: &str) -> Dialect {
        match name.parse() {
            Ok(dialect) => dialect,
            Err(_) => {
                tracing::warn!(requested = name, "unknown dialect, using mysql configuration");
                Dialect::default()
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "mssql" | "sqlserver" | "sql-server" | "tsql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            _ => Err(SiftError::UnknownDialect(s.to_string())),
        }
    }
}

/// Which diffing-tool profile a stream came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// DDL produced by `diffChangeLog`.
    Schema,
    /// Inserts produced by a data-only `generate-changelog`.
    Data,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 2] = [ChangeKind::Schema, ChangeKind::Data];

    /// Working subdirectory name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ChangeKind::Schema => "ddl",
            ChangeKind::Data => "dml",
        }
    }

    /// Changelog file generated for this kind.
    pub fn changelog_file(&self) -> &'static str {
        match self {
            ChangeKind::Schema => "changelog-ddl.xml",
            ChangeKind::Data => "changelog-dml.xml",
        }
    }

    /// Properties file used when generating the changelog.
    pub fn diff_properties_file(&self) -> &'static str {
        match self {
            ChangeKind::Schema => "liquibase-ddl.properties",
            ChangeKind::Data => "liquibase-dml.properties",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Schema => f.write_str("schema"),
            ChangeKind::Data => f.write_str("data"),
        }
    }
}

impl FromStr for ChangeKind {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schema" | "ddl" => Ok(ChangeKind::Schema),
            "data" | "dml" => Ok(ChangeKind::Data),
            _ => Err(SiftError::UnknownChangeKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("SqlServer".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("mssql".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!(" oracle ".parse::<Dialect>().unwrap(), Dialect::Oracle);
        assert!("postgres".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_unknown_falls_back_to_mysql() {
        assert_eq!(Dialect::resolve("db2"), Dialect::MySql);
        assert_eq!(Dialect::resolve("oracle"), Dialect::Oracle);
        assert_eq!(Dialect::resolve("db2").properties_file(), "liquibase-update-mysql.properties");
        assert_eq!(Dialect::default(), Dialect::MySql);
    }

    #[test]
    fn test_properties_path() {
        assert_eq!(
            Dialect::SqlServer.properties_path(Path::new("props")),
            PathBuf::from("props/liquibase-update-sqlserver.properties")
        );
    }

    #[test]
    fn test_names_are_distinct() {
        let names: std::collections::HashSet<_> = Dialect::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(names.len(), Dialect::ALL.len());
    }

    #[test]
    fn test_change_kind() {
        assert_eq!("ddl".parse::<ChangeKind>().unwrap(), ChangeKind::Schema);
        assert_eq!("Data".parse::<ChangeKind>().unwrap(), ChangeKind::Data);
        assert!("both".parse::<ChangeKind>().is_err());
        assert_eq!(ChangeKind::Schema.dir_name(), "ddl");
        assert_eq!(ChangeKind::Data.to_string(), "data");
    }
}
