//! Schema/catalog qualifier discovery and stripping.
//!
//! Liquibase fully qualifies every object it touches (`dbo.users`,
//! `SCHEMA1.T1`). The target scripts must use bare names, so the names bound
//! in the dialect's properties file are collected and removed again.

use std::fs;
use std::path::Path;

use crate::dialect::Dialect;
use crate::error::{SiftError, SiftResult};

/// Substring that marks a schema/catalog binding line.
pub const DEFAULT_QUALIFIER_KEY: &str = "db";

/// The qualifiers to strip for one dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaQualifiers {
    names: Vec<String>,
    patterns: Vec<String>,
}

impl SchemaQualifiers {
    /// Build from explicit qualifier names. Blank names are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut qualifiers = Self::default();
        for name in names {
            qualifiers.push(name.into());
        }
        qualifiers
    }

    fn push(&mut self, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() || self.names.contains(&name) {
            return;
        }
        // Quoted forms first so the bare pattern never eats into them.
        self.patterns.push(format!("[{name}]."));
        self.patterns.push(format!("\"{name}\"."));
        self.patterns.push(format!("`{name}`."));
        self.patterns.push(format!("{name}."));
        self.names.push(name);
    }

    /// Parse `key: value` lines, keeping the value of every line that
    /// contains `key_marker` anywhere (`defaultSchemaName: dbo` matches `db`
    /// through its value).
    pub fn parse(content: &str, key_marker: &str) -> Self {
        let mut qualifiers = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if !line.contains(key_marker) {
                continue;
            }
            if let Some((_, value)) = line.split_once(':') {
                qualifiers.push(value.to_string());
            }
        }
        qualifiers
    }

    /// Read a properties file.
    pub fn load(path: &Path, key_marker: &str) -> SiftResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SiftError::Properties {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content, key_marker))
    }

    /// Read the dialect's properties from `config_dir`.
    ///
    /// An unreadable file is logged and yields no qualifiers, so statements
    /// pass through with their prefixes intact.
    pub fn resolve(dialect: Dialect, config_dir: &Path, key_marker: &str) -> Self {
        let path = dialect.properties_path(config_dir);
        match Self::load(&path, key_marker) {
            Ok(qualifiers) => {
                tracing::debug!(%dialect, names = ?qualifiers.names, "resolved schema qualifiers");
                qualifiers
            }
            Err(e) => {
                tracing::warn!(%dialect, stage = "qualifiers", "{}; qualifiers will not be stripped", e);
                Self::default()
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Remove every `<qualifier>.` prefix.
    ///
    /// Repeats until nothing matches, so removing one prefix can never leave
    /// another behind.
    pub fn strip(&self, sql: &str) -> String {
        let mut out = sql.to_string();
        loop {
            let before = out.len();
            for pattern in &self.patterns {
                if out.contains(pattern.as_str()) {
                    out = out.replace(pattern.as_str(), "");
                }
            }
            if out.len() == before {
                return out;
            }
        }
    }
}
