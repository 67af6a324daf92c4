//! Working directory layout.
//!
//! ```text
//! <root>/changelog/changelog-{ddl,dml}.xml
//! <root>/{ddl,dml}/temp/<dialect>/update.temp
//! <root>/{ddl,dml}/out/<dialect>/<dialect>.sql
//! ```
//!
//! Every (kind, dialect) pair gets its own temp and out directory, so workers
//! never touch each other's files.

use std::path::{Path, PathBuf};

use crate::dialect::{ChangeKind, Dialect};
use crate::error::{SiftError, SiftResult};

const TEMP_FILE: &str = "update.temp";

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn changelog_dir(&self) -> PathBuf {
        self.root.join("changelog")
    }

    pub fn changelog_file(&self, kind: ChangeKind) -> PathBuf {
        self.changelog_dir().join(kind.changelog_file())
    }

    pub fn temp_dir(&self, kind: ChangeKind, dialect: Dialect) -> PathBuf {
        self.root.join(kind.dir_name()).join("temp").join(dialect.name())
    }

    pub fn temp_file(&self, kind: ChangeKind, dialect: Dialect) -> PathBuf {
        self.temp_dir(kind, dialect).join(TEMP_FILE)
    }

    pub fn out_dir(&self, kind: ChangeKind, dialect: Dialect) -> PathBuf {
        self.root.join(kind.dir_name()).join("out").join(dialect.name())
    }

    pub fn out_file(&self, kind: ChangeKind, dialect: Dialect) -> PathBuf {
        self.out_dir(kind, dialect).join(format!("{}.sql", dialect.name()))
    }
}

/// Remove `dir` if it exists, then create it (and its parents) empty.
pub async fn clear_or_make_dir(dir: &Path) -> SiftResult<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SiftError::io(format!("clearing {}", dir.display()), e)),
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SiftError::io(format!("creating {}", dir.display()), e))
}
