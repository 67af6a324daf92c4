//! # sqlsift
//!
//! Turns Liquibase `updateSql` output into clean, dialect-specific scripts.
//!
//! A run diffs a reference database into changelogs, asks Liquibase to render
//! them as SQL for every target dialect, then keeps only the statements that
//! belong to real change sets and rewrites them for the target engine.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlsift::prelude::*;
//!
//! let translator = Translator::new(Dialect::Oracle, SchemaQualifiers::new(["SCHEMA1"]));
//! let sql = translator.translate_line("ALTER TABLE SCHEMA1.T1 ADD COL1 VARCHAR2(100)");
//! assert_eq!(sql, "ALTER TABLE T1 ADD COL1 VARCHAR2(100 char)");
//! ```
//!
//! ## Stages
//!
//! | Stage     | Module                       | Does                                |
//! |-----------|------------------------------|-------------------------------------|
//! | Generate  | [`tool`]                     | Runs the diffing tool               |
//! | Extract   | [`extract`]                  | Drops banners and bookkeeping lines |
//! | Translate | [`transpiler`]               | Per-dialect rewrites                |
//! | Qualify   | [`qualifier`]                | Strips schema/catalog prefixes      |
//! | Fan out   | [`pipeline`]                 | One worker per (kind, dialect)      |

pub mod config;
pub mod dialect;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod qualifier;
pub mod tool;
pub mod transpiler;
pub mod workdir;

pub mod prelude {
    pub use crate::config::{RunConfig, ToolConfig};
    pub use crate::dialect::{ChangeKind, Dialect};
    pub use crate::error::*;
    pub use crate::extract::{ExtractedStatement, Markers, StatementExtractor};
    pub use crate::pipeline::{Pipeline, RunReport, Stage, WorkerOutcome, WorkerStatus};
    pub use crate::qualifier::SchemaQualifiers;
    pub use crate::tool::{Invocation, LiquibaseRunner, ToolRunner};
    pub use crate::transpiler::{TranslatedStatement, Translator};
    pub use crate::workdir::WorkDir;
}

/// Extract and translate one in-memory `updateSql` stream.
///
/// # Example
///
/// ```
/// use sqlsift::prelude::*;
///
/// let raw = "-- Changeset a.xml::1::bob\nCREATE TABLE dbo.t (c datetime)\nINSERT INTO DATABASECHANGELOG VALUES (1)\n";
/// let out = sqlsift::translate_stream(raw, ChangeKind::Schema, Dialect::SqlServer, &SchemaQualifiers::new(["dbo"]));
/// assert_eq!(out, vec!["CREATE TABLE t (c datetime2)".to_string()]);
/// ```
pub fn translate_stream(
    raw: &str,
    kind: dialect::ChangeKind,
    dialect: dialect::Dialect,
    qualifiers: &qualifier::SchemaQualifiers,
) -> Vec<String> {
    let mut extractor = extract::StatementExtractor::new(kind, dialect, extract::Markers::default());
    let translator = transpiler::Translator::new(dialect, qualifiers.clone());
    extractor
        .extract(raw)
        .map(|line| translator.translate_line(line))
        .collect()
}
