//! Statement extraction from raw `updateSql` output.
//!
//! Liquibase interleaves the statements we want with its own bookkeeping:
//! changeset banners, lock handling and inserts into its tracking tables.
//! The extractor never parses SQL. It is a line classifier with one bit of
//! state for schema streams and none for data streams.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::dialect::{ChangeKind, Dialect};
use crate::error::{SiftError, SiftResult};

/// Literal markers the extractor looks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Banner that opens a genuine change set.
    pub changeset: String,
    /// Start of the tool's own tracking insert, which closes a change set.
    pub terminator: String,
    /// Keyword a data line must contain.
    pub insert_keyword: String,
    /// Tracking tables whose rows never reach the output.
    pub bookkeeping_tables: Vec<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            changeset: "Changeset".to_string(),
            terminator: "INSERT INTO".to_string(),
            insert_keyword: "INSERT INTO".to_string(),
            bookkeeping_tables: vec![
                "DATABASECHANGELOGLOCK".to_string(),
                "DATABASECHANGELOG".to_string(),
            ],
        }
    }
}

impl Markers {
    fn is_bookkeeping(&self, line: &str) -> bool {
        self.bookkeeping_tables
            .iter()
            .any(|table| !table.is_empty() && line.contains(table.as_str()))
    }
}

/// Scanner state for schema streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Waiting for a changeset banner.
    Seeking,
    /// Inside a change set, emitting lines until the terminator.
    Capturing,
}

/// A raw statement line that survived extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStatement {
    pub kind: ChangeKind,
    pub dialect: Dialect,
    pub sql: String,
}

/// Line classifier for one (kind, dialect) stream.
#[derive(Debug, Clone)]
pub struct StatementExtractor {
    kind: ChangeKind,
    dialect: Dialect,
    markers: Markers,
    state: ScanState,
}

impl StatementExtractor {
    pub fn new(kind: ChangeKind, dialect: Dialect, markers: Markers) -> Self {
        Self {
            kind,
            dialect,
            markers,
            state: ScanState::Seeking,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one line; returns true when the line is a statement to keep.
    pub fn accept(&mut self, line: &str) -> bool {
        match self.kind {
            ChangeKind::Schema => self.accept_schema(line),
            ChangeKind::Data => self.accept_data(line),
        }
    }

    fn accept_schema(&mut self, line: &str) -> bool {
        match self.state {
            ScanState::Seeking => {
                if line.contains(self.markers.changeset.as_str()) {
                    self.state = ScanState::Capturing;
                }
                false
            }
            ScanState::Capturing => {
                if line.contains(self.markers.terminator.as_str()) {
                    self.state = ScanState::Seeking;
                    false
                } else {
                    true
                }
            }
        }
    }

    fn accept_data(&self, line: &str) -> bool {
        line.contains(self.markers.insert_keyword.as_str()) && !self.markers.is_bookkeeping(line)
    }

    /// Extract every statement line from an in-memory stream, in order.
    pub fn extract<'a>(&mut self, raw: &'a str) -> impl Iterator<Item = &'a str> {
        raw.lines().filter(move |line| self.accept(line))
    }

    /// Extract from a buffered reader, tagging each line with kind and dialect.
    pub fn extract_from<R: BufRead>(&mut self, reader: R) -> SiftResult<Vec<ExtractedStatement>> {
        let mut statements = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| SiftError::io("reading raw update output", e))?;
            if self.accept(&line) {
                statements.push(ExtractedStatement {
                    kind: self.kind,
                    dialect: self.dialect,
                    sql: line,
                });
            }
        }
        Ok(statements)
    }
}
