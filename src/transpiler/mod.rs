//! Dialect translation for extracted statements.
//!
//! Each dialect owns an ordered [`RuleSet`]; the [`Translator`] applies it
//! and then strips schema qualifiers. Rules are plain text rewrites, never a
//! parse.

pub mod rules;
pub mod sql;


use std::fmt;

use crate::dialect::{ChangeKind, Dialect};
use crate::error::{SiftError, SiftResult};
use crate::extract::ExtractedStatement;
use crate::qualifier::SchemaQualifiers;

pub use rules::{Replacement, RewriteRule, RuleSet};

impl Dialect {
    /// The ordered rewrite rules for this dialect.
    pub fn rule_set(&self) -> &'static RuleSet {
        match self {
            Dialect::MySql => &sql::mysql::RULES,
            Dialect::SqlServer => &sql::sqlserver::RULES,
            Dialect::Oracle => &sql::oracle::RULES,
        }
    }
}

/// A statement after every rule of its dialect has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedStatement {
    pub kind: ChangeKind,
    pub dialect: Dialect,
    pub sql: String,
}

impl fmt::Display for TranslatedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Applies one dialect's rules followed by qualifier stripping.
#[derive(Debug, Clone)]
pub struct Translator {
    dialect: Dialect,
    rules: &'static RuleSet,
    qualifiers: SchemaQualifiers,
}

impl Translator {
    pub fn new(dialect: Dialect, qualifiers: SchemaQualifiers) -> Self {
        Self {
            dialect,
            rules: dialect.rule_set(),
            qualifiers,
        }
    }

    /// Translate a single line of SQL.
    pub fn translate_line(&self, sql: &str) -> String {
        let rewritten = self.rules.apply(sql);
        if self.qualifiers.is_empty() {
            rewritten
        } else {
            self.qualifiers.strip(&rewritten)
        }
    }

    /// Translate an extracted statement, refusing statements of another dialect.
    pub fn translate(&self, statement: ExtractedStatement) -> SiftResult<TranslatedStatement> {
        if statement.dialect != self.dialect {
            return Err(SiftError::DialectMismatch {
                expected: self.dialect,
                found: statement.dialect,
            });
        }
        Ok(TranslatedStatement {
            kind: statement.kind,
            dialect: self.dialect,
            sql: self.translate_line(&statement.sql),
        })
    }
}
