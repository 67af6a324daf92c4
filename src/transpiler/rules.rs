//! Rewrite rules and ordered rule sets.

use regex::{Captures, NoExpand, Regex};

use crate::dialect::Dialect;

/// How a matched span is rewritten.
#[derive(Debug, Clone, Copy)]
pub enum Replacement {
    /// Insert the text as-is.
    Literal(&'static str),
    /// Expand `$1` / `${name}` capture references.
    Template(&'static str),
    /// Compute the replacement from the captures.
    Custom(fn(&Captures<'_>) -> String),
}

/// A single pattern → replacement rewrite.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: &'static str,
    pub description: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl RewriteRule {
    /// Build a rule from a pattern known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex.
    pub fn new(
        name: &'static str,
        description: &'static str,
        pattern: &str,
        replacement: Replacement,
    ) -> Self {
        let pattern = Regex::new(pattern).unwrap_or_else(|e| panic!("rule '{name}': {e}"));
        Self {
            name,
            description,
            pattern,
            replacement,
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> Replacement {
        self.replacement
    }

    /// Rewrite every match in `sql`.
    pub fn apply(&self, sql: &str) -> String {
        match self.replacement {
            Replacement::Literal(text) => self.pattern.replace_all(sql, NoExpand(text)).into_owned(),
            Replacement::Template(template) => self.pattern.replace_all(sql, template).into_owned(),
            Replacement::Custom(f) => self.pattern.replace_all(sql, |caps: &Captures<'_>| f(caps)).into_owned(),
        }
    }
}

/// The ordered rules of one dialect.
#[derive(Debug)]
pub struct RuleSet {
    pub dialect: Dialect,
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(dialect: Dialect, rules: Vec<RewriteRule>) -> Self {
        Self { dialect, rules }
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn is_identity(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order.
    pub fn apply(&self, sql: &str) -> String {
        self.rules
            .iter()
            .fold(sql.to_string(), |acc, rule| rule.apply(&acc))
    }
}
