use std::sync::LazyLock;

use crate::dialect::Dialect;
use crate::transpiler::rules::RuleSet;

/// MySQL rules.
///
/// Liquibase's generic type names are already MySQL's, so only qualifier
/// stripping applies.
pub static RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::new(Dialect::MySql, Vec::new()));
