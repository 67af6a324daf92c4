use std::sync::LazyLock;

use crate::dialect::Dialect;
use crate::transpiler::rules::{Replacement, RewriteRule, RuleSet};

/// SQL Server rules, in application order.
pub static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Dialect::SqlServer,
        vec![
            // Word boundaries keep an existing nvarchar from becoming nnvarchar.
            RewriteRule::new(
                "nvarchar",
                "varchar -> nvarchar",
                r"\bvarchar\b",
                Replacement::Literal("nvarchar"),
            ),
            RewriteRule::new(
                "ntext",
                "varchar (max) / varchar(MAX) -> ntext",
                r"(?P<open>\[)?\bn?varchar(?P<close>\])?\s*\(\s*(?i:max)\s*\)",
                Replacement::Template("${open}ntext${close}"),
            ),
            // datetime2, smalldatetime and datetimeoffset are left alone.
            RewriteRule::new(
                "datetime2",
                "datetime -> datetime2",
                r"\bdatetime\b",
                Replacement::Literal("datetime2"),
            ),
        ],
    )
});
