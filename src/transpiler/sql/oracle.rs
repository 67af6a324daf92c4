use std::sync::LazyLock;

use crate::dialect::Dialect;
use crate::transpiler::rules::{Replacement, RewriteRule, RuleSet};

/// Oracle rules, in application order.
pub static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Dialect::Oracle,
        vec![
            // Length semantics default to BYTE unless NLS_LENGTH_SEMANTICS says
            // otherwise; pin every VARCHAR2 to characters.
            RewriteRule::new(
                "varchar2-char",
                "VARCHAR2(n) -> VARCHAR2(n char)",
                r"\bVARCHAR2\s*\(\s*(\d+)\s*\)",
                Replacement::Template("VARCHAR2(${1} char)"),
            ),
            RewriteRule::new(
                "number",
                "DECIMAL -> NUMBER",
                r"\bDECIMAL\b",
                Replacement::Literal("NUMBER"),
            ),
        ],
    )
});
