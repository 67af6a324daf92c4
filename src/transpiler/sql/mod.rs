//! Per-dialect rule sets.

pub mod mysql;
pub mod oracle;
pub mod sqlserver;
