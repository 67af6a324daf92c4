//! Invocation of the external diffing tool.
//!
//! The pipeline only needs "run these arguments, give me the output". The
//! [`ToolRunner`] trait is that seam; [`LiquibaseRunner`] spawns the real
//! process.

use std::future::Future;
use std::path::Path;

use tokio::process::Command;

use crate::config::ToolConfig;
use crate::dialect::{ChangeKind, Dialect};
use crate::error::{SiftError, SiftResult};
use crate::workdir::WorkDir;

/// Lines of tool output kept in a failure message.
const FAILURE_TAIL_LINES: usize = 20;

/// One tool invocation: a stage label for logs plus the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(stage: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            stage: stage.into(),
            args,
        }
    }

    /// Generate the changelog for `kind` by diffing the reference database.
    pub fn diff_changelog(kind: ChangeKind, workdir: &WorkDir, config_dir: &Path) -> Self {
        let changelog = format!("--changeLogFile={}", workdir.changelog_file(kind).display());
        let defaults = format!(
            "--defaultsFile={}",
            config_dir.join(kind.diff_properties_file()).display()
        );
        match kind {
            ChangeKind::Schema => Self::new(
                "diffChangeLog",
                vec![changelog, defaults, "diffChangeLog".to_string()],
            ),
            ChangeKind::Data => Self::new(
                "generate-changelog",
                vec![
                    "--diff-types=data".to_string(),
                    changelog,
                    defaults,
                    format!("--dataOutputDirectory={}", workdir.changelog_dir().display()),
                    "generate-changelog".to_string(),
                ],
            ),
        }
    }

    /// Render the changelog for `kind` as SQL in `dialect`'s flavour.
    pub fn update_sql(kind: ChangeKind, dialect: Dialect, workdir: &WorkDir, config_dir: &Path) -> Self {
        Self::new(
            "updateSql",
            vec![
                format!("--changeLogFile={}", workdir.changelog_file(kind).display()),
                format!("--defaultsFile={}", dialect.properties_path(config_dir).display()),
                "updateSql".to_string(),
            ],
        )
    }
}

/// Runs the diffing tool and returns its combined output.
pub trait ToolRunner: Send + Sync + 'static {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = SiftResult<String>> + Send;
}

/// Spawns the configured Liquibase executable.
#[derive(Debug, Clone)]
pub struct LiquibaseRunner {
    command: String,
    extra_args: Vec<String>,
}

impl LiquibaseRunner {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            command: config.command.clone(),
            extra_args: config.extra_args.clone(),
        }
    }
}

impl ToolRunner for LiquibaseRunner {
    async fn run(&self, invocation: &Invocation) -> SiftResult<String> {
        tracing::debug!(command = %self.command, args = ?invocation.args, "running {}", invocation.stage);

        let output = Command::new(&self.command)
            .args(&self.extra_args)
            .args(&invocation.args)
            .output()
            .await
            .map_err(|source| SiftError::ToolSpawn {
                command: self.command.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        tracing::debug!(stage = %invocation.stage, bytes = combined.len(), "{}", combined);

        if !output.status.success() {
            return Err(SiftError::tool_failed(
                invocation.stage.clone(),
                output.status.code(),
                tail(&combined, FAILURE_TAIL_LINES),
            ));
        }
        Ok(combined)
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
