//! Pipeline orchestration.
//!
//! A run generates one changelog per [`ChangeKind`], then fans out one worker
//! per (kind, dialect). Workers share nothing but the read-only config and
//! runner; each owns its temp file and output file. The run waits for every
//! worker before returning. A failed worker is logged and reported, never
//! propagated to its siblings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::dialect::{ChangeKind, Dialect};
use crate::error::{SiftError, SiftResult};
use crate::extract::{ExtractedStatement, StatementExtractor};
use crate::qualifier::SchemaQualifiers;
use crate::tool::{Invocation, ToolRunner};
use crate::transpiler::Translator;
use crate::workdir::{WorkDir, clear_or_make_dir};

/// Where in a worker's life a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Changelog,
    UpdateSql,
    Temp,
    Extract,
    Output,
    /// The worker task itself panicked or was cancelled.
    Worker,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Changelog => "changelog",
            Stage::UpdateSql => "updateSql",
            Stage::Temp => "temp",
            Stage::Extract => "extract",
            Stage::Output => "output",
            Stage::Worker => "worker",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerStatus {
    Completed { statements: usize, output: PathBuf },
    Failed { stage: Stage, error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerOutcome {
    pub kind: ChangeKind,
    pub dialect: Dialect,
    #[serde(flatten)]
    pub status: WorkerStatus,
}

impl WorkerOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, WorkerStatus::Completed { .. })
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<WorkerOutcome>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.completed() == self.outcomes.len()
    }

    pub fn outcome(&self, kind: ChangeKind, dialect: Dialect) -> Option<&WorkerOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind && o.dialect == dialect)
    }
}

struct StageFailure {
    stage: Stage,
    error: SiftError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageFailure>;
}

impl<T> AtStage<T> for SiftResult<T> {
    fn at(self, stage: Stage) -> Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

/// Runs every (kind, dialect) pipeline for one configuration.
pub struct Pipeline<R: ToolRunner> {
    config: Arc<RunConfig>,
    runner: Arc<R>,
    workdir: WorkDir,
}

impl<R: ToolRunner> Pipeline<R> {
    pub fn new(config: RunConfig, runner: R) -> Self {
        let workdir = WorkDir::new(config.work_dir.clone());
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            workdir,
        }
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    /// Generate changelogs, then translate for every configured dialect.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let dialects = self.config.target_dialects();

        let changelog_dir = self.workdir.changelog_dir();
        if let Err(e) = clear_or_make_dir(&changelog_dir).await {
            error!(stage = %Stage::Changelog, "{}", e);
        }

        let mut unavailable: Vec<(ChangeKind, String)> = Vec::new();
        for kind in ChangeKind::ALL {
            info!(%kind, "creating {}", kind.changelog_file());
            let invocation = Invocation::diff_changelog(kind, &self.workdir, &self.config.config_dir);
            if let Err(e) = self.runner.run(&invocation).await {
                error!(%kind, stage = %Stage::Changelog, "{}", e);
                unavailable.push((kind, format!("{} changelog unavailable: {}", kind, e)));
            }
        }

        let mut outcomes = Vec::new();
        let mut handles = Vec::new();
        for dialect in dialects {
            for kind in ChangeKind::ALL {
                if let Some((_, reason)) = unavailable.iter().find(|(k, _)| *k == kind) {
                    if let Err(e) = clear_or_make_dir(&self.workdir.out_dir(kind, dialect)).await {
                        warn!(%dialect, %kind, "cannot clear stale output: {}", e);
                    }
                    outcomes.push(WorkerOutcome {
                        kind,
                        dialect,
                        status: WorkerStatus::Skipped {
                            reason: reason.clone(),
                        },
                    });
                    continue;
                }
                let worker = Worker {
                    kind,
                    dialect,
                    config: Arc::clone(&self.config),
                    runner: Arc::clone(&self.runner),
                    workdir: self.workdir.clone(),
                };
                handles.push((kind, dialect, tokio::spawn(worker.run())));
            }
        }

        for (kind, dialect, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(%dialect, %kind, "worker aborted: {}", e);
                    outcomes.push(WorkerOutcome {
                        kind,
                        dialect,
                        status: WorkerStatus::Failed {
                            stage: Stage::Worker,
                            error: format!("worker aborted: {e}"),
                        },
                    });
                }
            }
        }

        let order = |d: Dialect| Dialect::ALL.iter().position(|x| *x == d);
        outcomes.sort_by_key(|o| (order(o.dialect), o.kind == ChangeKind::Data));

        RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }
}

struct Worker<R: ToolRunner> {
    kind: ChangeKind,
    dialect: Dialect,
    config: Arc<RunConfig>,
    runner: Arc<R>,
    workdir: WorkDir,
}

impl<R: ToolRunner> Worker<R> {
    async fn run(self) -> WorkerOutcome {
        let (kind, dialect) = (self.kind, self.dialect);
        let status = match self.execute().await {
            Ok((statements, output)) => {
                info!(%dialect, %kind, statements, output = %output.display(), "done");
                WorkerStatus::Completed { statements, output }
            }
            Err(StageFailure { stage, error }) => {
                error!(%dialect, %kind, %stage, "{}", error);
                WorkerStatus::Failed {
                    stage,
                    error: error.to_string(),
                }
            }
        };
        WorkerOutcome {
            kind,
            dialect,
            status,
        }
    }

    async fn execute(&self) -> Result<(usize, PathBuf), StageFailure> {
        let (kind, dialect) = (self.kind, self.dialect);

        // A stale artifact must not survive a failed run.
        let out_file = self.workdir.out_file(kind, dialect);
        clear_or_make_dir(&self.workdir.out_dir(kind, dialect)).await.at(Stage::Output)?;

        info!(%dialect, %kind, "generating sql");
        let invocation = Invocation::update_sql(kind, dialect, &self.workdir, &self.config.config_dir);
        let raw = self.runner.run(&invocation).await.at(Stage::UpdateSql)?;

        let temp_dir = self.workdir.temp_dir(kind, dialect);
        let temp_file = self.workdir.temp_file(kind, dialect);
        clear_or_make_dir(&temp_dir).await.at(Stage::Temp)?;
        tokio::fs::write(&temp_file, raw.as_bytes())
            .await
            .map_err(|e| SiftError::io(format!("writing {}", temp_file.display()), e))
            .at(Stage::Temp)?;
        debug!(%dialect, %kind, bytes = raw.len(), path = %temp_file.display(), "wrote raw output");
        drop(raw);

        info!(%dialect, %kind, "resolving statements");
        let statements = self.translate_file(&temp_file, &out_file).await?;

        if !self.config.keep_temp {
            if let Err(e) = tokio::fs::remove_file(&temp_file).await {
                warn!(%dialect, %kind, path = %temp_file.display(), "cannot remove temp file: {}", e);
            }
        }

        Ok((statements, out_file))
    }

    async fn translate_file(
        &self,
        temp_file: &Path,
        out_file: &Path,
    ) -> Result<usize, StageFailure> {
        let (kind, dialect) = (self.kind, self.dialect);
        let qualifiers = SchemaQualifiers::resolve(dialect, &self.config.config_dir, &self.config.qualifier_key);
        let translator = Translator::new(dialect, qualifiers);
        let mut extractor = StatementExtractor::new(kind, dialect, self.config.markers.clone());

        let input = File::open(temp_file)
            .await
            .map_err(|e| SiftError::io(format!("opening {}", temp_file.display()), e))
            .at(Stage::Extract)?;
        let output = File::create(out_file)
            .await
            .map_err(|e| SiftError::io(format!("creating {}", out_file.display()), e))
            .at(Stage::Output)?;

        let mut lines = BufReader::new(input).lines();
        let mut writer = BufWriter::new(output);
        let mut count = 0;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| SiftError::io(format!("reading {}", temp_file.display()), e))
            .at(Stage::Extract)?
        {
            if !extractor.accept(&line) {
                continue;
            }
            let statement = translator
                .translate(ExtractedStatement {
                    kind,
                    dialect,
                    sql: line,
                })
                .at(Stage::Extract)?;
            let mut line = statement.sql;
            line.push('\n');
            writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| SiftError::io(format!("writing {}", out_file.display()), e))
                .at(Stage::Output)?;
            count += 1;
        }

        writer
            .flush()
            .await
            .map_err(|e| SiftError::io(format!("flushing {}", out_file.display()), e))
            .at(Stage::Output)?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::future::Future;

    struct FnRunner<F>(F);

    impl<F> ToolRunner for FnRunner<F>
    where
        F: Fn(&Invocation) -> SiftResult<String> + Send + Sync + 'static,
    {
        fn run(&self, invocation: &Invocation) -> impl Future<Output = SiftResult<String>> + Send {
            let result = (self.0)(invocation);
            async move { result }
        }
    }

    const SCHEMA_STREAM: &str = "\
-- Lock Database
UPDATE DATABASECHANGELOGLOCK SET LOCKED = 1 WHERE ID = 1;
-- Changeset workdir/changelog/changelog-ddl.xml::1::alice
CREATE TABLE SCHEMA1.T1 (ID DECIMAL(10,0), NAME VARCHAR2(50));
INSERT INTO DATABASECHANGELOG (ID, AUTHOR) VALUES ('1', 'alice');
-- Release Database Lock
";

    const DATA_STREAM: &str = "\
UPDATE DATABASECHANGELOGLOCK SET LOCKED = 1 WHERE ID = 1;
INSERT INTO SCHEMA1.T1 (ID, NAME) VALUES (1, 'ann');
INSERT INTO DATABASECHANGELOG (ID) VALUES ('2');
INSERT INTO SCHEMA1.T1 (ID, NAME) VALUES (2, 'bo');
";

    fn is_update(inv: &Invocation, kind: ChangeKind) -> bool {
        inv.stage == "updateSql" && inv.args[0].ends_with(kind.changelog_file())
    }

    fn stream_for(inv: &Invocation) -> SiftResult<String> {
        if is_update(inv, ChangeKind::Schema) {
            Ok(SCHEMA_STREAM.to_string())
        } else if is_update(inv, ChangeKind::Data) {
            Ok(DATA_STREAM.to_string())
        } else {
            Ok(String::new())
        }
    }

    fn config_in(root: &Path, dialects: &[&str]) -> RunConfig {
        let config_dir = root.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("liquibase-update-oracle.properties"), "db: SCHEMA1\n").unwrap();
        fs::write(config_dir.join("liquibase-update-sqlserver.properties"), "db: SCHEMA1\n").unwrap();
        RunConfig {
            work_dir: root.join("work"),
            config_dir,
            dialects: dialects.iter().map(|d| d.to_string()).collect(),
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_writes_translated_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config_in(tmp.path(), &["oracle"]), FnRunner(stream_for));

        let report = pipeline.run().await;
        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 2);

        let ddl = pipeline.workdir().out_file(ChangeKind::Schema, Dialect::Oracle);
        assert_eq!(
            fs::read_to_string(&ddl).unwrap(),
            "CREATE TABLE T1 (ID NUMBER(10,0), NAME VARCHAR2(50 char));\n"
        );
        let dml = pipeline.workdir().out_file(ChangeKind::Data, Dialect::Oracle);
        assert_eq!(
            fs::read_to_string(&dml).unwrap(),
            "INSERT INTO T1 (ID, NAME) VALUES (1, 'ann');\nINSERT INTO T1 (ID, NAME) VALUES (2, 'bo');\n"
        );

        assert_eq!(
            report.outcome(ChangeKind::Data, Dialect::Oracle).unwrap().status,
            WorkerStatus::Completed {
                statements: 2,
                output: dml
            }
        );
        assert!(!pipeline.workdir().temp_file(ChangeKind::Schema, Dialect::Oracle).exists());
    }

    #[tokio::test]
    async fn test_failing_dialect_does_not_stop_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = FnRunner(|inv: &Invocation| {
            if inv.args.iter().any(|a| a.contains("sqlserver")) {
                Err(SiftError::tool_failed("updateSql", Some(1), "Unexpected error running Liquibase"))
            } else {
                stream_for(inv)
            }
        });
        let pipeline = Pipeline::new(config_in(tmp.path(), &["mssql", "oracle"]), runner);

        let report = pipeline.run().await;
        assert_eq!(report.completed(), 2);
        assert!(!report.is_success());

        for kind in ChangeKind::ALL {
            let failed = report.outcome(kind, Dialect::SqlServer).unwrap();
            assert!(matches!(
                failed.status,
                WorkerStatus::Failed {
                    stage: Stage::UpdateSql,
                    ..
                }
            ));
            assert!(!pipeline.workdir().out_file(kind, Dialect::SqlServer).exists());
            assert!(pipeline.workdir().out_file(kind, Dialect::Oracle).exists());
        }
    }

    #[tokio::test]
    async fn test_failure_removes_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path(), &["oracle"]);
        let first = Pipeline::new(config.clone(), FnRunner(stream_for));
        assert!(first.run().await.is_success());

        let failing = FnRunner(|inv: &Invocation| {
            if inv.stage == "updateSql" {
                Err(SiftError::tool_failed("updateSql", None, "killed"))
            } else {
                Ok(String::new())
            }
        });
        let second = Pipeline::new(config, failing);
        let report = second.run().await;

        assert_eq!(report.completed(), 0);
        for kind in ChangeKind::ALL {
            assert!(!second.workdir().out_file(kind, Dialect::Oracle).exists());
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = FnRunner(|inv: &Invocation| {
            if inv.stage == "updateSql" && inv.args.iter().any(|a| a.contains("oracle")) {
                panic!("runner blew up");
            }
            stream_for(inv)
        });
        let pipeline = Pipeline::new(config_in(tmp.path(), &["oracle", "mssql"]), runner);

        let report = pipeline.run().await;
        for kind in ChangeKind::ALL {
            assert!(matches!(
                report.outcome(kind, Dialect::Oracle).unwrap().status,
                WorkerStatus::Failed {
                    stage: Stage::Worker,
                    ..
                }
            ));
            assert!(report.outcome(kind, Dialect::SqlServer).unwrap().is_completed());
        }
    }

    #[tokio::test]
    async fn test_failed_changelog_skips_that_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = FnRunner(|inv: &Invocation| {
            if inv.stage == "generate-changelog" {
                Err(SiftError::tool_failed("generate-changelog", Some(255), "no connection"))
            } else {
                stream_for(inv)
            }
        });
        let pipeline = Pipeline::new(config_in(tmp.path(), &["mysql"]), runner);

        let report = pipeline.run().await;
        assert!(report.outcome(ChangeKind::Schema, Dialect::MySql).unwrap().is_completed());
        assert!(matches!(
            report.outcome(ChangeKind::Data, Dialect::MySql).unwrap().status,
            WorkerStatus::Skipped { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_properties_keeps_qualifiers() {
        let tmp = tempfile::tempdir().unwrap();
        // No mysql properties file is written, so nothing is stripped.
        let pipeline = Pipeline::new(config_in(tmp.path(), &["mysql"]), FnRunner(stream_for));

        let report = pipeline.run().await;
        assert!(report.is_success());
        let ddl = pipeline.workdir().out_file(ChangeKind::Schema, Dialect::MySql);
        assert_eq!(
            fs::read_to_string(ddl).unwrap(),
            "CREATE TABLE SCHEMA1.T1 (ID DECIMAL(10,0), NAME VARCHAR2(50));\n"
        );
    }

    #[tokio::test]
    async fn test_keep_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path(), &["oracle"]);
        config.keep_temp = true;
        let pipeline = Pipeline::new(config, FnRunner(stream_for));

        pipeline.run().await;
        let temp = pipeline.workdir().temp_file(ChangeKind::Schema, Dialect::Oracle);
        assert_eq!(fs::read_to_string(temp).unwrap(), SCHEMA_STREAM);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config_in(tmp.path(), &["oracle"]), FnRunner(stream_for));
        let report = pipeline.run().await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["kind"], "schema");
        assert_eq!(json["outcomes"][0]["dialect"], "oracle");
        assert_eq!(json["outcomes"][0]["status"], "completed");
        assert_eq!(json["outcomes"][1]["statements"], 2);
    }
}
