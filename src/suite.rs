//! Runs expanded cases end to end and collects per-case outcomes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::context::CaseContext;
use crate::error::{ReplayError, Result};
use crate::mode::{resolve, CallFailure, Disposition};
use crate::ports::transport::{PassthroughDecoder, SegmentDecoder, Transport};
use crate::replay::SessionStore;
use crate::table::{expand, ExecutionCase, TestTableFile};

/// Boxed future type alias used by [`CaseDriver`] to keep the trait dyn-compatible.
pub type DriverFuture<'a> = Pin<Box<dyn Future<Output = std::result::Result<(), CallFailure>> + Send + 'a>>;

/// Performs the client call of one case through its context.
///
/// Drivers translate the case's parameters into requests, send them with
/// [`CaseContext::send`] and check what comes back. Harness errors can be
/// propagated with `?`; client errors are classified automatically.
pub trait CaseDriver: Send + Sync {
    /// Drives the case served by `ctx`.
    fn drive<'a>(&'a self, ctx: &'a CaseContext) -> DriverFuture<'a>;
}

/// How one case ended.
#[derive(Debug)]
pub enum CaseOutcome {
    /// The call behaved as the case required.
    Passed,
    /// The case was not run.
    Skipped(String),
    /// The case failed; other cases are unaffected.
    Failed(ReplayError),
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Outcome of one case, labelled with its identity.
#[derive(Debug)]
pub struct CaseReport {
    /// Replay identifier of the case.
    pub replay_id: String,
    /// Item name from the table.
    pub name: String,
    /// What happened.
    pub outcome: CaseOutcome,
}

/// Outcomes of every case in a run, in expansion order.
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// One entry per case.
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// Number of passed cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    /// Number of skipped cases.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Skipped(_)))
    }

    /// Number of failed cases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    /// Whether no case failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// The failed cases.
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| matches!(c.outcome, CaseOutcome::Failed(_)))
    }

    /// Looks up a case by replay identifier.
    #[must_use]
    pub fn get(&self, replay_id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.replay_id == replay_id)
    }

    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }
}

/// Runs cases against one backend in one mode.
pub struct SuiteRunner {
    config: HarnessConfig,
    store: Arc<dyn SessionStore>,
    live: Arc<dyn Transport>,
    decoder: Arc<dyn SegmentDecoder>,
}

impl SuiteRunner {
    /// A runner that decodes recorded segments with [`PassthroughDecoder`].
    pub fn new(config: HarnessConfig, store: Arc<dyn SessionStore>, live: Arc<dyn Transport>) -> Self {
        Self { config, store, live, decoder: Arc::new(PassthroughDecoder) }
    }

    /// Replaces the decoder used when recording.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn SegmentDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Configuration the runner uses.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Expands `table` and runs every case with `driver`.
    ///
    /// # Errors
    ///
    /// Returns the expansion error if the table is invalid; case failures
    /// are reported in the [`SuiteReport`] instead.
    pub async fn run_table(&self, table: &TestTableFile, driver: &dyn CaseDriver) -> Result<SuiteReport> {
        let cases = expand(table)?;
        Ok(self.run(&cases, driver).await)
    }

    /// Runs `cases` in order. A failing case never stops the run.
    pub async fn run(&self, cases: &[ExecutionCase], driver: &dyn CaseDriver) -> SuiteReport {
        let mut report = SuiteReport::default();
        for case in cases {
            let outcome = self.run_case(case, driver).await;
            match &outcome {
                CaseOutcome::Failed(err) => warn!(
                    replay_id = %case.replay_id,
                    backend = %self.config.backend,
                    error = %err,
                    "case failed"
                ),
                other => info!(
                    replay_id = %case.replay_id,
                    backend = %self.config.backend,
                    outcome = %other,
                    "case finished"
                ),
            }
            report.cases.push(CaseReport {
                replay_id: case.replay_id.clone(),
                name: case.name.clone(),
                outcome,
            });
        }
        info!(
            passed = report.passed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "suite finished"
        );
        report
    }

    /// Runs `cases` on a private single-threaded runtime, for callers
    /// without one of their own.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Transport`] if the runtime cannot start.
    pub fn run_blocking(&self, cases: &[ExecutionCase], driver: &dyn CaseDriver) -> Result<SuiteReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ReplayError::Transport(format!("failed to start async runtime: {e}")))?;
        Ok(runtime.block_on(self.run(cases, driver)))
    }

    async fn run_case(&self, case: &ExecutionCase, driver: &dyn CaseDriver) -> CaseOutcome {
        let disposition =
            resolve(case, self.config.backend, self.config.mode, &self.config.capabilities);
        if let Disposition::Skip(reason) = &disposition {
            return CaseOutcome::Skipped(reason.clone());
        }

        let ctx = match CaseContext::open(
            case,
            &self.config,
            Arc::clone(&self.store),
            Arc::clone(&self.live),
            Arc::clone(&self.decoder),
        ) {
            Ok(ctx) => ctx,
            Err(err) => return CaseOutcome::Failed(err),
        };

        let judged = disposition.judge(driver.drive(&ctx).await);
        let finished = ctx.finish();
        match (judged, finished) {
            (Err(err), _) | (Ok(_), Err(err)) => CaseOutcome::Failed(err),
            (Ok(_), Ok(())) => CaseOutcome::Passed,
        }
    }
}
