//! Suite scheduler
//!
//! Pulls cases in registration order, keeps at most `limit` of them in
//! flight, and reports each result as it completes. With bail enabled the
//! first failure stops scheduling; cases already in flight still settle
//! but are neither counted nor reported.

use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use regex::Regex;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::case::CaseHandle;
use super::context::CaseContext;
use super::state::RunState;
use crate::config::SuiteConfig;
use crate::equality::Assertion;
use crate::error::{CaseResult, RunError};
use crate::models::{CaseOutcome, Label, RunPhase, RunSummary};
use crate::monitor::{payload_message, HandlerGuard, UnhandledFailure, UnhandledSource};
use crate::registry::{CaseFn, CaseFuture, CaseRecord, Group, Registry};
use crate::reporter::{ConsoleReporter, Reporter};

/// Predicate deciding whether a case executes
pub type CaseFilter = Arc<dyn Fn(&Label) -> bool + Send + Sync>;

/// How many cases may be in flight at once
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Limit {
    #[default]
    Unbounded,
    Bounded(NonZeroUsize),
}

impl Limit {
    /// At most `n` cases at a time; zero is treated as one
    pub fn bounded(n: usize) -> Self {
        Limit::Bounded(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN))
    }

    /// Strict registration order, one case at a time
    pub fn sequential() -> Self {
        Limit::Bounded(NonZeroUsize::MIN)
    }

    fn has_room(&self, in_flight: usize) -> bool {
        match self {
            Limit::Unbounded => true,
            Limit::Bounded(max) => in_flight < max.get(),
        }
    }
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Limit::bounded(n)
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Unbounded => write!(f, "unbounded"),
            Limit::Bounded(max) => write!(f, "{max}"),
        }
    }
}

/// State shared by the suite and every handle it hands out
pub(crate) struct SuiteInner {
    config: SuiteConfig,
    filter: Option<CaseFilter>,
    reporter: Arc<dyn Reporter>,
    registry: Registry,
    state: Mutex<RunState>,
}

impl SuiteInner {
    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Call the reporter; a panicking reporter is logged, never propagated
    fn notify(&self, event: &str, call: impl FnOnce(&dyn Reporter)) {
        let reporter = self.reporter.as_ref();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| call(reporter))) {
            warn!(
                "Reporter {} panicked: {}",
                event,
                payload_message(payload.as_ref())
            );
        }
    }

    pub(crate) fn accepts(&self, label: &Label) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(label))
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    pub(crate) fn assertion(&self) -> Assertion {
        Assertion::new(self.reporter.clone())
    }

    /// Count a case as tested unless the run has ended
    pub(crate) fn start_case(&self) -> bool {
        let mut state = self.lock_state();
        if state.ended {
            return false;
        }
        state.tested += 1;
        true
    }

    /// Record and report a settled case
    pub(crate) fn settle(&self, label: &Label, result: CaseResult, elapsed_ms: u64) -> CaseOutcome {
        let mut state = self.lock_state();
        if state.ended {
            debug!("Discarding result of '{}' after run end", label);
            return CaseOutcome::Suppressed;
        }

        match result {
            Ok(()) => {
                state.passed += 1;
                self.notify("log_pass", |reporter| reporter.log_pass(label, elapsed_ms));
                debug!("Passed '{}' in {}ms", label, elapsed_ms);
                CaseOutcome::Passed { elapsed_ms }
            }
            Err(error) => {
                state.failed += 1;
                self.notify("log_fail", |reporter| reporter.log_fail(label, &error, elapsed_ms));
                debug!("Failed '{}' in {}ms: {}", label, elapsed_ms, error.kind());
                if self.config.bail {
                    warn!("Bailing after failure of '{}'", label);
                    state.ended = true;
                }
                CaseOutcome::Failed { error, elapsed_ms }
            }
        }
    }

    fn record_unhandled(&self, failure: &UnhandledFailure) {
        let mut state = self.lock_state();
        if state.phase == RunPhase::Final {
            return;
        }
        state.failed += 1;
        warn!("Unhandled failure counted as failed: {}", failure);
    }

    fn is_ended(&self) -> bool {
        self.lock_state().ended
    }

    fn stop_pulling(&self) {
        self.lock_state().stop_pulling();
    }

    fn finish(&self) -> Result<RunSummary, RunError> {
        let summary = {
            let mut state = self.lock_state();
            state.finish();
            state.summary(self.registry.len())
        };

        self.notify("log_final", |reporter| reporter.log_final(&summary));
        info!("Run finished: {}", summary);

        if self.config.throw_on_final && summary.failed > 0 {
            return Err(RunError::Failed {
                failed: summary.failed,
                summary,
            });
        }
        Ok(summary)
    }
}

/// Filter matching `pattern` as a regex against the rendered label.
/// An invalid pattern is matched literally.
fn grep_filter(pattern: &str) -> CaseFilter {
    match Regex::new(pattern) {
        Ok(regex) => Arc::new(move |label: &Label| regex.is_match(&label.to_string())),
        Err(err) => {
            warn!("Invalid grep pattern '{}', matching literally: {}", pattern, err);
            let literal = pattern.to_string();
            Arc::new(move |label: &Label| label.to_string().contains(&literal))
        }
    }
}

/// Builder for [`Suite`]
pub struct SuiteBuilder {
    config: SuiteConfig,
    filter: Option<CaseFilter>,
    reporter: Option<Arc<dyn Reporter>>,
    source: Option<UnhandledSource>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self {
            config: SuiteConfig::default(),
            filter: None,
            reporter: None,
            source: None,
        }
    }

    pub fn config(mut self, config: SuiteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bail(mut self, bail: bool) -> Self {
        self.config.bail = bail;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn throw_on_final(mut self, throw_on_final: bool) -> Self {
        self.config.throw_on_final = throw_on_final;
        self
    }

    pub fn fail_on_unhandled(mut self, fail_on_unhandled: bool) -> Self {
        self.config.fail_on_unhandled = fail_on_unhandled;
        self
    }

    /// Only cases whose label satisfies `filter` execute
    pub fn filter(mut self, filter: impl Fn(&Label) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Source of unhandled failures; defaults to [`UnhandledSource::global`]
    pub fn unhandled_source(mut self, source: UnhandledSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Suite {
        let filter = self
            .filter
            .or_else(|| self.config.grep.as_deref().map(grep_filter));
        let reporter = self.reporter.unwrap_or_else(|| -> Arc<dyn Reporter> {
            Arc::new(ConsoleReporter::new().with_prompt(self.config.prompt.clone()))
        });
        let fail_on_unhandled = self.config.fail_on_unhandled;

        let inner = Arc::new(SuiteInner {
            config: self.config,
            filter,
            reporter,
            registry: Registry::new(),
            state: Mutex::new(RunState::new()),
        });

        let unhandled = fail_on_unhandled.then(|| {
            let source = self.source.unwrap_or_else(UnhandledSource::global);
            let weak = Arc::downgrade(&inner);
            source.install(move |failure| {
                if let Some(inner) = weak.upgrade() {
                    inner.record_unhandled(failure);
                }
            })
        });

        Suite {
            inner,
            _unhandled: unhandled,
        }
    }
}

impl Default for SuiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A set of registered cases and the scheduler that runs them
pub struct Suite {
    inner: Arc<SuiteInner>,
    _unhandled: Option<HandlerGuard>,
}

impl Suite {
    /// Suite with default options and the console reporter
    pub fn new() -> Self {
        SuiteBuilder::new().build()
    }

    pub fn builder() -> SuiteBuilder {
        SuiteBuilder::new()
    }

    pub fn with_config(config: SuiteConfig) -> Self {
        SuiteBuilder::new().config(config).build()
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.inner.config
    }

    /// Register a case; the returned handle can run it directly
    pub fn register<F, Fut>(&self, label: impl Into<Label>, case: F) -> CaseHandle
    where
        F: FnOnce(CaseContext) -> Fut + Send + 'static,
        Fut: Future<Output = CaseResult> + Send + 'static,
    {
        let closure: CaseFn = Box::new(move |ctx: CaseContext| -> CaseFuture { Box::pin(case(ctx)) });
        let record = self.inner.registry.push(CaseRecord::new(label.into(), closure));
        CaseHandle::new(record, self.inner.clone())
    }

    /// Register cases under a named group
    pub fn describe<R>(&self, name: impl Into<String>, body: impl FnOnce(&Group<'_>) -> R) -> R {
        body(&Group::new(self, vec![name.into()]))
    }

    /// Handles for every registered case, in registration order
    pub fn handles(&self) -> Vec<CaseHandle> {
        (0..self.inner.registry.len())
            .filter_map(|index| self.inner.registry.get(index))
            .map(|record| CaseHandle::new(record, self.inner.clone()))
            .collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.inner.registry.labels()
    }

    /// Number of registered cases
    pub fn total(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn phase(&self) -> RunPhase {
        self.inner.lock_state().phase
    }

    /// Counters as they stand right now
    pub fn snapshot(&self) -> RunSummary {
        self.inner.lock_state().summary(self.inner.registry.len())
    }

    /// Assertion bound to this suite's reporter
    pub fn assertion(&self) -> Assertion {
        self.inner.assertion()
    }

    pub fn reporter(&self) -> Arc<dyn Reporter> {
        self.inner.reporter.clone()
    }

    /// Run every registered case, including ones registered mid-run
    pub async fn run(&self, limit: impl Into<Limit>) -> Result<RunSummary, RunError> {
        let inner = self.inner.clone();
        let source = stream::unfold(0usize, move |index| {
            let inner = inner.clone();
            async move {
                inner
                    .registry
                    .get(index)
                    .map(|record| (CaseHandle::new(record, inner.clone()), index + 1))
            }
        });
        self.drive(limit.into(), source).await
    }

    /// Run an explicit list of this suite's cases
    pub async fn run_cases(
        &self,
        limit: impl Into<Limit>,
        cases: impl IntoIterator<Item = CaseHandle>,
    ) -> Result<RunSummary, RunError> {
        let cases: Vec<CaseHandle> = cases.into_iter().collect();
        self.drive(limit.into(), stream::iter(cases)).await
    }

    /// Run cases as they arrive from `cases`
    pub async fn run_stream<S>(&self, limit: impl Into<Limit>, cases: S) -> Result<RunSummary, RunError>
    where
        S: Stream<Item = CaseHandle> + Send,
    {
        self.drive(limit.into(), cases).await
    }

    async fn drive<S>(&self, limit: Limit, cases: S) -> Result<RunSummary, RunError>
    where
        S: Stream<Item = CaseHandle> + Send,
    {
        self.inner
            .lock_state()
            .begin()
            .map_err(RunError::AlreadyStarted)?;
        info!(
            "Starting run of {} cases (limit {})",
            self.inner.registry.len(),
            limit
        );

        let mut source = std::pin::pin!(cases.fuse());
        let mut source_done = false;
        let mut in_flight = FuturesUnordered::new();

        loop {
            let ended = self.inner.is_ended();
            if source_done || ended {
                self.inner.stop_pulling();
            }

            let can_pull = !source_done && !ended && limit.has_room(in_flight.len());
            if !can_pull && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                next = source.next(), if can_pull => match next {
                    Some(handle) if handle.belongs_to(&self.inner) => {
                        in_flight.push(handle.into_execution());
                    }
                    Some(handle) => {
                        warn!("Skipping '{}': registered on another suite", handle.label());
                    }
                    None => source_done = true,
                },
                outcome = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(CaseOutcome::Failed { error, .. }) = &outcome {
                        debug!("Slot freed by failure ({})", error.kind());
                    }
                }
            }
        }

        self.inner.finish()
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("config", &self.inner.config)
            .field("total", &self.total())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaseError;
    use crate::models::Value;
    use crate::reporter::{MemoryReporter, ReportEvent, ReporterOverrides};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn suite_with(reporter: &Arc<MemoryReporter>) -> SuiteBuilder {
        Suite::builder()
            .reporter(reporter.clone())
            .throw_on_final(false)
            .unhandled_source(UnhandledSource::new())
    }

    fn pass_after(ms: u64) -> impl FnOnce(CaseContext) -> futures::future::BoxFuture<'static, CaseResult> {
        move |_ctx| {
            Box::pin(async move {
                sleep(Duration::from_millis(ms)).await;
                Ok(())
            })
        }
    }

    #[test]
    fn test_limit_constructors() {
        assert_eq!(Limit::bounded(0), Limit::sequential());
        assert_eq!(Limit::from(3), Limit::bounded(3));
        assert!(Limit::Unbounded.has_room(10_000));
        assert!(Limit::bounded(2).has_room(1));
        assert!(!Limit::bounded(2).has_room(2));
        assert_eq!(Limit::bounded(4).to_string(), "4");
    }

    #[tokio::test]
    async fn test_all_pass_unbounded() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        for n in 0..5 {
            suite.register(format!("case {n}"), move |ctx: CaseContext| async move { ctx.eq(n, n) });
        }

        let summary = suite.run(Limit::Unbounded).await.unwrap();

        assert_eq!(summary, RunSummary::new(5, 5, 5, 0));
        assert_eq!(reporter.passed().len(), 5);
        assert_eq!(reporter.finals(), vec![summary]);
        assert_eq!(suite.phase(), RunPhase::Final);
    }

    #[tokio::test]
    async fn test_bail_with_limit_one_stops_scheduling() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).bail(true).build();
        let b_ran = Arc::new(AtomicBool::new(false));
        let flag = b_ran.clone();

        suite.register("A", |ctx: CaseContext| async move { ctx.eq(1, 2) });
        suite.register("B", move |_ctx: CaseContext| async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let summary = suite.run(1).await.unwrap();

        assert_eq!(summary, RunSummary::new(2, 1, 0, 1));
        assert!(!b_ran.load(Ordering::SeqCst));
        assert_eq!(reporter.failed(), vec![Label::single("A")]);
        assert!(reporter.passed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bail_drains_in_flight_without_reporting() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).bail(true).build();

        suite.register("fails first", |_ctx: CaseContext| async {
            sleep(Duration::from_millis(10)).await;
            Err(CaseError::thrown("boom"))
        });
        suite.register("passes later", pass_after(20));

        let summary = suite.run(Limit::Unbounded).await.unwrap();

        assert_eq!(summary, RunSummary::new(2, 2, 0, 1));
        assert!(reporter.passed().is_empty());
        assert_eq!(reporter.finals().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_counts_total_only() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter)
            .filter(|label| label.to_string().contains("keep"))
            .build();

        for name in ["keep 1", "drop 1", "keep 2", "drop 2"] {
            suite.register(name, |_ctx: CaseContext| async { Ok(()) });
        }

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary, RunSummary::new(4, 2, 2, 0));
        assert_eq!(
            reporter.passed(),
            vec![Label::single("keep 1"), Label::single("keep 2")]
        );
    }

    #[tokio::test]
    async fn test_grep_from_config_filters() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter)
            .config(SuiteConfig::default().with_grep("api"))
            .build();

        suite.register("api - list", |_ctx: CaseContext| async { Ok(()) });
        suite.register("db - migrate", |_ctx: CaseContext| async { Ok(()) });

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary, RunSummary::new(2, 1, 1, 0));
    }

    #[tokio::test]
    async fn test_grep_is_a_regex() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter)
            .config(SuiteConfig::default().with_grep("^another 01$"))
            .build();

        suite.register("another 01", |_ctx: CaseContext| async { Ok(()) });
        suite.register("another 011", |_ctx: CaseContext| async { Ok(()) });
        suite.register("not another 01", |_ctx: CaseContext| async { Ok(()) });

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary, RunSummary::new(3, 1, 1, 0));
        assert_eq!(reporter.passed(), vec![Label::single("another 01")]);
    }

    #[test]
    fn test_invalid_grep_matches_literally() {
        let filter = grep_filter("case (1");
        assert!(filter(&Label::single("case (1)")));
        assert!(!filter(&Label::single("case 1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_settling_case_times_out() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter)
            .timeout(Duration::from_millis(50))
            .build();

        let handle = suite.register("hangs", |_ctx: CaseContext| futures::future::pending());
        suite.register("fine", |_ctx: CaseContext| async { Ok(()) });

        let summary = suite.run(Limit::sequential()).await.unwrap();

        assert_eq!(summary, RunSummary::new(2, 2, 1, 1));
        assert!(handle.is_tested());
        assert!(matches!(
            reporter.events().first(),
            Some(ReportEvent::Fail { message, .. }) if message.contains("test_timeout")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_reported_in_completion_order() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();

        suite.register("slow", pass_after(30));
        suite.register("fast", pass_after(10));
        suite.register("faster", pass_after(5));

        suite.run(2).await.unwrap();

        assert_eq!(
            reporter.passed(),
            vec![
                Label::single("fast"),
                Label::single("faster"),
                Label::single("slow")
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_limit() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for n in 0..6u64 {
            let current = current.clone();
            let peak = peak.clone();
            suite.register(format!("case {n}"), move |_ctx: CaseContext| async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(5 + n)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let summary = suite.run(2).await.unwrap();
        assert_eq!(summary, RunSummary::new(6, 6, 6, 0));
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cases_registered_mid_run_are_pulled() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        suite.register("first", pass_after(10));

        let (summary, _) = futures::join!(suite.run(1), async {
            sleep(Duration::from_millis(5)).await;
            suite.register("late arrival", |_ctx: CaseContext| async { Ok(()) })
        });

        assert_eq!(summary.unwrap(), RunSummary::new(2, 2, 2, 0));
        assert_eq!(
            reporter.passed(),
            vec![Label::single("first"), Label::single("late arrival")]
        );
    }

    #[tokio::test]
    async fn test_handle_runs_at_most_once() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = suite.register("once", move |_ctx: CaseContext| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(handle.invoke().await.is_passed());
        assert!(matches!(handle.invoke().await, CaseOutcome::AlreadyRun));

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(summary, RunSummary::new(1, 1, 1, 0));
        assert_eq!(reporter.passed().len(), 1);
    }

    #[tokio::test]
    async fn test_direct_bail_before_run() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).bail(true).build();

        let a = suite.register("A", |_ctx: CaseContext| async { Err(CaseError::thrown("boom")) });
        suite.register("B", |_ctx: CaseContext| async { Ok(()) });

        assert!(a.invoke().await.is_failed());
        let summary = suite.run(Limit::Unbounded).await.unwrap();

        assert_eq!(summary, RunSummary::new(2, 1, 0, 1));
        assert!(reporter.passed().is_empty());
    }

    #[tokio::test]
    async fn test_handle_after_final_is_suppressed() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter)
            .filter(|label| label.leaf() != "late")
            .build();
        let late = suite.register("late", |_ctx: CaseContext| async { Ok(()) });

        suite.run(Limit::Unbounded).await.unwrap();

        assert!(matches!(late.invoke().await, CaseOutcome::AlreadyRun));
        let fresh = suite.register("fresh", |_ctx: CaseContext| async { Ok(()) });
        assert!(matches!(fresh.invoke().await, CaseOutcome::Suppressed));
        assert_eq!(suite.snapshot().passed, 0);
    }

    #[tokio::test]
    async fn test_describe_labels() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();

        let handle = suite.describe("a", |group| {
            group.describe("b", |group| {
                group.register("", |_ctx: CaseContext| async { Ok(()) })
            })
        });
        suite.describe("a", |group| {
            group.register("c", |_ctx: CaseContext| async { Ok(()) })
        });

        assert_eq!(handle.label(), &Label::from(vec!["a", "b", ""]));
        assert_eq!(handle.label().to_string(), "a - b - ");
        assert_eq!(suite.labels()[1], Label::from(vec!["a", "c"]));
    }

    #[tokio::test]
    async fn test_after_hooks_run_on_failure() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        let cleaned = Arc::new(AtomicBool::new(false));
        let flag = cleaned.clone();

        suite.register("dirty", move |ctx: CaseContext| async move {
            ctx.after(move || flag.store(true, Ordering::SeqCst));
            ctx.eq(Value::seq([1, 2]), Value::seq([1, 3]))
        });

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(cleaned.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panic_becomes_thrown() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();

        let handle = suite.register("panics", |ctx: CaseContext| async move {
            if ctx.label().leaf() == "panics" {
                panic!("exploded");
            }
            Ok(())
        });

        let outcome = handle.invoke().await;
        assert!(matches!(
            outcome.error(),
            Some(CaseError::Thrown { message }) if message == "exploded"
        ));
        assert_eq!(suite.snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_unhandled_failures_count_until_final() {
        let reporter = Arc::new(MemoryReporter::new());
        let source = UnhandledSource::new();
        let suite = Suite::builder()
            .reporter(reporter.clone())
            .fail_on_unhandled(true)
            .throw_on_final(false)
            .unhandled_source(source.clone())
            .build();

        let inner_source = source.clone();
        suite.register("leaks", move |_ctx: CaseContext| async move {
            inner_source.report(UnhandledFailure::new("stray rejection"));
            Ok(())
        });

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary, RunSummary::new(1, 1, 1, 1));

        source.report(UnhandledFailure::new("after the fact"));
        assert_eq!(suite.snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_unhandled_ignored_without_opt_in() {
        let reporter = Arc::new(MemoryReporter::new());
        let source = UnhandledSource::new();
        let suite = Suite::builder()
            .reporter(reporter.clone())
            .fail_on_unhandled(false)
            .unhandled_source(source.clone())
            .build();

        source.report(UnhandledFailure::new("stray"));
        assert_eq!(suite.run(Limit::Unbounded).await.unwrap().failed, 0);
    }

    #[tokio::test]
    async fn test_panicking_reporter_does_not_abort_run() {
        let finals = Arc::new(AtomicUsize::new(0));
        let seen = finals.clone();
        let reporter = ReporterOverrides::over(Arc::new(MemoryReporter::new()))
            .on_fail(|_, _, _| panic!("log_fail exploded"))
            .on_pass(|_, _| panic!("log_pass exploded"))
            .on_final(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        let suite = Suite::builder()
            .reporter(Arc::new(reporter))
            .throw_on_final(false)
            .unhandled_source(UnhandledSource::new())
            .build();

        suite.register("fails", |ctx: CaseContext| async move { ctx.eq(1, 2) });
        suite.register("passes", |_ctx: CaseContext| async { Ok(()) });

        let summary = suite.run(1).await.unwrap();
        assert_eq!(summary, RunSummary::new(2, 2, 1, 1));
        assert_eq!(finals.load(Ordering::SeqCst), 1);
        assert_eq!(suite.phase(), RunPhase::Final);
    }

    #[tokio::test]
    async fn test_suites_sharing_a_source_drop_independently() {
        let source = UnhandledSource::new();
        let build = || {
            Suite::builder()
                .reporter(Arc::new(MemoryReporter::new()))
                .fail_on_unhandled(true)
                .unhandled_source(source.clone())
                .build()
        };
        let first = build();
        let second = build();

        drop(first);
        source.report(UnhandledFailure::new("stray"));
        assert_eq!(second.snapshot().failed, 1);

        drop(second);
        assert_eq!(source.handler_count(), 0);
    }

    #[tokio::test]
    async fn test_throw_on_final() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).throw_on_final(true).build();
        suite.register("bad", |ctx: CaseContext| async move { ctx.eq("a", "b") });
        suite.register("good", |_ctx: CaseContext| async { Ok(()) });

        let err = suite.run(Limit::Unbounded).await.unwrap_err();
        assert_eq!(err.to_string(), "junit test failed with 1");
        assert_eq!(err.summary(), Some(&RunSummary::new(2, 2, 1, 1)));
        assert_eq!(reporter.finals().len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_rejected() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        suite.register("only", |_ctx: CaseContext| async { Ok(()) });

        suite.run(Limit::Unbounded).await.unwrap();
        let err = suite.run(Limit::Unbounded).await.unwrap_err();

        assert!(matches!(err, RunError::AlreadyStarted(RunPhase::Final)));
        assert_eq!(reporter.finals().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_suite_finalizes() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();

        let summary = suite.run(Limit::sequential()).await.unwrap();
        assert_eq!(summary, RunSummary::new(0, 0, 0, 0));
        assert_eq!(reporter.finals(), vec![summary]);
    }

    #[tokio::test]
    async fn test_run_stream_from_channel() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        suite.register("one", |_ctx: CaseContext| async { Ok(()) });
        suite.register("two", |_ctx: CaseContext| async { Ok(()) });

        let (tx, rx) = futures::channel::mpsc::unbounded();
        for handle in suite.handles().into_iter().rev() {
            tx.unbounded_send(handle).unwrap();
        }
        drop(tx);

        let summary = suite.run_stream(1, rx).await.unwrap();
        assert_eq!(summary, RunSummary::new(2, 2, 2, 0));
        assert_eq!(
            reporter.passed(),
            vec![Label::single("two"), Label::single("one")]
        );
    }

    #[tokio::test]
    async fn test_run_cases_skips_foreign_handles() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();
        let other = suite_with(&reporter).build();

        let ours = suite.register("ours", |_ctx: CaseContext| async { Ok(()) });
        let theirs = other.register("theirs", |_ctx: CaseContext| async { Ok(()) });

        let summary = suite.run_cases(Limit::Unbounded, [ours, theirs.clone()]).await.unwrap();
        assert_eq!(summary, RunSummary::new(1, 1, 1, 0));
        assert!(!theirs.is_tested());
    }

    #[tokio::test]
    async fn test_eq_async_inside_case() {
        let reporter = Arc::new(MemoryReporter::new());
        let suite = suite_with(&reporter).build();

        suite.register("async eq", |ctx: CaseContext| async move {
            let fetched = async { Value::map([("id", 7)]) };
            ctx.eq_async(fetched, async { Value::map([("id", 7)]) }).await
        });

        let summary = suite.run(Limit::Unbounded).await.unwrap();
        assert_eq!(summary.passed, 1);
    }
}
