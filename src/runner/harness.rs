//! In-process test runner
//!
//! [`Harness`] records the groups, hooks and cases a suite registers and executes them with
//! [`Harness::execute`]:
//!
//! - cases run one at a time, in registration order
//! - a panicking body or hook fails its own case only
//! - async cases run on a current-thread tokio runtime until their future settles, and fail if one is already running
//! - skipped cases are reported without running hooks or bodies
//!
//! There are no retries. The async timeout is the harness's own policy (`HarnessConfig::async_timeout`).

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Once;
use std::time::Instant;

use futures::FutureExt;
use tokio::runtime::{Builder, Handle, Runtime};

use super::{AsyncCaseFn, CaseFn, CaseHook, GroupBody, TestRunner};
use crate::config::HarnessConfig;
use crate::error::CaseFailure;
use crate::report::{CaseInfo, CaseResult, RunReport, TestReporter, TestSummary};

enum RegisteredCase {
    Sync(CaseFn),
    Async(AsyncCaseFn),
    Skipped,
}

struct CaseNode {
    label: String,
    case: RegisteredCase,
}

enum Node {
    Group(GroupNode),
    Case(CaseNode),
}

#[derive(Default)]
struct GroupNode {
    name: String,
    /// Indices into `Harness::hooks`
    hooks: Vec<usize>,
    children: Vec<Node>,
}

impl GroupNode {
    /// Whether any case in this group, or below it, passes the filter
    fn has_selected(&self, groups: &mut Vec<String>, config: &HarnessConfig) -> bool {
        self.children.iter().any(|child| match child {
            Node::Case(case) => {
                let mut parts = groups.clone();
                parts.push(case.label.clone());
                config.selects(&parts.join(" > "))
            }
            Node::Group(group) => {
                groups.push(group.name.clone());
                let found = group.has_selected(groups, config);
                groups.pop();
                found
            }
        })
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Keeps the panic hook silent on this thread while a case runs.
///
/// The hook is wrapped once per process; other threads keep the hook they had.
struct QuietPanics {
    previous: bool,
}

impl QuietPanics {
    fn enter() -> Self {
        PANIC_HOOK.call_once(|| {
            let inner = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                if !QUIET_PANICS.try_with(Cell::get).unwrap_or(false) {
                    inner(info);
                }
            }));
        });
        Self {
            previous: QUIET_PANICS.with(|quiet| quiet.replace(true)),
        }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        QUIET_PANICS.with(|quiet| quiet.set(self.previous));
    }
}

/// Per-run execution state
struct RunState {
    report: RunReport,
    stopped: bool,
}

/// In-process [`TestRunner`].
pub struct Harness {
    config: HarnessConfig,
    hooks: Vec<CaseHook>,
    root: GroupNode,
    /// Child indices from the root to the currently open group
    open: Vec<usize>,
    runtime: Option<Runtime>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            hooks: Vec::new(),
            root: GroupNode::default(),
            open: Vec::new(),
            runtime: None,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Number of cases registered so far, skipped ones included
    pub fn registered_cases(&self) -> usize {
        fn count(group: &GroupNode) -> usize {
            group
                .children
                .iter()
                .map(|child| match child {
                    Node::Case(_) => 1,
                    Node::Group(g) => count(g),
                })
                .sum()
        }
        count(&self.root)
    }

    fn current_group(&mut self) -> &mut GroupNode {
        let mut group = &mut self.root;
        for &idx in &self.open {
            group = match group.children.get_mut(idx) {
                Some(Node::Group(g)) => g,
                _ => unreachable!("INVARIANT: only group indices are pushed onto the open path"),
            };
        }
        group
    }

    fn push_case(&mut self, label: &str, case: RegisteredCase) {
        tracing::debug!(case = label, "registered case");
        self.current_group().children.push(Node::Case(CaseNode {
            label: label.to_string(),
            case,
        }));
    }

    /// Run every registered case and report to `reporter`.
    ///
    /// Registrations are consumed; a second call runs nothing.
    #[tracing::instrument(skip_all, fields(cases = self.registered_cases()))]
    pub fn execute(&mut self, reporter: &mut dyn TestReporter) -> RunReport {
        let start = Instant::now();
        let root = std::mem::take(&mut self.root);
        self.open.clear();

        let mut state = RunState {
            report: RunReport::default(),
            stopped: false,
        };
        let mut groups = Vec::new();
        let mut hooks = Vec::new();
        self.run_group(root, &mut groups, &mut hooks, reporter, &mut state);

        state.report.summary.duration = start.elapsed();
        self.hooks.clear();

        let summary: &TestSummary = &state.report.summary;
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "run complete"
        );
        reporter.on_run_complete(summary);
        state.report
    }

    fn run_group(
        &mut self,
        group: GroupNode,
        groups: &mut Vec<String>,
        hooks: &mut Vec<usize>,
        reporter: &mut dyn TestReporter,
        state: &mut RunState,
    ) {
        let hooks_before = hooks.len();
        hooks.extend(group.hooks.iter().copied());

        for child in group.children {
            if state.stopped {
                break;
            }
            match child {
                Node::Group(nested) => {
                    groups.push(nested.name.clone());
                    if nested.has_selected(groups, &self.config) {
                        reporter.on_group_start(&nested.name, groups.len() - 1);
                        self.run_group(nested, groups, hooks, reporter, state);
                    }
                    groups.pop();
                }
                Node::Case(case) => {
                    let info = CaseInfo {
                        groups: groups.clone(),
                        label: case.label,
                    };
                    let full_name = info.full_name();
                    if !self.config.selects(&full_name) {
                        tracing::trace!(case = %full_name, "filtered out");
                        continue;
                    }

                    reporter.on_case_start(&info);
                    let result = self.run_case(case.case, hooks, &full_name);
                    reporter.on_case_complete(&info, &result);

                    if result.is_failure() && self.config.stop_on_fail {
                        state.stopped = true;
                    }
                    state.report.summary.record(&result);
                    state.report.results.push((info, result));
                }
            }
        }

        hooks.truncate(hooks_before);
    }

    fn run_case(&mut self, case: RegisteredCase, hooks: &[usize], full_name: &str) -> CaseResult {
        if matches!(case, RegisteredCase::Skipped) {
            tracing::debug!(case = %full_name, "skipped");
            return CaseResult::Skipped;
        }

        let start = Instant::now();
        // Panic messages reach the report through `CaseFailure::Panicked`
        let quiet = QuietPanics::enter();
        let outcome = self.run_hooks(hooks).and_then(|()| match case {
            RegisteredCase::Sync(body) => match catch_unwind(AssertUnwindSafe(body)) {
                Ok(result) => result.map_err(CaseFailure::Setup),
                Err(payload) => Err(CaseFailure::from_panic(payload)),
            },
            RegisteredCase::Async(body) => self.run_async(body),
            RegisteredCase::Skipped => Ok(()),
        });
        drop(quiet);
        let duration = start.elapsed();

        match outcome {
            Ok(()) => {
                tracing::debug!(case = %full_name, ?duration, "passed");
                CaseResult::Passed(duration)
            }
            Err(failure) => {
                tracing::debug!(case = %full_name, %failure, "failed");
                CaseResult::Failed(duration, failure)
            }
        }
    }

    fn run_hooks(&mut self, hooks: &[usize]) -> Result<(), CaseFailure> {
        for &id in hooks {
            let Some(hook) = self.hooks.get_mut(id) else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| hook())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(CaseFailure::Setup(e)),
                Err(payload) => return Err(CaseFailure::from_panic(payload)),
            }
        }
        Ok(())
    }

    fn run_async(&mut self, body: AsyncCaseFn) -> Result<(), CaseFailure> {
        let limit = self.config.async_timeout;
        let runtime = self.runtime()?;

        let future = catch_unwind(AssertUnwindSafe(body)).map_err(CaseFailure::from_panic)??;
        let guarded = AssertUnwindSafe(future).catch_unwind();

        let settled = match limit {
            Some(limit) => runtime
                .block_on(async move { tokio::time::timeout(limit, guarded).await })
                .map_err(|_| CaseFailure::TimedOut(limit))?,
            None => runtime.block_on(guarded),
        };
        settled.map_err(CaseFailure::from_panic)
    }

    fn runtime(&mut self) -> Result<&Runtime, CaseFailure> {
        // block_on panics inside a running runtime, and so does dropping one built there
        if Handle::try_current().is_ok() {
            return Err(CaseFailure::Runtime(
                "an async runtime is already running on this thread; execute the harness outside of it".to_string(),
            ));
        }
        if self.runtime.is_none() {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CaseFailure::Runtime(e.to_string()))?;
            self.runtime = Some(runtime);
        }
        self.runtime
            .as_ref()
            .ok_or_else(|| CaseFailure::Runtime("runtime not initialised".to_string()))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl TestRunner for Harness {
    fn open_group(&mut self, name: &str, body: GroupBody<'_>) {
        tracing::debug!(group = name, "opened group");
        let parent = self.current_group();
        parent.children.push(Node::Group(GroupNode {
            name: name.to_string(),
            ..GroupNode::default()
        }));
        let idx = parent.children.len() - 1;

        self.open.push(idx);
        body(self);
        self.open.pop();
    }

    fn before_each_case(&mut self, hook: CaseHook) {
        self.hooks.push(hook);
        let id = self.hooks.len() - 1;
        self.current_group().hooks.push(id);
    }

    fn register_case(&mut self, label: &str, case: CaseFn) {
        self.push_case(label, RegisteredCase::Sync(case));
    }

    fn register_async_case(&mut self, label: &str, case: AsyncCaseFn) {
        self.push_case(label, RegisteredCase::Async(case));
    }

    fn register_skipped_case(&mut self, label: &str) {
        self.push_case(label, RegisteredCase::Skipped);
    }
}
