//! Suite builder behaviour, observed through the runner it registers with

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use testbed::error::{CaseFailure, FixtureError};
use testbed::report::{CaseInfo, CaseResult, TestReporter, TestSummary};
use testbed::runner::{AsyncCaseFn, CaseFn, CaseHook, GroupBody};
use testbed::{FactoryProvider, FixtureConfig, FixtureProvider, Harness, Suite, TestRunner};

// ============================================================================
// Test doubles
// ============================================================================

/// Fixture handed out by [`CountingProvider`]
#[derive(Debug)]
struct Probe {
    id: usize,
    spied: bool,
}

/// Provider that numbers every fixture it builds
#[derive(Clone, Default)]
struct CountingProvider {
    built: Rc<Cell<usize>>,
    inits: Rc<Cell<usize>>,
}

impl FixtureProvider for CountingProvider {
    type Subject = &'static str;
    type Fixture = Probe;

    fn init_test(&mut self, _config: &FixtureConfig<&'static str>) -> Result<(), FixtureError> {
        self.inits.set(self.inits.get() + 1);
        Ok(())
    }

    fn fixture_for(&mut self, _subject: &&'static str) -> Result<Probe, FixtureError> {
        let id = self.built.get() + 1;
        self.built.set(id);
        Ok(Probe { id, spied: false })
    }
}

/// Calls a suite makes on its runner
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    OpenGroup(String),
    BeforeEach,
    Case(String),
    AsyncCase(String),
    Skipped(String),
}

/// Runner that records registrations without executing anything
#[derive(Default)]
struct RecordingRunner {
    events: Vec<Event>,
    hooks: Vec<CaseHook>,
}

impl TestRunner for RecordingRunner {
    fn open_group(&mut self, name: &str, body: GroupBody<'_>) {
        self.events.push(Event::OpenGroup(name.to_string()));
        body(self);
    }

    fn before_each_case(&mut self, hook: CaseHook) {
        self.events.push(Event::BeforeEach);
        self.hooks.push(hook);
    }

    fn register_case(&mut self, label: &str, _case: CaseFn) {
        self.events.push(Event::Case(label.to_string()));
    }

    fn register_async_case(&mut self, label: &str, _case: AsyncCaseFn) {
        self.events.push(Event::AsyncCase(label.to_string()));
    }

    fn register_skipped_case(&mut self, label: &str) {
        self.events.push(Event::Skipped(label.to_string()));
    }
}

/// Reporter that keeps every result
#[derive(Default)]
struct Collect {
    completed: Vec<(String, CaseResult)>,
    summary: Option<TestSummary>,
}

impl TestReporter for Collect {
    fn on_case_complete(&mut self, case: &CaseInfo, result: &CaseResult) {
        self.completed.push((case.full_name(), result.clone()));
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.summary = Some(summary.clone());
    }
}

fn widget_suite(provider: CountingProvider) -> Suite<CountingProvider> {
    Suite::create("Widget", provider).inject(FixtureConfig::new("Widget"))
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_registration_preserves_declaration_order() {
    let mut runner = RecordingRunner::default();
    widget_suite(CountingProvider::default())
        .test("one", |_| {})
        .test_async("two", |_| async {})
        .xtest("three", |_| {})
        .ftest("four", |_| {})
        .run(&mut runner);

    assert_eq!(
        runner.events,
        vec![
            Event::OpenGroup("Widget".to_string()),
            Event::BeforeEach,
            Event::Case("one".to_string()),
            Event::AsyncCase("two".to_string()),
            Event::Skipped("three".to_string()),
            Event::Case("four".to_string()),
        ]
    );
}

#[test]
fn test_disabled_suite_never_touches_runner() {
    let mut runner = RecordingRunner::default();
    widget_suite(CountingProvider::default())
        .test("one", |_| {})
        .xtest("two", |_| {})
        .disable()
        .run(&mut runner);

    assert!(runner.events.is_empty());
}

#[test]
fn test_disabled_empty_suite_opens_no_group() {
    let mut runner = RecordingRunner::default();
    Suite::create("Empty", CountingProvider::default()).disable().run(&mut runner);
    assert!(runner.events.is_empty());
}

#[test]
fn test_spy_hook_registers_second_setup_step() {
    let mut runner = RecordingRunner::default();
    widget_suite(CountingProvider::default())
        .spies(|_| {})
        .test("one", |_| {})
        .run(&mut runner);

    assert_eq!(
        runner.events,
        vec![
            Event::OpenGroup("Widget".to_string()),
            Event::BeforeEach,
            Event::BeforeEach,
            Event::Case("one".to_string()),
        ]
    );
}

#[test]
fn test_setup_hook_registers_before_spy_hook() {
    let mut runner = RecordingRunner::default();
    Suite::create("Widget", CountingProvider::default())
        .spies(|_| {})
        .test("one", |_| {})
        .run(&mut runner);

    // Without inject the setup step reports the suite; the spy step only finds an empty slot
    assert_eq!(runner.hooks.len(), 2);
    let [setup, spy] = &mut runner.hooks[..] else {
        unreachable!();
    };
    assert_eq!(
        setup(),
        Err(FixtureError::NotInjected {
            suite: "Widget".to_string()
        })
    );
    assert_eq!(spy(), Err(FixtureError::NotPrepared));
}

#[test]
fn test_focus_mode_omits_unfocused_cases() {
    let mut runner = RecordingRunner::default();
    widget_suite(CountingProvider::default())
        .test("plain", |_| {})
        .test_async("plain async", |_| async {})
        .ftest("focused", |_| {})
        .ftest_async("focused async", |_| async {})
        .xtest("skipped", |_| {})
        .xtest_async("skipped async", |_| async {})
        .focused()
        .run(&mut runner);

    assert_eq!(
        runner.events,
        vec![
            Event::OpenGroup("Widget".to_string()),
            Event::BeforeEach,
            Event::Case("focused".to_string()),
            Event::AsyncCase("focused async".to_string()),
            Event::Skipped("skipped".to_string()),
            Event::Skipped("skipped async".to_string()),
        ]
    );
}

#[test]
fn test_focused_cases_run_outside_focus_mode() {
    let mut runner = RecordingRunner::default();
    widget_suite(CountingProvider::default())
        .ftest("focused", |_| {})
        .test("plain", |_| {})
        .run(&mut runner);

    assert_eq!(runner.events[2..], [Event::Case("focused".to_string()), Event::Case("plain".to_string())]);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_skipped_body_never_runs() {
    let mut harness = Harness::default();
    widget_suite(CountingProvider::default())
        .xtest("explodes", |_| panic!("must not run"))
        .xtest_async("explodes later", |_| async { panic!("must not run"); })
        .test("fine", |_| {})
        .focused()
        .run(&mut harness);

    let mut reporter = Collect::default();
    let report = harness.execute(&mut reporter);

    assert!(report.summary.success());
    assert_eq!(report.summary.skipped, 2);
    assert_eq!(report.summary.passed, 0);
}

#[test]
fn test_focus_mode_runs_only_focused_bodies() {
    let plain_runs = Rc::new(Cell::new(0));
    let focused_runs = Rc::new(Cell::new(0));

    let mut harness = Harness::default();
    let plain = Rc::clone(&plain_runs);
    let focused = Rc::clone(&focused_runs);
    widget_suite(CountingProvider::default())
        .test("plain", move |_| plain.set(plain.get() + 1))
        .ftest("focused", move |_| focused.set(focused.get() + 1))
        .focused()
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert_eq!(plain_runs.get(), 0);
    assert_eq!(focused_runs.get(), 1);
    assert_eq!(report.summary.total, 1);
}

#[test]
fn test_each_case_gets_a_fresh_fixture() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let provider = CountingProvider::default();
    let inits = Rc::clone(&provider.inits);

    let mut harness = Harness::default();
    let first = Rc::clone(&seen);
    let second = Rc::clone(&seen);
    widget_suite(provider)
        .test("first", move |fx: Probe| first.borrow_mut().push(fx.id))
        .test("second", move |fx: Probe| second.borrow_mut().push(fx.id))
        .run(&mut harness);

    harness.execute(&mut Collect::default());

    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert_eq!(inits.get(), 2);
}

#[test]
fn test_spy_hook_sees_each_case_fixture_before_body() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut harness = Harness::default();
    let spy_log = Rc::clone(&log);
    let first = Rc::clone(&log);
    let second = Rc::clone(&log);
    widget_suite(CountingProvider::default())
        .spies(move |fx: &mut Probe| {
            fx.spied = true;
            spy_log.borrow_mut().push(format!("spy {}", fx.id));
        })
        .test("first", move |fx: Probe| {
            assert!(fx.spied);
            first.borrow_mut().push(format!("body {}", fx.id));
        })
        .test("second", move |fx: Probe| {
            assert!(fx.spied);
            second.borrow_mut().push(format!("body {}", fx.id));
        })
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert!(report.summary.success());
    assert_eq!(*log.borrow(), vec!["spy 1", "body 1", "spy 2", "body 2"]);
}

#[test]
fn test_second_spies_call_replaces_first() {
    let first_hits = Rc::new(Cell::new(0));
    let second_hits = Rc::new(Cell::new(0));

    let mut harness = Harness::default();
    let a = Rc::clone(&first_hits);
    let b = Rc::clone(&second_hits);
    widget_suite(CountingProvider::default())
        .spies(move |_| a.set(a.get() + 1))
        .spies(move |_| b.set(b.get() + 1))
        .test("one", |_| {})
        .run(&mut harness);

    harness.execute(&mut Collect::default());

    assert_eq!(first_hits.get(), 0);
    assert_eq!(second_hits.get(), 1);
}

#[test]
fn test_second_inject_call_replaces_first() {
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut harness = Harness::default();
    let record = Rc::clone(&seen);
    Suite::create("Widget", FactoryProvider::<&str, String>::infallible(|subject| subject.to_string()))
        .inject(FixtureConfig::new("First"))
        .inject(FixtureConfig::new("Second"))
        .test("built from", move |subject| record.borrow_mut().push(subject))
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert!(report.summary.success());
    assert_eq!(*seen.borrow(), vec!["Second".to_string()]);
}

#[test]
fn test_async_case_completes_after_future_settles() {
    let settled = Rc::new(Cell::new(false));

    struct SeesSettled {
        settled: Rc<Cell<bool>>,
        observed: Option<bool>,
    }

    impl TestReporter for SeesSettled {
        fn on_case_complete(&mut self, _case: &CaseInfo, _result: &CaseResult) {
            self.observed = Some(self.settled.get());
        }
        fn on_run_complete(&mut self, _summary: &TestSummary) {}
    }

    let mut harness = Harness::default();
    let flag = Rc::clone(&settled);
    widget_suite(CountingProvider::default())
        .test_async("x", move |_| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.set(true);
        })
        .run(&mut harness);

    let mut reporter = SeesSettled {
        settled: Rc::clone(&settled),
        observed: None,
    };
    let report = harness.execute(&mut reporter);

    assert_eq!(reporter.observed, Some(true));
    assert!(matches!(report.result_of("Widget > x"), Some(CaseResult::Passed(d)) if *d >= Duration::from_millis(20)));
}

#[test]
fn test_failing_case_does_not_abort_siblings() {
    let mut harness = Harness::default();
    widget_suite(CountingProvider::default())
        .test("broken", |fx: Probe| assert_eq!(fx.id, 99, "wrong fixture"))
        .test("fine", |_| {})
        .run(&mut harness);

    let mut reporter = Collect::default();
    let report = harness.execute(&mut reporter);

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(reporter.completed[1].0, "Widget > fine");
    assert!(matches!(
        report.result_of("Widget > broken"),
        Some(CaseResult::Failed(_, CaseFailure::Panicked(msg))) if msg.contains("wrong fixture")
    ));
}

#[test]
fn test_missing_inject_fails_each_case() {
    let mut harness = Harness::default();
    Suite::create("Orphan", CountingProvider::default())
        .test("one", |_| {})
        .test("two", |_| {})
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert_eq!(report.summary.failed, 2);
    assert!(matches!(
        report.result_of("Orphan > one"),
        Some(CaseResult::Failed(_, CaseFailure::Setup(FixtureError::NotInjected { suite }))) if suite == "Orphan"
    ));
}

#[test]
fn test_missing_subject_fails_case() {
    let mut harness = Harness::default();
    Suite::create("NoSubject", CountingProvider::default())
        .inject(FixtureConfig::default())
        .test("one", |_| {})
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert_eq!(
        report.result_of("NoSubject > one").map(CaseResult::is_failure),
        Some(true)
    );
}

/// Provider whose environment setup always fails
struct BrokenProvider;

impl FixtureProvider for BrokenProvider {
    type Subject = ();
    type Fixture = ();

    fn init_test(&mut self, _config: &FixtureConfig<()>) -> Result<(), FixtureError> {
        Err(FixtureError::Setup("module registry unavailable".to_string()))
    }

    fn fixture_for(&mut self, _subject: &()) -> Result<(), FixtureError> {
        Ok(())
    }
}

#[test]
fn test_provider_setup_error_is_propagated_unchanged() {
    let ran = Rc::new(Cell::new(false));
    let mut harness = Harness::default();
    let flag = Rc::clone(&ran);
    Suite::create("Broken", BrokenProvider)
        .inject(FixtureConfig::new(()))
        .test("one", move |_| flag.set(true))
        .run(&mut harness);

    let report = harness.execute(&mut Collect::default());

    assert!(!ran.get());
    assert!(matches!(
        report.result_of("Broken > one"),
        Some(CaseResult::Failed(_, CaseFailure::Setup(FixtureError::Setup(msg)))) if msg == "module registry unavailable"
    ));
}

#[test]
fn test_two_suites_share_one_harness() {
    let mut harness = Harness::default();
    widget_suite(CountingProvider::default()).test("a", |_| {}).run(&mut harness);
    Suite::create("Other", CountingProvider::default())
        .inject(FixtureConfig::new("Other"))
        .test("b", |_| {})
        .run(&mut harness);

    let mut reporter = Collect::default();
    harness.execute(&mut reporter);

    let names: Vec<_> = reporter.completed.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Widget > a", "Other > b"]);
}
