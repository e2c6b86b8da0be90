//! Declarative suite builder
//!
//! A [`Suite`] is assembled with chained calls and registered with a [`TestRunner`] by [`Suite::run`]:
//!
//! ```
//! use testbed::{FactoryProvider, FixtureConfig, Harness, Suite};
//! use testbed::report::ConsoleReporter;
//!
//! struct Widget {
//!     title: String,
//! }
//!
//! let provider = FactoryProvider::<&str, Widget>::infallible(|_| Widget { title: "Hello".to_string() });
//! let mut harness = Harness::default();
//!
//! Suite::create("Widget", provider)
//!     .inject(FixtureConfig::new("Widget"))
//!     .test("renders title", |fx: Widget| assert_eq!(fx.title, "Hello"))
//!     .xtest("future feature", |_| panic!("not implemented"))
//!     .run(&mut harness);
//!
//! let report = harness.execute(&mut ConsoleReporter::new(false));
//! assert!(report.summary.success());
//! assert_eq!(report.summary.skipped, 1);
//! ```
//!
//! Declaration order is preserved. Skip and focus filtering happen once, at `run()`; see [`case::plan`].

pub mod case;

pub use case::{CaseKind, Registration, plan};

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;

use self::case::{CaseBody, CaseDescriptor};
use crate::error::FixtureError;
use crate::fixture::{FixtureConfig, FixtureProvider};
use crate::runner::{AsyncCaseFn, CaseFn, CaseHook, TestRunner};

type SpyHook<F> = Box<dyn FnMut(&mut F)>;

/// Per-case fixture handed from the setup hooks to the case body
type FixtureSlot<F> = Rc<RefCell<Option<F>>>;

/// A named, ordered group of cases sharing one fixture configuration.
pub struct Suite<P: FixtureProvider> {
    description: String,
    provider: P,
    configuration: Option<FixtureConfig<P::Subject>>,
    cases: Vec<CaseDescriptor<P::Fixture>>,
    spy_hook: Option<SpyHook<P::Fixture>>,
    disabled: bool,
    focus_mode: bool,
}

impl<P> Suite<P>
where
    P: FixtureProvider + 'static,
    P::Subject: 'static,
    P::Fixture: 'static,
{
    /// Create an empty suite whose fixtures come from `provider`.
    pub fn create(description: impl Into<String>, provider: P) -> Self {
        Self {
            description: description.into(),
            provider,
            configuration: None,
            cases: Vec::new(),
            spy_hook: None,
            disabled: false,
            focus_mode: false,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of declared cases, whatever their kind
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Attach the fixture configuration. A second call replaces the first.
    pub fn inject(mut self, config: FixtureConfig<P::Subject>) -> Self {
        if self.configuration.is_some() {
            tracing::warn!(suite = %self.description, "fixture configuration replaced");
        }
        self.configuration = Some(config);
        self
    }

    /// Run `hook` on each case's fresh fixture before the case body. A second call replaces the first.
    pub fn spies(mut self, hook: impl FnMut(&mut P::Fixture) + 'static) -> Self {
        if self.spy_hook.is_some() {
            tracing::warn!(suite = %self.description, "spy hook replaced");
        }
        self.spy_hook = Some(Box::new(hook));
        self
    }

    pub fn test(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) + 'static) -> Self {
        self.push_sync(label, CaseKind::Normal, body)
    }

    /// Declare a case that is reported as skipped and never executed.
    pub fn xtest(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) + 'static) -> Self {
        self.push_sync(label, CaseKind::Skipped, body)
    }

    /// Declare a case that still runs when the suite is in focus mode.
    pub fn ftest(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) + 'static) -> Self {
        self.push_sync(label, CaseKind::Focused, body)
    }

    /// Declare a case that completes when the future returned by `body` settles.
    pub fn test_async<Fut>(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = ()> + 'static,
    {
        self.push_async(label, CaseKind::Async, body)
    }

    pub fn ftest_async<Fut>(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = ()> + 'static,
    {
        self.push_async(label, CaseKind::FocusedAsync, body)
    }

    /// Same as [`Suite::xtest`]: a skipped async case is an ordinary skipped case.
    pub fn xtest_async<Fut>(self, label: impl Into<String>, body: impl FnOnce(P::Fixture) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = ()> + 'static,
    {
        self.push_async(label, CaseKind::Skipped, body)
    }

    /// Make `run()` a no-op.
    pub fn disable(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Only focused cases run; other runnable cases are left out entirely.
    pub fn focused(mut self) -> Self {
        self.focus_mode = true;
        self
    }

    fn push_sync(mut self, label: impl Into<String>, kind: CaseKind, body: impl FnOnce(P::Fixture) + 'static) -> Self {
        self.cases.push(CaseDescriptor {
            label: label.into(),
            kind,
            body: CaseBody::Sync(Box::new(body)),
        });
        self
    }

    fn push_async<Fut>(mut self, label: impl Into<String>, kind: CaseKind, body: impl FnOnce(P::Fixture) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = ()> + 'static,
    {
        self.cases.push(CaseDescriptor {
            label: label.into(),
            kind,
            body: CaseBody::Async(Box::new(move |fixture| body(fixture).boxed_local())),
        });
        self
    }

    /// Register the suite with `runner`.
    ///
    /// Opens one group named after the suite, registers the fixture setup (and the spy hook, if any) to run before
    /// every case, then registers the cases in declaration order. A disabled suite does not touch the runner.
    #[tracing::instrument(skip_all, fields(suite = %self.description, cases = self.cases.len()))]
    pub fn run(self, runner: &mut dyn TestRunner) {
        if self.disabled {
            tracing::debug!("suite disabled, nothing registered");
            return;
        }

        let Suite {
            description,
            provider,
            configuration,
            cases,
            spy_hook,
            focus_mode,
            ..
        } = self;

        let slot: FixtureSlot<P::Fixture> = Rc::new(RefCell::new(None));
        let suite_name = description.clone();

        runner.open_group(
            &description,
            Box::new(move |runner: &mut dyn TestRunner| {
                runner.before_each_case(setup_hook(suite_name, provider, configuration, Rc::clone(&slot)));
                if let Some(spy) = spy_hook {
                    runner.before_each_case(spy_step(spy, Rc::clone(&slot)));
                }

                for CaseDescriptor { label, kind, body } in cases {
                    match plan(kind, focus_mode) {
                        Registration::Omit => {
                            tracing::trace!(case = %label, "omitted in focus mode");
                        }
                        Registration::Skip => runner.register_skipped_case(&label),
                        Registration::Sync | Registration::Async => match body {
                            CaseBody::Sync(body) => runner.register_case(&label, sync_case(body, Rc::clone(&slot))),
                            CaseBody::Async(body) => {
                                runner.register_async_case(&label, async_case(body, Rc::clone(&slot)))
                            }
                        },
                    }
                }
            }),
        );
    }
}

/// Prepare the environment and build a fresh fixture into `slot`.
fn setup_hook<P>(
    suite: String,
    mut provider: P,
    configuration: Option<FixtureConfig<P::Subject>>,
    slot: FixtureSlot<P::Fixture>,
) -> CaseHook
where
    P: FixtureProvider + 'static,
    P::Subject: 'static,
    P::Fixture: 'static,
{
    Box::new(move || {
        *slot.borrow_mut() = None;
        let config = configuration.as_ref().ok_or_else(|| FixtureError::NotInjected {
            suite: suite.clone(),
        })?;
        provider.init_test(config)?;
        let subject = config.tested.as_ref().ok_or(FixtureError::MissingSubject)?;
        let fixture = provider.fixture_for(subject)?;
        *slot.borrow_mut() = Some(fixture);
        Ok(())
    })
}

fn spy_step<F: 'static>(mut spy: SpyHook<F>, slot: FixtureSlot<F>) -> CaseHook {
    Box::new(move || {
        let mut guard = slot.borrow_mut();
        let fixture = guard.as_mut().ok_or(FixtureError::NotPrepared)?;
        spy(fixture);
        Ok(())
    })
}

fn sync_case<F: 'static>(body: case::SyncBody<F>, slot: FixtureSlot<F>) -> CaseFn {
    Box::new(move || {
        let fixture = slot.borrow_mut().take().ok_or(FixtureError::NotPrepared)?;
        body(fixture);
        Ok(())
    })
}

fn async_case<F: 'static>(body: case::AsyncBody<F>, slot: FixtureSlot<F>) -> AsyncCaseFn {
    Box::new(move || {
        let fixture = slot.borrow_mut().take().ok_or(FixtureError::NotPrepared)?;
        Ok(body(fixture))
    })
}
