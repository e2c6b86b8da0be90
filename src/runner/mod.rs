//! Test runner capability
//!
//! [`TestRunner`] is the boundary between a suite and whatever executes it. A suite only opens groups, registers
//! per-case setup hooks and registers cases; it never runs anything itself.
//!
//! ## Modules
//!
//! - `harness` - [`Harness`], the in-process runner shipped with this crate

pub mod harness;

pub use harness::Harness;

use futures::future::LocalBoxFuture;

use crate::error::FixtureError;

/// Setup step run before every executed case of a group.
pub type CaseHook = Box<dyn FnMut() -> Result<(), FixtureError>>;

/// A registered synchronous case. Fails by panicking, or with an error when its fixture is unavailable.
pub type CaseFn = Box<dyn FnOnce() -> Result<(), FixtureError>>;

/// A registered asynchronous case. The case is complete once the returned future settles.
pub type AsyncCaseFn = Box<dyn FnOnce() -> Result<LocalBoxFuture<'static, ()>, FixtureError>>;

/// Body of a group: registers hooks, cases and nested groups on the runner it is given.
pub type GroupBody<'a> = Box<dyn FnOnce(&mut dyn TestRunner) + 'a>;

/// Group and case registration primitives of a test framework.
///
/// Hooks apply to every case of the group they were registered in, including cases of nested groups. Before a case
/// runs, the hooks of its outermost group run first, each group's hooks in registration order. Skipped cases never
/// run hooks.
pub trait TestRunner {
    /// Open a named group and let `body` populate it.
    fn open_group(&mut self, name: &str, body: GroupBody<'_>);

    fn before_each_case(&mut self, hook: CaseHook);

    fn register_case(&mut self, label: &str, case: CaseFn);

    fn register_async_case(&mut self, label: &str, case: AsyncCaseFn);

    /// Register a case that is reported as skipped and never executed.
    fn register_skipped_case(&mut self, label: &str);
}
