//! Case kinds and registration planning

use futures::future::LocalBoxFuture;

/// How a case was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseKind {
    Normal,
    Skipped,
    Focused,
    Async,
    FocusedAsync,
}

/// What `run()` registers with the runner for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Sync,
    Async,
    Skip,
    /// Not registered at all
    Omit,
}

impl CaseKind {
    pub fn is_focused(self) -> bool {
        matches!(self, CaseKind::Focused | CaseKind::FocusedAsync)
    }
}

/// Decide how a case of `kind` is registered.
///
/// Skipped cases are always registered as skipped and focused cases always run. In focus mode the remaining cases
/// are dropped without a skip record.
pub fn plan(kind: CaseKind, focus_mode: bool) -> Registration {
    match kind {
        CaseKind::Skipped => Registration::Skip,
        CaseKind::Focused => Registration::Sync,
        CaseKind::FocusedAsync => Registration::Async,
        CaseKind::Normal | CaseKind::Async if focus_mode => Registration::Omit,
        CaseKind::Normal => Registration::Sync,
        CaseKind::Async => Registration::Async,
    }
}

/// Body of a synchronous case. Fails by panicking.
pub type SyncBody<F> = Box<dyn FnOnce(F)>;

/// Body of an asynchronous case. The case completes when the returned future settles.
pub type AsyncBody<F> = Box<dyn FnOnce(F) -> LocalBoxFuture<'static, ()>>;

pub enum CaseBody<F> {
    Sync(SyncBody<F>),
    Async(AsyncBody<F>),
}

/// One declared case: label, kind and body kept together.
pub struct CaseDescriptor<F> {
    pub label: String,
    pub kind: CaseKind,
    pub body: CaseBody<F>,
}
