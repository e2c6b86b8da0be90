//! Fixture configuration and the fixture-provider boundary
//!
//! A suite never builds fixtures itself. It hands its [`FixtureConfig`] to a [`FixtureProvider`], which prepares the
//! environment for each case and produces a fresh fixture on demand.
//!
//! ## Modules
//!
//! - `factory` - [`FactoryProvider`], a closure-backed provider

pub mod factory;

pub use factory::FactoryProvider;

use crate::error::FixtureError;

// ============================================================================
// Configuration
// ============================================================================

/// An injectable that the fixture environment should provide, optionally replaced by a stand-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectableMock {
    /// The real provider token
    pub injectable: String,
    /// The stand-in to provide instead, if any
    pub use_instead: Option<String>,
}

impl InjectableMock {
    /// Provide the injectable as itself.
    pub fn real(injectable: impl Into<String>) -> Self {
        Self {
            injectable: injectable.into(),
            use_instead: None,
        }
    }

    /// Provide `stub` wherever `injectable` is requested.
    pub fn replaced_by(injectable: impl Into<String>, stub: impl Into<String>) -> Self {
        Self {
            injectable: injectable.into(),
            use_instead: Some(stub.into()),
        }
    }
}

/// A resolved provider binding: requests for `provide` are served by `use_class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBinding {
    pub provide: String,
    pub use_class: String,
}

/// Subject under test plus its injectable overrides and imports.
///
/// Opaque to the suite: it is only passed through to the provider.
#[derive(Debug, Clone)]
pub struct FixtureConfig<S> {
    /// Descriptor of the unit under test
    pub tested: Option<S>,
    /// Services to provide in the fixture environment
    pub injectables: Vec<InjectableMock>,
    /// External modules the environment should load
    pub imports: Vec<String>,
}

impl<S> Default for FixtureConfig<S> {
    fn default() -> Self {
        Self {
            tested: None,
            injectables: Vec::new(),
            imports: Vec::new(),
        }
    }
}

impl<S> FixtureConfig<S> {
    /// Create a config for the given subject
    pub fn new(tested: S) -> Self {
        Self {
            tested: Some(tested),
            ..Self::default()
        }
    }

    /// Add an injectable
    pub fn with_injectable(mut self, injectable: InjectableMock) -> Self {
        self.injectables.push(injectable);
        self
    }

    /// Add an import
    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(import.into());
        self
    }

    /// Resolve injectables into provider bindings, in declaration order.
    ///
    /// An injectable with a stand-in is bound to the stand-in; one without is bound to itself.
    pub fn resolve_providers(&self) -> Vec<ProviderBinding> {
        self.injectables
            .iter()
            .map(|mock| ProviderBinding {
                provide: mock.injectable.clone(),
                use_class: mock.use_instead.clone().unwrap_or_else(|| mock.injectable.clone()),
            })
            .collect()
    }
}

// ============================================================================
// Provider Interface
// ============================================================================

/// Builds fixtures for a suite.
///
/// Passed explicitly to [`crate::Suite::create`]; there is no global environment to initialise first.
pub trait FixtureProvider {
    /// Descriptor of the subject under test
    type Subject;
    /// The instantiated fixture handed to case bodies
    type Fixture;

    /// Prepare the environment for one case. Called once before every executed case and must be idempotent.
    fn init_test(&mut self, config: &FixtureConfig<Self::Subject>) -> Result<(), FixtureError>;

    /// Construct a new fixture. Every call returns a fresh instance; nothing is cached.
    fn fixture_for(&mut self, subject: &Self::Subject) -> Result<Self::Fixture, FixtureError>;
}

/// A fixture whose rendered state can be refreshed after the subject changes.
pub trait Fixture {
    /// Propagate pending changes of the subject into its environment.
    fn detect_changes(&mut self) {}
}

/// Refresh every fixture in `fixtures`.
pub fn update<F: Fixture>(fixtures: &mut [&mut F]) {
    for fixture in fixtures.iter_mut() {
        fixture.detect_changes();
    }
}
