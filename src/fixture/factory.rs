//! Closure-backed fixture provider

use super::{FixtureConfig, FixtureProvider, ProviderBinding};
use crate::error::FixtureError;

type Factory<S, F> = Box<dyn FnMut(&S, &[ProviderBinding]) -> Result<F, FixtureError>>;

/// A [`FixtureProvider`] that builds fixtures with a factory closure.
///
/// `init_test` resolves the config's injectables into bindings; every `fixture_for` call passes the subject and the
/// current bindings to the factory.
pub struct FactoryProvider<S, F> {
    factory: Factory<S, F>,
    bindings: Vec<ProviderBinding>,
    imports: Vec<String>,
}

impl<S, F> FactoryProvider<S, F> {
    pub fn new(factory: impl FnMut(&S, &[ProviderBinding]) -> Result<F, FixtureError> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            bindings: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Provider whose factory cannot fail.
    pub fn infallible(mut factory: impl FnMut(&S) -> F + 'static) -> Self {
        Self::new(move |subject, _| Ok(factory(subject)))
    }

    /// Bindings resolved by the last `init_test`
    pub fn bindings(&self) -> &[ProviderBinding] {
        &self.bindings
    }

    /// Imports recorded by the last `init_test`
    pub fn imports(&self) -> &[String] {
        &self.imports
    }
}

impl<S, F> FixtureProvider for FactoryProvider<S, F> {
    type Subject = S;
    type Fixture = F;

    fn init_test(&mut self, config: &FixtureConfig<S>) -> Result<(), FixtureError> {
        if config.tested.is_none() {
            return Err(FixtureError::MissingSubject);
        }
        self.bindings = config.resolve_providers();
        self.imports.clone_from(&config.imports);
        tracing::trace!(bindings = self.bindings.len(), "fixture environment prepared");
        Ok(())
    }

    fn fixture_for(&mut self, subject: &S) -> Result<F, FixtureError> {
        (self.factory)(subject, &self.bindings)
    }
}
