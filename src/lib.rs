#![forbid(unsafe_code)]
//! Declarative unit-test suites
//!
//! testbed lets a test file declare a suite with a fluent builder, against one shared fixture configuration, and
//! register it with any test runner that implements [`TestRunner`]. An in-process runner ([`Harness`]), console and
//! JSON reporters, and a `harness = false` entry point ([`cli::main`]) are included.
//!
//! - `suite` - the [`Suite`] builder and case planning
//! - `runner` - the [`TestRunner`] capability and the [`Harness`]
//! - `fixture` - [`FixtureProvider`], [`FixtureConfig`] and the closure-backed [`FactoryProvider`]
//! - `report` - [`report::TestReporter`] and its implementations
//! - `config` - [`HarnessConfig`]
//! - `cli` - argument parsing and process exit codes
//!
//! ## Panic Policy
//!
//! - **Library code**: errors are returned as `Result`. The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Case bodies**: fail by panicking, as Rust's assertion macros do. The harness catches the panic and records it
//!   against that case.
//!
//! - **True invariants**: a panic that would indicate a bug in this crate uses `unreachable!("INVARIANT: reason")`.

pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod suite;

pub use config::{HarnessConfig, OutputFormat};
pub use error::{CaseFailure, FixtureError};
pub use fixture::{FactoryProvider, Fixture, FixtureConfig, FixtureProvider, InjectableMock, ProviderBinding, update};
pub use runner::{Harness, TestRunner};
pub use suite::{CaseKind, Suite};
