//! Module and package registries for loader scopes.
//!
//! # Purpose
//!
//! A [`ModuleRegistry`] records, for one loader scope, which [`Module`] owns
//! each package and which providers are offered for each named service. The
//! built-in scope has a process-wide instance, [`system_registry`].
//!
//! # Mental Model
//!
//! 1. **Build:** a bootstrap collaborator assembles an immutable [`Module`]
//!    with [`Module::builder`].
//! 2. **Register:** [`ModuleRegistry::register`] validates and publishes the
//!    module under the write lock, all or nothing.
//! 3. **Link:** the linker calls [`ModuleRegistry::lookup_module`] and
//!    [`ModuleRegistry::find_services`] under the shared read lock.
//!
//! # Concurrency
//!
//! - **Reads:** any number of concurrent readers; they wait only while a
//!   registration holds the write lock.
//! - **Writes:** exclusive; validation and mutation share one critical section.
//!
//! # Invariants
//!
//! - A package is owned by exactly one module per registry.
//!   - Enforced in: [`ModuleRegistry::register`].
//!   - Tested by: `invariants::test_package_disjointness`
//!   - Failure symptom: lookups flip between modules depending on registration order.
//!
//! - A rejected registration changes nothing.
//!   - Enforced in: [`ModuleRegistry::register`] (validate before apply, same lock).
//!   - Tested by: `invariants::test_rejected_registration_is_invisible`
//!   - Failure symptom: packages of a failed module resolve to it anyway.
//!
//! - Service providers only grow, by set union.
//!   - Enforced in: [`Providers`] aggregation on register.
//!   - Tested by: `invariants::test_service_union`
//!   - Failure symptom: a later module hides providers of an earlier one.
//!
//! - Readers never observe a partial registration.
//!   - Enforced in: the registry's `RwLock`.
//!   - Tested by: `invariants::test_no_partial_registration_observed`
//!   - Failure symptom: a module is found by one of its packages but not another.
//!
//! With `debug_assertions` or the `registry-contracts` feature, every
//! successful registration re-checks the package index against the package set.

mod error;
mod module;
mod registry;

pub use error::RegistrationError;
pub use module::{Module, ModuleBuilder, ProviderNames};
pub use registry::{ModuleRegistry, Providers, system_registry};

#[cfg(any(test, doc))]
pub(crate) mod invariants;
