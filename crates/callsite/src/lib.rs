//! Relinkable call sites for dynamically linked invocation.
//!
//! # Purpose
//!
//! A [`CallSite`] pairs a signature, fixed for life, with a target that
//! bootstrap code may relink while other threads are calling through it.
//! The engine never caches a site's target across calls; it reads
//! [`CallSite::target`] or calls the site's [`DynamicInvoker`] every time.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Callable`] | Boundary trait for engine-provided targets and signatures. |
//! | [`CallSite`] | Signature plus current target, in one of three [`CallSiteKind`]s. |
//! | [`DynamicInvoker`] | Calls whatever target its site holds at call time. |
//! | [`FnTarget`] | Closure-backed [`Callable`] for embedders and tests. |
//!
//! # Variants
//!
//! - [`CallSiteKind::Constant`]: the initial target is permanent; relinking
//!   fails with [`CallSiteError::Unsupported`].
//! - [`CallSiteKind::Plain`]: relinks become visible to other threads
//!   eventually. Use when a short window of stale callers is acceptable.
//! - [`CallSiteKind::Volatile`]: a relink is visible to every subsequent read.
//!   Use when a target must stop being called promptly.
//!
//! # Invariants
//!
//! - The target's signature always equals the site's signature.
//!   - Enforced in: [`CallSite::set_target`].
//!   - Tested by: `invariants::test_signature_fixed_for_life`
//!   - Failure symptom: the engine calls a target with the wrong argument shape.
//!
//! - A constant site keeps its initial target.
//!   - Enforced in: [`CallSite::set_target`] and `slot::TargetSlot::store`.
//!   - Tested by: `invariants::test_constant_site_immutable`
//!   - Failure symptom: inlined calls diverge from calls through the site.
//!
//! - A volatile relink is seen by every later read on any thread.
//!   - Enforced in: `slot::TargetSlot` (atomic publication via `ArcSwap`).
//!   - Tested by: `invariants::test_volatile_relink_visible`
//!   - Failure symptom: a torn-down target keeps receiving calls.
//!
//! - A dynamic invoker always dispatches to the current target.
//!   - Enforced in: [`DynamicInvoker::invoke`] (reads the shared slot per call).
//!   - Tested by: `invariants::test_invoker_sees_relink`
//!   - Failure symptom: calls through the invoker reach a stale target.

mod error;
mod invoker;
mod site;
mod slot;
mod target;

pub use error::{CallSiteError, CallerLocation};
pub use invoker::DynamicInvoker;
pub use site::{CallSite, CallSiteKind};
pub use target::{Callable, FnTarget};

#[cfg(any(test, doc))]
pub(crate) mod invariants;
