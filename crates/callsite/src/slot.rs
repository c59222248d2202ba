//! Target storage, one strategy per call site kind.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::CallSiteError;
use crate::site::CallSiteKind;
use crate::target::Callable;

/// A target together with whether it is a real target or the placeholder
/// installed by [`CallSite::unlinked`](crate::CallSite::unlinked).
///
/// Published as one value so the link state can never lag the target.
pub(crate) struct Installed<T> {
	pub(crate) target: T,
	pub(crate) linked: bool,
}

/// Storage cell for a call site's current target.
///
/// Shared between the call site and its dynamic invoker, so relinks made
/// through the site are observed by the invoker without either holding the
/// other.
pub(crate) enum TargetSlot<T> {
	/// Installed once; read without synchronization. Always linked.
	Constant(T),
	/// Relinkable; readers are only promised the new target eventually.
	///
	/// Safe Rust has no non-atomic field that one thread may replace while
	/// others read it, so this variant shares the atomic cell of `Volatile`
	/// and in practice pays the same (small) publication cost. Callers must
	/// still assume only eventual visibility.
	Plain(ArcSwap<Installed<T>>),
	/// Relinkable; a relink is visible to every later read.
	Volatile(ArcSwap<Installed<T>>),
}

impl<T: Callable> TargetSlot<T> {
	pub(crate) fn new(kind: CallSiteKind, target: T, linked: bool) -> Self {
		let installed = Installed { target, linked };
		match kind {
			CallSiteKind::Constant => Self::Constant(installed.target),
			CallSiteKind::Plain => Self::Plain(ArcSwap::from_pointee(installed)),
			CallSiteKind::Volatile => Self::Volatile(ArcSwap::from_pointee(installed)),
		}
	}

	pub(crate) fn kind(&self) -> CallSiteKind {
		match self {
			Self::Constant(_) => CallSiteKind::Constant,
			Self::Plain(_) => CallSiteKind::Plain,
			Self::Volatile(_) => CallSiteKind::Volatile,
		}
	}

	/// Clones out the current target.
	#[inline]
	pub(crate) fn load(&self) -> T {
		match self {
			Self::Constant(target) => target.clone(),
			Self::Plain(cell) | Self::Volatile(cell) => cell.load().target.clone(),
		}
	}

	/// Whether the current target is a real target, read from the same cell
	/// as the target itself.
	pub(crate) fn is_linked(&self) -> bool {
		match self {
			Self::Constant(_) => true,
			Self::Plain(cell) | Self::Volatile(cell) => cell.load().linked,
		}
	}

	/// Runs `f` against the current target without cloning it.
	#[inline]
	pub(crate) fn with_current<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		match self {
			Self::Constant(target) => f(target),
			Self::Plain(cell) | Self::Volatile(cell) => f(&cell.load().target),
		}
	}

	/// Replaces the current target. The caller has already checked the signature.
	pub(crate) fn store(&self, target: T) -> Result<(), CallSiteError> {
		match self {
			Self::Constant(_) => Err(CallSiteError::Unsupported {
				operation: "relink",
				kind: CallSiteKind::Constant.as_str(),
			}),
			Self::Plain(cell) | Self::Volatile(cell) => {
				cell.store(Arc::new(Installed { target, linked: true }));
				Ok(())
			}
		}
	}
}
