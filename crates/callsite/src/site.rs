//! Call sites: a fixed signature plus a relinkable target.
//!
//! # Role
//!
//! The engine performs every dynamically linked call through a [`CallSite`],
//! either by reading [`CallSite::target`] or through the site's dynamic
//! invoker. Bootstrap code installs and relinks targets.
//!
//! # Invariants
//!
//! - The installed target's signature equals the site's signature at every instant.
//! - A constant site never changes its target.
//! - A failed relink leaves the previous target installed.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace, warn};

use crate::error::{CallSiteError, CallerLocation};
use crate::invoker::DynamicInvoker;
use crate::slot::TargetSlot;
use crate::target::Callable;

/// The closed set of call site variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSiteKind {
	/// Permanently bound; relinking is rejected.
	Constant,
	/// Relinkable; other threads observe a relink eventually, after an
	/// engine-defined synchronization point.
	Plain,
	/// Relinkable; a relink is observed by every read that follows it.
	Volatile,
}

impl CallSiteKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Constant => "constant",
			Self::Plain => "plain",
			Self::Volatile => "volatile",
		}
	}

	#[inline]
	pub const fn is_mutable(self) -> bool {
		!matches!(self, Self::Constant)
	}
}

impl fmt::Display for CallSiteKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An indirect call target with a fixed signature.
pub struct CallSite<T: Callable> {
	signature: T::Signature,
	slot: Arc<TargetSlot<T>>,
	cached_invoker: OnceLock<T>,
	caller: OnceLock<CallerLocation>,
}

impl<T: Callable> CallSite<T> {
	/// Creates a call site of `kind` linked to `target`; the site's signature
	/// is the target's.
	pub fn new(kind: CallSiteKind, target: T) -> Self {
		Self::with_slot(target.signature().clone(), kind, target, true)
	}

	/// Creates a mutable call site of `kind` with no real target yet.
	///
	/// Until [`set_target`](Self::set_target) installs one, invoking the site
	/// fails with [`CallSiteError::Uninitialized`].
	///
	/// # Errors
	///
	/// [`CallSiteError::Unsupported`] for [`CallSiteKind::Constant`], which
	/// could never be linked afterwards.
	pub fn unlinked(kind: CallSiteKind, signature: T::Signature) -> Result<Self, CallSiteError> {
		if !kind.is_mutable() {
			return Err(CallSiteError::Unsupported {
				operation: "unlinked construction",
				kind: kind.as_str(),
			});
		}
		let placeholder = uninitialized_target::<T>(signature.clone());
		Ok(Self::with_slot(signature, kind, placeholder, false))
	}

	pub fn constant(target: T) -> Self {
		Self::new(CallSiteKind::Constant, target)
	}

	pub fn plain(target: T) -> Self {
		Self::new(CallSiteKind::Plain, target)
	}

	pub fn volatile(target: T) -> Self {
		Self::new(CallSiteKind::Volatile, target)
	}

	fn with_slot(signature: T::Signature, kind: CallSiteKind, target: T, linked: bool) -> Self {
		Self {
			signature,
			slot: Arc::new(TargetSlot::new(kind, target, linked)),
			cached_invoker: OnceLock::new(),
			caller: OnceLock::new(),
		}
	}

	#[inline]
	pub fn kind(&self) -> CallSiteKind {
		self.slot.kind()
	}

	/// The signature fixed at construction.
	#[inline]
	pub fn signature(&self) -> &T::Signature {
		&self.signature
	}

	/// The current target.
	#[inline]
	pub fn target(&self) -> T {
		self.slot.load()
	}

	/// Whether a real target has been installed.
	///
	/// Read from the same cell as the target, so a reader that observes a
	/// relinked target also observes the site as linked.
	pub fn is_linked(&self) -> bool {
		self.slot.is_linked()
	}

	/// Relinks the site to `target`.
	///
	/// # Errors
	///
	/// - [`CallSiteError::Unsupported`] on a constant site, whatever the target.
	/// - [`CallSiteError::SignatureMismatch`] if `target` has a different signature.
	///
	/// On error the previous target stays installed.
	pub fn set_target(&self, target: T) -> Result<(), CallSiteError> {
		if let TargetSlot::Constant(_) = *self.slot {
			return Err(CallSiteError::Unsupported {
				operation: "relink",
				kind: CallSiteKind::Constant.as_str(),
			});
		}
		self.check_signature(target.signature())?;
		self.slot.store(target)?;
		trace!(kind = %self.kind(), signature = ?self.signature, "Call site relinked");
		Ok(())
	}

	/// Invokes the current target with `args`.
	#[inline]
	pub fn invoke(&self, args: T::Args) -> Result<T::Output, T::Error> {
		self.slot.with_current(|target| target.invoke(args))
	}

	/// Returns a handle that invokes whatever target this site holds when called.
	pub fn invoker(&self) -> DynamicInvoker<T> {
		DynamicInvoker::new(self.signature.clone(), Arc::clone(&self.slot))
	}

	/// Returns the site's dynamic invoker as a target.
	///
	/// Created on first use; later calls return the same target.
	pub fn dynamic_invoker(&self) -> T {
		self.cached_invoker
			.get_or_init(|| {
				debug!(kind = %self.kind(), signature = ?self.signature, "Dynamic invoker created");
				self.invoker().into_target()
			})
			.clone()
	}

	/// Binds this site to the call instruction at `location`.
	///
	/// `signature` is the call shape the instruction expects.
	///
	/// # Errors
	///
	/// - [`CallSiteError::AlreadyLinked`] if the site is already bound.
	/// - [`CallSiteError::SignatureMismatch`] if `signature` differs from the site's.
	pub fn bind_caller(&self, location: CallerLocation, signature: &T::Signature) -> Result<(), CallSiteError> {
		if let Some(existing) = self.caller.get() {
			return Err(CallSiteError::AlreadyLinked { existing: existing.clone() });
		}
		self.check_signature(signature)?;

		let mut installed = false;
		let bound = self.caller.get_or_init(|| {
			installed = true;
			location
		});
		if !installed {
			return Err(CallSiteError::AlreadyLinked { existing: bound.clone() });
		}
		debug!(caller = %bound, kind = %self.kind(), "Call site bound to caller");
		Ok(())
	}

	/// The call instruction this site is bound to, if any.
	pub fn caller(&self) -> Option<&CallerLocation> {
		self.caller.get()
	}

	fn check_signature(&self, offered: &T::Signature) -> Result<(), CallSiteError> {
		if *offered == self.signature {
			return Ok(());
		}
		Err(CallSiteError::SignatureMismatch {
			expected: format!("{:?}", self.signature),
			found: format!("{offered:?}"),
		})
	}
}

impl<T: Callable> fmt::Debug for CallSite<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallSite")
			.field("kind", &self.kind())
			.field("signature", &self.signature)
			.field("linked", &self.is_linked())
			.field("caller", &self.caller.get())
			.finish()
	}
}

fn uninitialized_target<T: Callable>(signature: T::Signature) -> T {
	let rendered = format!("{signature:?}");
	T::from_fn(signature, "uninitialized call site", move |_| {
		warn!(signature = %rendered, "Invoked a call site before any target was installed");
		Err(CallSiteError::Uninitialized {
			signature: rendered.clone(),
		}
		.into())
	})
}
