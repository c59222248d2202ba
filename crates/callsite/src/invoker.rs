use std::fmt;
use std::sync::Arc;

use crate::slot::TargetSlot;
use crate::target::Callable;

/// Invokes whatever target its call site holds at the moment of the call.
///
/// Holds the site's target storage, not the site itself: it never keeps a
/// [`CallSite`](crate::CallSite) alive, and it never caches a target.
pub struct DynamicInvoker<T: Callable> {
	signature: T::Signature,
	slot: Arc<TargetSlot<T>>,
}

impl<T: Callable> DynamicInvoker<T> {
	pub(crate) fn new(signature: T::Signature, slot: Arc<TargetSlot<T>>) -> Self {
		Self { signature, slot }
	}

	#[inline]
	pub fn signature(&self) -> &T::Signature {
		&self.signature
	}

	/// Invokes the current target with `args`.
	#[inline]
	pub fn invoke(&self, args: T::Args) -> Result<T::Output, T::Error> {
		self.slot.with_current(|target| target.invoke(args))
	}

	/// The target a call made now would reach.
	pub fn current_target(&self) -> T {
		self.slot.load()
	}

	/// Packages this invoker as a target of the site's signature.
	pub fn into_target(self) -> T {
		let signature = self.signature.clone();
		T::from_fn(signature, "dynamic invoker", move |args| self.invoke(args))
	}
}

impl<T: Callable> Clone for DynamicInvoker<T> {
	fn clone(&self) -> Self {
		Self {
			signature: self.signature.clone(),
			slot: Arc::clone(&self.slot),
		}
	}
}

impl<T: Callable> fmt::Debug for DynamicInvoker<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DynamicInvoker")
			.field("kind", &self.slot.kind())
			.field("signature", &self.signature)
			.finish()
	}
}
