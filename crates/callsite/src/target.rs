//! Invocation target boundary.
//!
//! The engine owns the real representation of callable values and of their
//! signatures; call sites only need what [`Callable`] exposes.

use std::fmt;
use std::sync::Arc;

use crate::error::CallSiteError;

/// A callable value with a fixed signature.
///
/// Implementations must be cheap to clone (a handle onto shared state), since
/// call sites hand out clones on every [`CallSite::target`](crate::CallSite::target).
pub trait Callable: Clone + Send + Sync + 'static {
	/// Call shape; compared with `==` on every relink.
	type Signature: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
	type Args;
	type Output;
	/// Engine error type. Call sites report their own failures through it.
	type Error: From<CallSiteError>;

	fn signature(&self) -> &Self::Signature;

	fn invoke(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

	/// Wraps a closure as a target of `signature`.
	///
	/// Call sites use this for the uninitialized placeholder and for
	/// dynamic invokers; `label` names the target in diagnostics.
	fn from_fn<F>(signature: Self::Signature, label: &'static str, f: F) -> Self
	where
		F: Fn(Self::Args) -> Result<Self::Output, Self::Error> + Send + Sync + 'static;
}

type Body<A, R, E> = dyn Fn(A) -> Result<R, E> + Send + Sync;

/// [`Callable`] backed by a shared closure.
pub struct FnTarget<S, A, R, E = CallSiteError> {
	signature: S,
	label: Arc<str>,
	body: Arc<Body<A, R, E>>,
}

impl<S, A, R, E> FnTarget<S, A, R, E> {
	pub fn new<F>(label: impl Into<Arc<str>>, signature: S, f: F) -> Self
	where
		F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
	{
		Self {
			signature,
			label: label.into(),
			body: Arc::new(f),
		}
	}

	#[inline]
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Whether both handles share the same closure.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.body, &other.body)
	}
}

impl<S: Clone, A, R, E> Clone for FnTarget<S, A, R, E> {
	fn clone(&self) -> Self {
		Self {
			signature: self.signature.clone(),
			label: Arc::clone(&self.label),
			body: Arc::clone(&self.body),
		}
	}
}

impl<S: fmt::Debug, A, R, E> fmt::Debug for FnTarget<S, A, R, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnTarget")
			.field("label", &self.label)
			.field("signature", &self.signature)
			.finish()
	}
}

impl<S: fmt::Debug, A, R, E> fmt::Display for FnTarget<S, A, R, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{:?}", self.label, self.signature)
	}
}

impl<S, A, R, E> Callable for FnTarget<S, A, R, E>
where
	S: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
	A: 'static,
	R: 'static,
	E: From<CallSiteError> + 'static,
{
	type Signature = S;
	type Args = A;
	type Output = R;
	type Error = E;

	#[inline]
	fn signature(&self) -> &S {
		&self.signature
	}

	#[inline]
	fn invoke(&self, args: A) -> Result<R, E> {
		(self.body)(args)
	}

	fn from_fn<F>(signature: S, label: &'static str, f: F) -> Self
	where
		F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
	{
		Self::new(label, signature, f)
	}
}
