use std::fmt;
use std::sync::Arc;

/// Call instruction a call site is bound to: the calling method and the
/// instruction index within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerLocation {
	pub method: Arc<str>,
	pub index: u32,
}

impl CallerLocation {
	pub fn new(method: impl Into<Arc<str>>, index: u32) -> Self {
		Self {
			method: method.into(),
			index,
		}
	}
}

impl fmt::Display for CallerLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.method, self.index)
	}
}

/// Call site failures. None of them change the call site's target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallSiteError {
	/// The offered target's signature differs from the call site's.
	#[error("target of type {found} should be of type {expected}")]
	SignatureMismatch { expected: String, found: String },

	/// The operation is not available on this call site kind.
	#[error("{operation} is not supported on a {kind} call site")]
	Unsupported {
		operation: &'static str,
		kind: &'static str,
	},

	/// A call reached a site whose target was never installed.
	#[error("uninitialized call site of type {signature}")]
	Uninitialized { signature: String },

	/// The call site is already bound to a call instruction.
	#[error("call site has already been linked to {existing}")]
	AlreadyLinked { existing: CallerLocation },
}
