#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use crate::{CallSite, CallSiteError, CallSiteKind, Callable, FnTarget};

type Target = FnTarget<&'static str, i64, i64>;

fn returning(sig: &'static str, value: i64) -> Target {
	FnTarget::new(format!("returns {value}"), sig, move |_| Ok(value))
}

/// Invariant: a call site's signature is fixed for life and a mismatched
/// relink MUST leave the previous target installed.
pub(crate) fn inv_signature_fixed_for_life() {
	for kind in [CallSiteKind::Plain, CallSiteKind::Volatile] {
		let site = CallSite::new(kind, returning("(i64)i64", 0));
		let before = site.target();

		let err = site.set_target(returning("()void", 1)).unwrap_err();
		assert!(matches!(err, CallSiteError::SignatureMismatch { .. }), "{kind}: {err}");
		assert_eq!(*site.signature(), "(i64)i64");
		assert!(site.target().ptr_eq(&before), "{kind}: target changed on mismatch");
		assert_eq!(site.invoke(0).unwrap(), 0);
	}

	let constant = CallSite::constant(returning("(i64)i64", 0));
	let err = constant.set_target(returning("()void", 1)).unwrap_err();
	assert!(matches!(err, CallSiteError::Unsupported { .. }), "constant: {err}");
	assert_eq!(*constant.signature(), "(i64)i64");
}

#[cfg_attr(test, test)]
pub(crate) fn test_signature_fixed_for_life() {
	inv_signature_fixed_for_life()
}

/// Invariant: a constant site MUST keep its initial target, and every relink
/// attempt MUST fail with `Unsupported` whatever the offered signature.
pub(crate) fn inv_constant_site_immutable() {
	let t0 = returning("sig", 0);
	let site = CallSite::constant(t0.clone());

	for (sig, value) in [("sig", 1), ("other", 2), ("sig", 3)] {
		let err = site.set_target(returning(sig, value)).unwrap_err();
		assert_eq!(
			err,
			CallSiteError::Unsupported {
				operation: "relink",
				kind: "constant"
			}
		);
		assert!(site.target().ptr_eq(&t0));
	}
	assert!(site.is_linked());
	assert_eq!(site.dynamic_invoker().invoke(0).unwrap(), 0);
}

#[cfg_attr(test, test)]
pub(crate) fn test_constant_site_immutable() {
	inv_constant_site_immutable()
}

/// Invariant: once a reader observes a volatile relink, it MUST NOT observe
/// the previous target again, and it MUST observe the relink without any
/// synchronization beyond the site itself.
pub(crate) fn inv_volatile_relink_visible() {
	let site = CallSite::volatile(returning("sig", 0));

	thread::scope(|s| {
		let reader = s.spawn(|| {
			let deadline = Instant::now() + Duration::from_secs(10);
			while site.invoke(0).unwrap() != 1 {
				assert!(Instant::now() < deadline, "relink never became visible");
				std::hint::spin_loop();
			}
			for _ in 0..10_000 {
				assert_eq!(site.target().invoke(0).unwrap(), 1, "stale target after relink was seen");
			}
		});

		s.spawn(|| site.set_target(returning("sig", 1)).unwrap());
		reader.join().unwrap();
	});
}

#[cfg_attr(test, test)]
pub(crate) fn test_volatile_relink_visible() {
	inv_volatile_relink_visible()
}

/// Invariant: a dynamic invoker obtained before a relink MUST dispatch to the
/// relinked target.
pub(crate) fn inv_invoker_sees_relink() {
	for kind in [CallSiteKind::Plain, CallSiteKind::Volatile] {
		let site = CallSite::new(kind, returning("sig", 0));
		let invoker = site.dynamic_invoker();
		assert_eq!(invoker.invoke(0).unwrap(), 0);

		site.set_target(returning("sig", 1)).unwrap();
		assert_eq!(invoker.invoke(0).unwrap(), 1, "{kind}: invoker kept the old target");

		site.set_target(returning("sig", 2)).unwrap();
		assert_eq!(invoker.invoke(0).unwrap(), 2, "{kind}: invoker kept the old target");
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_invoker_sees_relink() {
	inv_invoker_sees_relink()
}
