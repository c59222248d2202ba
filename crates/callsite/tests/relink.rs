//! Bootstrap and engine threads sharing call sites.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use linkage_callsite::{CallSite, CallSiteError, CallSiteKind, Callable, CallerLocation, FnTarget};

type Target = FnTarget<&'static str, u64, u64>;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

fn times(n: u64) -> Target {
	FnTarget::new(format!("times {n}"), "(u64)u64", move |x| Ok(x * n))
}

/// A site reaches the engine before bootstrap links it, then gets linked.
#[test]
fn test_bootstrap_links_after_first_call() {
	init_tracing();

	let site: CallSite<Target> = CallSite::unlinked(CallSiteKind::Volatile, "(u64)u64").unwrap();
	site.bind_caller(CallerLocation::new("App.main", 7), &"(u64)u64").unwrap();
	let call = site.dynamic_invoker();

	assert!(matches!(call.invoke(3), Err(CallSiteError::Uninitialized { .. })));
	site.set_target(times(2)).unwrap();
	assert_eq!(call.invoke(3).unwrap(), 6);
}

/// Callers racing a relink only ever reach one of the installed targets, and
/// every call made after the relink completes reaches the new one.
#[test]
fn test_concurrent_callers_during_relinks() {
	init_tracing();

	for kind in [CallSiteKind::Plain, CallSiteKind::Volatile] {
		let site = Arc::new(CallSite::new(kind, times(1)));
		let stop = AtomicBool::new(false);

		thread::scope(|s| {
			for _ in 0..4 {
				let call = site.dynamic_invoker();
				let stop = &stop;
				s.spawn(move || {
					while !stop.load(Ordering::Acquire) {
						let out = call.invoke(10).unwrap();
						assert!(matches!(out, 10 | 20 | 30), "{kind}: unexpected result {out}");
					}
				});
			}

			for n in [2, 3, 1, 2, 3] {
				site.set_target(times(n)).unwrap();
				thread::yield_now();
			}
			stop.store(true, Ordering::Release);
		});

		assert_eq!(site.invoke(10).unwrap(), 30, "{kind}");
		assert_eq!(site.dynamic_invoker().invoke(10).unwrap(), 30, "{kind}");
	}
}

/// Relinks racing from several bootstrap threads leave exactly one of the
/// offered targets installed.
#[test]
fn test_racing_relinks_leave_one_winner() {
	init_tracing();

	let site = CallSite::volatile(times(0));
	thread::scope(|s| {
		for n in 1..=8 {
			let site = &site;
			s.spawn(move || site.set_target(times(n)).unwrap());
		}
	});

	let out = site.target().invoke(1).unwrap();
	assert!((1..=8).contains(&out));
	assert_eq!(site.invoke(1).unwrap(), out);
}
