#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::{Module, ModuleRegistry, RegistrationError};

fn module(name: &str, packages: &[&str]) -> Module {
	Module::builder(name).packages(packages.iter().copied()).build()
}

/// Invariant: a package is owned by exactly one module per registry.
pub(crate) fn inv_package_disjointness() {
	let registry = ModuleRegistry::new("test");
	registry.register(module("a", &["p.one", "p.two"])).unwrap();

	let err = registry.register(module("b", &["p.three", "p.two"])).unwrap_err();
	assert_eq!(
		err,
		RegistrationError::DuplicatePackage {
			package: "p.two".into(),
			module: "b".into(),
			owner: "a".into(),
		}
	);
	assert_eq!(registry.lookup_module("p.two").unwrap().name(), "a");
}

#[cfg_attr(test, test)]
pub(crate) fn test_package_disjointness() {
	inv_package_disjointness()
}

/// Invariant: a rejected registration MUST leave every index unchanged.
pub(crate) fn inv_rejected_registration_is_invisible() {
	let registry = ModuleRegistry::new("test");
	registry
		.register(Module::builder("base").package("base.lang").provides("S", "base.Impl").build())
		.unwrap();

	let bad = Module::builder("bad")
		.packages(["bad.ok", "", "bad.also"])
		.provides("S", "bad.Impl")
		.provides("T", "bad.Other")
		.build();
	assert_eq!(
		registry.register(bad).unwrap_err(),
		RegistrationError::InvalidPackage { module: "bad".into() }
	);

	assert!(!registry.contains_module("bad"));
	assert!(registry.lookup_module("bad.ok").is_none());
	assert!(registry.lookup_module("bad.also").is_none());
	assert_eq!(registry.find_services("S").iter().collect::<Vec<_>>(), vec!["base.Impl"]);
	assert!(registry.find_services("T").is_empty());
	assert_eq!(registry.module_count(), 1);
	assert_eq!(registry.package_count(), 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_rejected_registration_is_invisible() {
	inv_rejected_registration_is_invisible()
}

/// Invariant: providers for a service only grow, by set union.
pub(crate) fn inv_service_union() {
	let registry = ModuleRegistry::new("test");
	registry
		.register(Module::builder("a").package("a").provides("S", "p1").build())
		.unwrap();
	let before = registry.find_services("S");

	registry
		.register(Module::builder("b").package("b").provides("S", "p2").provides("S", "p1").build())
		.unwrap();

	let after = registry.find_services("S");
	assert_eq!(after.iter().collect::<Vec<_>>(), vec!["p1", "p2"]);
	// Snapshots handed out earlier are never mutated.
	assert_eq!(before.iter().collect::<Vec<_>>(), vec!["p1"]);
}

#[cfg_attr(test, test)]
pub(crate) fn test_service_union() {
	inv_service_union()
}

/// Invariant: readers MUST NOT observe a module through some of its packages
/// but not others.
pub(crate) fn inv_no_partial_registration_observed() {
	const MODULES: usize = 64;
	const PACKAGES: usize = 8;

	let registry = Arc::new(ModuleRegistry::new("test"));
	let done = AtomicBool::new(false);

	thread::scope(|s| {
		for _ in 0..4 {
			s.spawn(|| {
				while !done.load(Ordering::Acquire) {
					for m in 0..MODULES {
						let first = registry.lookup_module(&format!("m{m}.p0"));
						let last = registry.lookup_module(&format!("m{m}.p{}", PACKAGES - 1));
						if let Some(first) = first {
							let last = last.expect("module visible through first package but not last");
							assert!(Arc::ptr_eq(&first, &last));
						}
					}
				}
			});
		}

		s.spawn(|| {
			for m in 0..MODULES {
				let pkgs: Vec<String> = (0..PACKAGES).map(|p| format!("m{m}.p{p}")).collect();
				registry
					.register(Module::builder(format!("m{m}")).packages(pkgs).build())
					.unwrap();
			}
			done.store(true, Ordering::Release);
		});
	});

	assert_eq!(registry.module_count(), MODULES);
	assert_eq!(registry.package_count(), MODULES * PACKAGES);
}

#[cfg_attr(test, test)]
pub(crate) fn test_no_partial_registration_observed() {
	inv_no_partial_registration_observed()
}
