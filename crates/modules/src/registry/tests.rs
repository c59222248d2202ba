use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use super::*;

fn named(name: &str, packages: &[&str]) -> Module {
	Module::builder(name).packages(packages.iter().copied()).build()
}

/// Lookups of a registered package keep returning the same module.
#[test]
fn test_lookup_is_stable() {
	let registry = ModuleRegistry::new("test");
	let m = Arc::new(named("core", &["core.lang", "core.io"]));
	registry.register(Arc::clone(&m)).unwrap();

	for _ in 0..3 {
		let found = registry.lookup_module("core.io").expect("core.io registered");
		assert!(Arc::ptr_eq(&found, &m));
	}
	assert!(registry.lookup_module("core").is_none());
	assert!(registry.lookup_module("").is_none());
}

#[test]
fn test_duplicate_module_name_rejected() {
	let registry = ModuleRegistry::new("app");
	registry.register(named("x", &["x.a"])).unwrap();

	let err = registry.register(named("x", &["x.b"])).unwrap_err();
	assert_eq!(
		err,
		RegistrationError::DuplicateModule {
			scope: "app",
			name: "x".into()
		}
	);
	assert!(registry.lookup_module("x.b").is_none());
	assert_eq!(err.to_string(), "module x already registered in scope app");
}

/// Name conflicts are reported before package problems.
#[test]
fn test_duplicate_name_checked_before_packages() {
	let registry = ModuleRegistry::new("test");
	registry.register(named("x", &["x.a"])).unwrap();

	let err = registry.register(named("x", &["", "x.a"])).unwrap_err();
	assert!(matches!(err, RegistrationError::DuplicateModule { .. }));
}

#[test]
fn test_unnamed_module_rejected() {
	let registry = ModuleRegistry::new("test");
	assert_eq!(registry.register(Module::unnamed()).unwrap_err(), RegistrationError::UnnamedModule);
	assert!(registry.is_empty());
}

#[test]
fn test_duplicate_package_message_names_owner() {
	let registry = ModuleRegistry::new("test");
	registry.register(named("a", &["shared"])).unwrap();
	let err = registry.register(named("b", &["shared"])).unwrap_err();
	assert_eq!(err.to_string(), "package shared of module b already defined by module a");
}

#[test]
fn test_find_services_unknown_is_empty() {
	let registry = ModuleRegistry::new("test");
	let providers = registry.find_services("nothing");
	assert!(providers.is_empty());
	assert_eq!(providers, Providers::default());
}

#[test]
fn test_declared_service_without_providers_creates_entry() {
	let registry = ModuleRegistry::new("test");
	registry
		.register(Module::builder("a").package("a").uses_service("S").build())
		.unwrap();
	registry
		.register(Module::builder("b").package("b").provides("S", "b.Impl").build())
		.unwrap();
	assert_eq!(registry.find_services("S").iter().collect::<Vec<_>>(), vec!["b.Impl"]);
}

#[test]
fn test_repeated_provider_is_deduplicated() {
	let registry = ModuleRegistry::new("test");
	registry
		.register(Module::builder("a").package("a").provides("S", "same").build())
		.unwrap();
	registry
		.register(Module::builder("b").package("b").provides("S", "same").build())
		.unwrap();
	let providers = registry.find_services("S");
	assert_eq!(providers.len(), 1);
	assert!(providers.contains("same"));
}

#[test]
fn test_system_registry_is_singleton() {
	let a = system_registry();
	let b = ModuleRegistry::system();
	assert!(std::ptr::eq(a, b));
	assert_eq!(a.label(), "system");
}

#[test]
fn test_debug_reports_counts() {
	let registry = ModuleRegistry::new("dbg");
	registry
		.register(Module::builder("a").packages(["a.x", "a.y"]).provides("S", "p").build())
		.unwrap();
	let out = format!("{registry:?}");
	assert!(out.contains("label: \"dbg\""), "{out}");
	assert!(out.contains("modules: 1"), "{out}");
	assert!(out.contains("packages: 2"), "{out}");
}

/// Registry scopes are independent: two scopes may own the same package.
#[test]
fn test_scopes_are_isolated() {
	let app = ModuleRegistry::new("app");
	let plugin = ModuleRegistry::new("plugin");
	app.register(named("m", &["shared.pkg"])).unwrap();
	plugin.register(named("m", &["shared.pkg"])).unwrap();
	assert_eq!(app.lookup_module("shared.pkg").unwrap().name(), "m");
	assert_eq!(plugin.lookup_module("shared.pkg").unwrap().name(), "m");
}

fn arb_package() -> impl Strategy<Value = String> {
	"[a-d]{1,2}"
}

proptest! {
	/// Whatever the registration order, every package resolves to the first
	/// module that claimed it and later claimants are rejected wholesale.
	#[test]
	fn prop_first_claim_wins(modules in prop::collection::vec(prop::collection::btree_set(arb_package(), 1..4), 1..8)) {
		let registry = ModuleRegistry::new("prop");
		let mut owned: BTreeSet<String> = BTreeSet::new();
		let mut accepted = Vec::new();

		for (i, pkgs) in modules.iter().enumerate() {
			let name = format!("m{i}");
			let clash = pkgs.iter().any(|p| owned.contains(p));
			let result = registry.register(
				Module::builder(name.as_str())
					.packages(pkgs.iter().map(String::as_str))
					.provides("svc", name.as_str())
					.build(),
			);
			prop_assert_eq!(result.is_err(), clash);
			if !clash {
				owned.extend(pkgs.iter().cloned());
				accepted.push((name, pkgs.clone()));
			}
		}

		for (name, pkgs) in &accepted {
			for p in pkgs {
				let owner = registry.lookup_module(p).unwrap();
				prop_assert_eq!(owner.name(), name.as_str());
			}
		}
		prop_assert_eq!(registry.package_count(), owned.len());
		let expected: Vec<&str> = {
			let mut names: Vec<&str> = accepted.iter().map(|(n, _)| n.as_str()).collect();
			names.sort_unstable();
			names
		};
		let providers = registry.find_services("svc");
		prop_assert_eq!(providers.iter().collect::<Vec<_>>(), expected);
	}
}
