//! Per-scope module registry.
//!
//! # Role
//!
//! Answers "which module owns this package" and "who provides this service"
//! for one loader scope. Registration is rare and takes the write lock;
//! lookups happen on every link operation and share the read lock.
//!
//! # Invariants
//!
//! - Validation and mutation run inside one write-locked section; a rejected
//!   registration leaves every index untouched.
//! - `module_packages` and the keys of `package_to_module` always hold the same set.

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::{debug, warn};

use crate::error::RegistrationError;
use crate::module::{Module, ProviderNames};

static SYSTEM: LazyLock<ModuleRegistry> = LazyLock::new(|| ModuleRegistry::new("system"));

static NO_PROVIDERS: LazyLock<Arc<ProviderNames>> = LazyLock::new(|| Arc::new(ProviderNames::new()));

/// Returns the registry of the built-in loader scope.
///
/// Constructed on first use; every call returns the same instance.
pub fn system_registry() -> &'static ModuleRegistry {
	&SYSTEM
}

/// Immutable snapshot of the providers registered for one service.
///
/// Registering more providers publishes a fresh set; a `Providers` value
/// already handed out never changes.
#[derive(Clone)]
pub struct Providers(Arc<ProviderNames>);

impl Providers {
	#[inline]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn contains(&self, provider: &str) -> bool {
		self.0.contains(provider)
	}

	/// Provider descriptors in sorted order.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
		self.0.iter().map(|p| &**p)
	}

	fn union(&self, more: &ProviderNames) -> Self {
		if more.is_subset(&self.0) {
			return self.clone();
		}
		let mut set = ProviderNames::clone(&self.0);
		set.extend(more.iter().cloned());
		Self(Arc::new(set))
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self(Arc::clone(&NO_PROVIDERS))
	}
}

impl PartialEq for Providers {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl Eq for Providers {}

impl fmt::Debug for Providers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl<'a> IntoIterator for &'a Providers {
	type Item = &'a Arc<str>;
	type IntoIter = std::collections::btree_set::Iter<'a, Arc<str>>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

#[derive(Default)]
struct RegistryState {
	module_names: HashSet<Arc<str>>,
	/// Union of all registered packages; used for duplicate detection.
	module_packages: HashSet<Arc<str>>,
	package_to_module: HashMap<Arc<str>, Arc<Module>>,
	service_providers: HashMap<Arc<str>, Providers>,
}

impl RegistryState {
	fn validate(&self, scope: &'static str, module: &Module) -> Result<(), RegistrationError> {
		if !module.is_named() {
			return Err(RegistrationError::UnnamedModule);
		}
		if self.module_names.contains(module.name()) {
			return Err(RegistrationError::DuplicateModule {
				scope,
				name: module.name().to_owned(),
			});
		}
		for pkg in module.packages() {
			if pkg.is_empty() {
				return Err(RegistrationError::InvalidPackage {
					module: module.name().to_owned(),
				});
			}
			if self.module_packages.contains(pkg) {
				let owner = self
					.package_to_module
					.get(pkg)
					.map_or_else(String::new, |m| m.name().to_owned());
				return Err(RegistrationError::DuplicatePackage {
					package: pkg.to_owned(),
					module: module.name().to_owned(),
					owner,
				});
			}
		}
		Ok(())
	}

	fn apply(&mut self, module: Arc<Module>) {
		self.module_names.insert(Arc::clone(module.name_arc()));
		for pkg in module.package_set() {
			self.module_packages.insert(Arc::clone(pkg));
			self.package_to_module.insert(Arc::clone(pkg), Arc::clone(&module));
		}
		for (service, providers) in module.service_map() {
			let merged = match self.service_providers.get(service) {
				Some(existing) => existing.union(providers),
				None => Providers(Arc::new(providers.clone())),
			};
			self.service_providers.insert(Arc::clone(service), merged);
		}
	}

	#[cfg(any(debug_assertions, feature = "registry-contracts"))]
	fn check_contracts(&self, scope: &'static str) {
		assert_eq!(
			self.module_packages.len(),
			self.package_to_module.len(),
			"[{scope}] package set and package index diverged"
		);
		for (pkg, module) in &self.package_to_module {
			assert!(self.module_packages.contains(pkg), "[{scope}] package {pkg} indexed but not recorded");
			assert!(module.owns_package(pkg), "[{scope}] package {pkg} indexed to non-owner {}", module.name());
			assert!(self.module_names.contains(module.name()), "[{scope}] indexed module {} not recorded", module.name());
		}
	}
}

/// Module and service registry for one loader scope.
///
/// Thread-safe; share it by reference or via `Arc<ModuleRegistry>`.
pub struct ModuleRegistry {
	label: &'static str,
	state: RwLock<RegistryState>,
}

impl ModuleRegistry {
	/// Creates an empty registry for the scope named `label`.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			state: RwLock::new(RegistryState::default()),
		}
	}

	/// The registry of the built-in loader scope. See [`system_registry`].
	pub fn system() -> &'static ModuleRegistry {
		system_registry()
	}

	/// Scope label used in diagnostics.
	#[inline]
	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Registers `module`, indexing its packages and merging its services.
	///
	/// # Errors
	///
	/// - [`RegistrationError::UnnamedModule`] for the unnamed sentinel.
	/// - [`RegistrationError::DuplicateModule`] if the name is taken in this scope.
	/// - [`RegistrationError::InvalidPackage`] if a package name is empty.
	/// - [`RegistrationError::DuplicatePackage`] if a package is already owned.
	///
	/// On error nothing is registered, including the module's valid packages.
	pub fn register(&self, module: impl Into<Arc<Module>>) -> Result<(), RegistrationError> {
		let module = module.into();
		let result = self.register_locked(&module);
		match &result {
			Ok(()) => debug!(
				scope = self.label,
				module = module.name(),
				packages = module.packages().len(),
				services = module.service_map().len(),
				"Module registered"
			),
			Err(e) => warn!(scope = self.label, module = module.name(), error = %e, "Module registration rejected"),
		}
		result
	}

	fn register_locked(&self, module: &Arc<Module>) -> Result<(), RegistrationError> {
		let mut state = self.state.write();
		state.validate(self.label, module)?;
		state.apply(Arc::clone(module));
		#[cfg(any(debug_assertions, feature = "registry-contracts"))]
		state.check_contracts(self.label);
		Ok(())
	}

	/// Returns the module owning `pkg`, if any.
	pub fn lookup_module(&self, pkg: &str) -> Option<Arc<Module>> {
		self.state.read().package_to_module.get(pkg).cloned()
	}

	/// Returns every provider registered for `service`; empty if none.
	pub fn find_services(&self, service: &str) -> Providers {
		self.state.read().service_providers.get(service).cloned().unwrap_or_default()
	}

	pub fn contains_module(&self, name: &str) -> bool {
		self.state.read().module_names.contains(name)
	}

	pub fn module_count(&self) -> usize {
		self.state.read().module_names.len()
	}

	pub fn package_count(&self) -> usize {
		self.state.read().module_packages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.module_count() == 0
	}
}

impl fmt::Debug for ModuleRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.read();
		f.debug_struct("ModuleRegistry")
			.field("label", &self.label)
			.field("modules", &state.module_names.len())
			.field("packages", &state.module_packages.len())
			.field("services", &state.service_providers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests;
