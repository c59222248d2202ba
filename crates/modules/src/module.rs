//! Module definitions: a named component, the packages it owns and the
//! service providers it contributes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap as HashMap;

/// Provider descriptors contributed for one service name.
pub type ProviderNames = BTreeSet<Arc<str>>;

static UNNAMED: LazyLock<Arc<Module>> = LazyLock::new(|| {
	Arc::new(Module {
		name: Arc::from(""),
		packages: BTreeSet::new(),
		services: HashMap::default(),
	})
});

/// A named component together with its packages and service offerings.
///
/// Modules are immutable once built. Registries and the engine share them
/// through `Arc<Module>`.
#[derive(Clone, PartialEq, Eq)]
pub struct Module {
	name: Arc<str>,
	packages: BTreeSet<Arc<str>>,
	services: HashMap<Arc<str>, ProviderNames>,
}

impl Module {
	/// Starts building a module with the given name.
	pub fn builder(name: impl Into<Arc<str>>) -> ModuleBuilder {
		ModuleBuilder {
			module: Module {
				name: name.into(),
				packages: BTreeSet::new(),
				services: HashMap::default(),
			},
		}
	}

	/// Returns the process-wide unnamed module sentinel.
	///
	/// The sentinel owns no packages and offers no services. It is never
	/// accepted by [`ModuleRegistry::register`](crate::ModuleRegistry::register).
	pub fn unnamed() -> Arc<Module> {
		Arc::clone(&UNNAMED)
	}

	/// Module name; empty only for the unnamed sentinel.
	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[inline]
	pub fn is_named(&self) -> bool {
		!self.name.is_empty()
	}

	/// Packages owned by this module, in sorted order.
	pub fn packages(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
		self.packages.iter().map(|p| &**p)
	}

	pub fn owns_package(&self, pkg: &str) -> bool {
		self.packages.contains(pkg)
	}

	/// Service names and the providers this module contributes to each.
	pub fn services(&self) -> impl Iterator<Item = (&str, &ProviderNames)> + '_ {
		self.services.iter().map(|(s, p)| (&**s, p))
	}

	/// Providers this module contributes for `service`.
	pub fn providers_of(&self, service: &str) -> Option<&ProviderNames> {
		self.services.get(service)
	}

	pub(crate) fn name_arc(&self) -> &Arc<str> {
		&self.name
	}

	pub(crate) fn package_set(&self) -> &BTreeSet<Arc<str>> {
		&self.packages
	}

	pub(crate) fn service_map(&self) -> &HashMap<Arc<str>, ProviderNames> {
		&self.services
	}
}

impl fmt::Debug for Module {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut services: Vec<_> = self.services.iter().collect();
		services.sort_by(|a, b| a.0.cmp(b.0));
		f.debug_struct("Module")
			.field("name", &self.name)
			.field("packages", &self.packages)
			.field("services", &services)
			.finish()
	}
}

impl fmt::Display for Module {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_named() {
			write!(f, "module {}", self.name)
		} else {
			f.write_str("unnamed module")
		}
	}
}

/// Incremental constructor for [`Module`].
#[derive(Debug)]
pub struct ModuleBuilder {
	module: Module,
}

impl ModuleBuilder {
	/// Adds an owned package. Adding the same package twice is a no-op.
	pub fn package(mut self, pkg: impl Into<Arc<str>>) -> Self {
		self.module.packages.insert(pkg.into());
		self
	}

	pub fn packages<I, P>(mut self, pkgs: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<Arc<str>>,
	{
		self.module.packages.extend(pkgs.into_iter().map(Into::into));
		self
	}

	/// Declares `provider` as an implementation of `service`.
	pub fn provides(mut self, service: impl Into<Arc<str>>, provider: impl Into<Arc<str>>) -> Self {
		self.module.services.entry(service.into()).or_default().insert(provider.into());
		self
	}

	/// Declares a service with no providers yet, so the registry creates its entry.
	pub fn uses_service(mut self, service: impl Into<Arc<str>>) -> Self {
		self.module.services.entry(service.into()).or_default();
		self
	}

	pub fn build(self) -> Module {
		self.module
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_collects_packages_and_services() {
		let m = Module::builder("net")
			.package("net.http")
			.packages(["net.tcp", "net.http"])
			.provides("codec", "net.http.Gzip")
			.provides("codec", "net.http.Brotli")
			.build();

		assert_eq!(m.name(), "net");
		assert!(m.is_named());
		assert_eq!(m.packages().collect::<Vec<_>>(), vec!["net.http", "net.tcp"]);
		let codecs = m.providers_of("codec").expect("codec declared");
		assert_eq!(codecs.len(), 2);
		assert!(m.providers_of("missing").is_none());
	}

	#[test]
	fn test_unnamed_sentinel_is_shared_and_empty() {
		let a = Module::unnamed();
		let b = Module::unnamed();
		assert!(Arc::ptr_eq(&a, &b));
		assert!(!a.is_named());
		assert_eq!(a.packages().len(), 0);
		assert_eq!(a.services().count(), 0);
		assert_eq!(a.to_string(), "unnamed module");
	}
}
