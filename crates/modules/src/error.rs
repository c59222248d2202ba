/// Registration failures. A failed registration leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
	/// A module with the same name is already registered in this scope.
	#[error("module {name} already registered in scope {scope}")]
	DuplicateModule { scope: &'static str, name: String },

	/// The module lists the empty (unnamed) package.
	#[error("module {module} cannot include the unnamed package")]
	InvalidPackage { module: String },

	/// A package is already owned by a previously registered module.
	#[error("package {package} of module {module} already defined by module {owner}")]
	DuplicatePackage {
		package: String,
		module: String,
		owner: String,
	},

	/// The unnamed module sentinel is never registered.
	#[error("the unnamed module cannot be registered")]
	UnnamedModule,
}
