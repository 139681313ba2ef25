//! Declaration types consumed by the entry-point table generator.
//!
//! Two documents drive a generation run:
//!
//! - [`RegistrySpec`]: the API registry (commands, core features, extensions).
//! - [`ProfileSpec`]: a driver's profile (supported versions and extensions,
//!   each with an enable predicate, plus the layers to emit tables for).
//!
//! Both are plain serde structs. Nothing here validates cross references; that
//! is the generator's job, and it fails fast on the first inconsistency.

pub mod commands;
pub mod extensions;
pub mod features;
pub mod load;
pub mod profile;

pub use commands::{CommandSpec, ParamSpec};
pub use extensions::{ExtensionSpec, ExtensionType};
pub use features::FeatureSpec;
pub use load::{SpecError, load_profile, load_registry};
pub use profile::{ApiVersionSpec, EnableSpec, ProfileExtensionSpec, ProfileSpec};

use serde::{Deserialize, Serialize};

/// In-memory form of the API registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySpec {
	#[serde(default)]
	pub commands: Vec<CommandSpec>,
	#[serde(default)]
	pub features: Vec<FeatureSpec>,
	#[serde(default)]
	pub extensions: Vec<ExtensionSpec>,
}

impl RegistrySpec {
	/// Appends the declarations of another registry document.
	///
	/// Generation over several documents behaves as if they were one document
	/// declared in the order given.
	pub fn merge(&mut self, other: RegistrySpec) {
		self.commands.extend(other.commands);
		self.features.extend(other.features);
		self.extensions.extend(other.extensions);
	}

	/// Finds the registry declaration of an extension by name.
	pub fn extension(&self, name: &str) -> Option<&ExtensionSpec> {
		self.extensions.iter().find(|e| e.name == name)
	}
}
