//! Driver profile: supported API versions, extensions and layers.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use epgen_registry_spec::{ApiVersionSpec, CommandSpec, ProfileSpec, RegistrySpec};

use crate::error::GenError;
use crate::extension::ExtensionTable;
use crate::predicate::{Conditions, Predicate};
use crate::version::ApiVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionGate {
	pub version: ApiVersion,
	pub enable: Predicate,
}

/// Declared API versions in strictly increasing order.
///
/// A version is available when its own predicate holds and every earlier
/// version's predicate holds as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersions {
	gates: Vec<VersionGate>,
}

impl ApiVersions {
	/// Parses and validates the version list, stamping `patch` onto every entry.
	pub fn new(specs: &[ApiVersionSpec], patch: Option<u16>) -> Result<Self, GenError> {
		let mut gates: Vec<VersionGate> = Vec::with_capacity(specs.len());
		for spec in specs {
			let owner = format!("api version {:?}", spec.version);
			let mut version: ApiVersion = spec.version.parse().map_err(|source| GenError::Version {
				owner: owner.clone(),
				source,
			})?;
			if let Some(patch) = patch {
				version = version.with_patch(patch);
			}
			if let Some(prev) = gates.last()
				&& version.compare_minor(&prev.version) != Ordering::Greater
			{
				return Err(GenError::VersionNotIncreasing {
					previous: prev.version,
					version,
				});
			}
			let enable = Predicate::from_spec(&spec.enable).map_err(|source| GenError::Predicate { owner, source })?;
			gates.push(VersionGate { version, enable });
		}
		if gates.is_empty() {
			return Err(GenError::NoApiVersions);
		}
		Ok(Self { gates })
	}

	/// Highest declared version; what `vkEnumerateInstanceVersion` reports.
	pub fn max(&self) -> ApiVersion {
		self.gates.last().map(|g| g.version).unwrap_or(ApiVersion::NONE)
	}

	pub fn iter(&self) -> impl Iterator<Item = &VersionGate> + '_ {
		self.gates.iter()
	}

	/// Highest version whose predicate chain holds.
	///
	/// An override, if given, replaces the cascade and is clamped to [`ApiVersions::max`].
	pub fn physical_device_api_version(&self, env: &dyn Conditions, override_version: Option<ApiVersion>) -> ApiVersion {
		if let Some(v) = override_version {
			return v.min(self.max());
		}
		let mut version = ApiVersion::NONE;
		for gate in &self.gates {
			if !gate.enable.eval(env) {
				return version;
			}
			version = gate.version;
		}
		version
	}

	/// Core version in effect for a device: the lower of what was requested and what is available.
	pub fn negotiate(&self, requested: ApiVersion, env: &dyn Conditions) -> ApiVersion {
		requested.min(self.physical_device_api_version(env, None))
	}
}

/// Validated form of a [`ProfileSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
	pub name_prefix: String,
	pub layers: Vec<String>,
	pub api_versions: ApiVersions,
	pub extensions: ExtensionTable,
	pub extra_entrypoints: Vec<CommandSpec>,
}

impl DriverProfile {
	pub fn from_spec(spec: &ProfileSpec, registry: &RegistrySpec) -> Result<Self, GenError> {
		Ok(Self {
			name_prefix: spec.name_prefix.clone(),
			layers: spec.layer_names(),
			api_versions: ApiVersions::new(&spec.api_versions, spec.api_patch_version)?,
			extensions: ExtensionTable::from_profile(&spec.extensions, registry)?,
			extra_entrypoints: spec.extra_entrypoints.clone(),
		})
	}

	pub fn max_api_version(&self) -> ApiVersion {
		self.api_versions.max()
	}
}
