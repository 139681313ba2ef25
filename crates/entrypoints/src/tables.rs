//! The generated table bundle.

use serde::{Deserialize, Serialize};

use epgen_registry_spec::{ProfileSpec, RegistrySpec};

use crate::dispatch::{Layer, SymbolTable, TrampolineLayer, Trampolines, synthesize};
use crate::error::GenError;
use crate::extension::{ExtensionSet, ExtensionTable};
use crate::intern::{EntrypointId, TableEntry, intern};
use crate::profile::{ApiVersions, DriverProfile};
use crate::resolve::resolve;
use crate::strmap::StringMap;
use crate::version::ApiVersion;

/// Everything a driver needs at call time, built in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointTables {
	name_prefix: String,
	entries: Vec<TableEntry>,
	strings: StringMap,
	layers: Vec<SymbolTable>,
	trampolines: SymbolTable,
	extensions: ExtensionTable,
	api_versions: ApiVersions,
}

impl EntrypointTables {
	/// Validates `profile` against `registry` and builds every table.
	pub fn generate(registry: &RegistrySpec, profile: &ProfileSpec) -> Result<Self, GenError> {
		let driver = DriverProfile::from_spec(profile, registry)?;
		Self::from_driver(registry, driver)
	}

	pub fn from_driver(registry: &RegistrySpec, driver: DriverProfile) -> Result<Self, GenError> {
		let resolved = resolve(registry, driver.max_api_version(), &driver.extensions)?;
		let interned = intern(&resolved, &driver.extra_entrypoints)?;

		let layers = driver
			.layers
			.iter()
			.map(|prefix| synthesize(&Layer::new(prefix.as_str()), &interned.entries))
			.collect::<Result<Vec<_>, _>>()?;
		let trampolines = synthesize(&TrampolineLayer::new(driver.name_prefix.as_str()), &interned.entries)?;

		let tables = Self {
			name_prefix: driver.name_prefix,
			entries: interned.entries,
			strings: interned.strings,
			layers,
			trampolines,
			extensions: driver.extensions,
			api_versions: driver.api_versions,
		};
		tracing::info!(
			prefix = %tables.name_prefix,
			entrypoints = tables.entries.len(),
			names = tables.strings.len(),
			hash_size = tables.strings.hash_size(),
			layers = tables.layers.len(),
			max_api_version = %tables.max_api_version(),
			"generated entry point tables"
		);
		Ok(tables)
	}

	pub fn name_prefix(&self) -> &str {
		&self.name_prefix
	}

	/// Id of `name`, which may be an alias.
	pub fn lookup(&self, name: &str) -> Option<EntrypointId> {
		self.strings.lookup(name).map(EntrypointId)
	}

	pub fn entry(&self, id: EntrypointId) -> Option<&TableEntry> {
		self.entries.get(id.index())
	}

	/// Entries in id order.
	pub fn entries(&self) -> &[TableEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Whether `id` is callable; unknown ids are not.
	pub fn is_enabled(
		&self,
		id: EntrypointId,
		core_version: ApiVersion,
		instance: &ExtensionSet,
		device: Option<&ExtensionSet>,
	) -> bool {
		self.entry(id)
			.is_some_and(|e| e.is_enabled(core_version, instance, device))
	}

	/// [`EntrypointTables::lookup`] that only answers for enabled entry points.
	pub fn lookup_checked(
		&self,
		name: &str,
		core_version: ApiVersion,
		instance: &ExtensionSet,
		device: Option<&ExtensionSet>,
	) -> Option<EntrypointId> {
		self.lookup(name)
			.filter(|id| self.is_enabled(*id, core_version, instance, device))
	}

	pub fn strings(&self) -> &StringMap {
		&self.strings
	}

	pub fn layers(&self) -> &[SymbolTable] {
		&self.layers
	}

	pub fn layer(&self, prefix: &str) -> Option<&SymbolTable> {
		let name = format!("{prefix}_dispatch_table");
		self.layers.iter().find(|l| l.name() == name)
	}

	pub fn trampolines(&self) -> &SymbolTable {
		&self.trampolines
	}

	pub fn trampoline_routes(&self) -> Trampolines {
		Trampolines::from_table(&self.trampolines)
	}

	pub fn extensions(&self) -> &ExtensionTable {
		&self.extensions
	}

	pub fn api_versions(&self) -> &ApiVersions {
		&self.api_versions
	}

	/// What `vkEnumerateInstanceVersion` reports.
	pub fn max_api_version(&self) -> ApiVersion {
		self.api_versions.max()
	}
}
