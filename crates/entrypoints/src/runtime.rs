//! Atomic publication of generated tables.
//!
//! Readers take a snapshot and probe it for as long as they like; a rebuild
//! produces a whole new [`EntrypointTables`] and swaps the pointer. A table is
//! never modified while published.

use std::sync::Arc;

use arc_swap::ArcSwap;

use epgen_registry_spec::{ProfileSpec, RegistrySpec};

use crate::error::GenError;
use crate::intern::EntrypointId;
use crate::tables::EntrypointTables;

pub struct SharedTables {
	current: ArcSwap<EntrypointTables>,
}

impl SharedTables {
	pub fn new(tables: EntrypointTables) -> Self {
		Self {
			current: ArcSwap::from_pointee(tables),
		}
	}

	/// Snapshot that stays valid across later swaps.
	#[inline]
	pub fn load(&self) -> Arc<EntrypointTables> {
		self.current.load_full()
	}

	#[inline]
	pub fn lookup(&self, name: &str) -> Option<EntrypointId> {
		self.current.load().lookup(name)
	}

	/// Publishes `tables`, returning the ones it replaced.
	pub fn replace(&self, tables: EntrypointTables) -> Arc<EntrypointTables> {
		self.current.swap(Arc::new(tables))
	}

	/// Regenerates from new inputs and publishes the result.
	///
	/// On error nothing is published and the current tables stay live.
	pub fn rebuild(&self, registry: &RegistrySpec, profile: &ProfileSpec) -> Result<Arc<EntrypointTables>, GenError> {
		let tables = EntrypointTables::generate(registry, profile).inspect_err(|err| {
			tracing::warn!(error = %err, "rebuild failed; keeping current tables");
		})?;
		Ok(self.replace(tables))
	}
}

impl std::fmt::Debug for SharedTables {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let tables = self.current.load();
		f.debug_struct("SharedTables")
			.field("prefix", &tables.name_prefix())
			.field("entrypoints", &tables.len())
			.finish()
	}
}
