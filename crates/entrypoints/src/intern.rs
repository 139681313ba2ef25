//! Id assignment and name interning for reachable entry points.

use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

use epgen_registry_spec::CommandSpec;

use crate::entrypoint::{DeclId, Declaration, Enablement, EntryPoint, HandleKind};
use crate::error::GenError;
use crate::extension::{ExtensionKind, ExtensionSet};
use crate::resolve::ResolvedRegistry;
use crate::strmap::{StringMap, StringMapBuilder, StringMapError};
use crate::version::ApiVersion;

/// Dense id of a generated table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntrypointId(pub u32);

impl EntrypointId {
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// One slot of the generated tables.
///
/// `target` is the canonical entry point supplying the signature, guard and
/// implementation symbol. It differs from `name` only for an alias whose target
/// is unreachable; such an alias keeps its own slot and its own enablement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
	pub name: String,
	pub target: EntryPoint,
	pub enablement: Enablement,
	/// Alias names that resolve to this slot.
	pub aliases: Vec<String>,
}

impl TableEntry {
	pub fn is_device_entrypoint(&self) -> bool {
		self.target.is_device_entrypoint()
	}

	pub fn owner_handle(&self) -> Option<HandleKind> {
		self.target.owner_handle()
	}

	pub fn guard(&self) -> Option<&str> {
		self.target.guard.as_deref()
	}

	pub fn implementation_symbol(&self, prefix: &str) -> Result<String, GenError> {
		self.target.prefixed_name(prefix)
	}

	/// Whether the entry point is callable under the given negotiated state.
	///
	/// `device` is `None` for capability queries made before a device exists;
	/// in that mode every device extension counts as enabled and instance-level
	/// core entry points are available.
	pub fn is_enabled(&self, core_version: ApiVersion, instance: &ExtensionSet, device: Option<&ExtensionSet>) -> bool {
		if let Some(version) = self.enablement.core_version {
			let in_core = version.encode() <= core_version.encode();
			return if self.is_device_entrypoint() {
				in_core
			} else {
				device.is_none() && in_core
			};
		}
		if self.enablement.extensions.is_empty() {
			return true;
		}
		self.enablement.extensions.iter().any(|ext| match ext.kind {
			ExtensionKind::Instance => device.is_none() && instance.contains(*ext),
			ExtensionKind::Device => device.is_none_or(|set| set.contains(*ext)),
		})
	}
}

/// Reachable entry points by id, plus the name map covering every alias.
#[derive(Debug, Clone)]
pub struct Interned {
	pub entries: Vec<TableEntry>,
	pub strings: StringMap,
}

fn next_id(entries: &[TableEntry]) -> u32 {
	entries.len() as u32
}

fn add_name(builder: &mut StringMapBuilder, name: &str, id: u32) -> Result<(), GenError> {
	builder.add(name, id).map_err(|e| match e {
		StringMapError::Duplicate(name) => GenError::DuplicateEntryPoint(name),
		other => GenError::StringMap(other),
	})
}

/// Numbers reachable entry points in registry order and appends `extra`
/// declarations, which are always enabled.
pub fn intern(resolved: &ResolvedRegistry, extra: &[CommandSpec]) -> Result<Interned, GenError> {
	let mut ids: HashMap<DeclId, u32> = HashMap::default();
	let mut entries: Vec<TableEntry> = Vec::new();
	let mut builder = StringMapBuilder::new();

	for (decl_id, decl) in resolved.decls() {
		if !decl.enablement().is_reachable() {
			continue;
		}
		match decl {
			Declaration::Entry(ep) => {
				let id = next_id(&entries);
				add_name(&mut builder, &ep.name, id)?;
				ids.insert(decl_id, id);
				entries.push(TableEntry {
					name: ep.name.clone(),
					target: ep.clone(),
					enablement: ep.enablement.clone(),
					aliases: Vec::new(),
				});
			}
			Declaration::Alias(alias) => {
				if let Some(&id) = ids.get(&alias.target) {
					add_name(&mut builder, &alias.name, id)?;
					entries[id as usize].aliases.push(alias.name.clone());
					continue;
				}
				let Some(target) = resolved.entry(alias.target) else {
					continue;
				};
				let id = next_id(&entries);
				add_name(&mut builder, &alias.name, id)?;
				entries.push(TableEntry {
					name: alias.name.clone(),
					target: target.clone(),
					enablement: alias.enablement.clone(),
					aliases: Vec::new(),
				});
			}
		}
	}

	for spec in extra {
		let ep = EntryPoint::from_spec(spec);
		let id = next_id(&entries);
		add_name(&mut builder, &ep.name, id)?;
		entries.push(TableEntry {
			name: ep.name.clone(),
			target: ep,
			enablement: Enablement::default(),
			aliases: Vec::new(),
		});
	}

	let names = builder.len();
	let strings = builder.bake()?;
	tracing::debug!(ids = entries.len(), names, "interned entry points");

	Ok(Interned { entries, strings })
}
