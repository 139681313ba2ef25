//! Extension descriptors and per-kind extension tables.
//!
//! Extensions are partitioned by kind into two insertion-ordered maps. The
//! position of an extension within its map is its field index in the
//! generated extension table, so declaration order is preserved, never sorted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use epgen_registry_spec::{ExtensionType, ProfileExtensionSpec, RegistrySpec};

use crate::error::GenError;
use crate::predicate::{Conditions, Predicate};

pub type ExtensionKind = ExtensionType;

/// Position of an extension within its kind's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionId {
	pub kind: ExtensionKind,
	pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
	pub name: String,
	pub revision: u32,
	pub kind: ExtensionKind,
	pub enable: Predicate,
}

impl Extension {
	/// Field name in the generated extension table (`VK_KHR_foo` -> `KHR_foo`).
	pub fn field_name(&self) -> &str {
		self.name.strip_prefix("VK_").unwrap_or(&self.name)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTable {
	instance: IndexMap<String, Extension>,
	device: IndexMap<String, Extension>,
}

impl ExtensionTable {
	/// Builds the table from a driver's extension list, taking each kind from the registry.
	pub fn from_profile(exts: &[ProfileExtensionSpec], registry: &RegistrySpec) -> Result<Self, GenError> {
		let mut table = Self::default();
		for spec in exts {
			let kind = registry
				.extension(&spec.name)
				.map(|e| e.ty)
				.ok_or_else(|| GenError::UnknownExtensionKind(spec.name.clone()))?;
			let enable = Predicate::from_spec(&spec.enable).map_err(|source| GenError::Predicate {
				owner: spec.name.clone(),
				source,
			})?;
			table.insert(Extension {
				name: spec.name.clone(),
				revision: spec.revision,
				kind,
				enable,
			})?;
		}
		Ok(table)
	}

	/// Appends an extension; names are unique across both kinds.
	pub fn insert(&mut self, ext: Extension) -> Result<ExtensionId, GenError> {
		if self.get(&ext.name).is_some() {
			return Err(GenError::DuplicateExtension(ext.name));
		}
		let kind = ext.kind;
		let map = self.map_mut(kind);
		let index = u16::try_from(map.len()).map_err(|_| GenError::TooManyExtensions)?;
		map.insert(ext.name.clone(), ext);
		Ok(ExtensionId { kind, index })
	}

	pub fn get(&self, name: &str) -> Option<(ExtensionId, &Extension)> {
		[ExtensionKind::Instance, ExtensionKind::Device]
			.into_iter()
			.find_map(|kind| {
				let (index, _, ext) = self.map(kind).get_full(name)?;
				Some((ExtensionId { kind, index: index as u16 }, ext))
			})
	}

	pub fn by_id(&self, id: ExtensionId) -> Option<&Extension> {
		self.map(id.kind).get_index(id.index as usize).map(|(_, e)| e)
	}

	/// Extensions of one kind in table order.
	pub fn iter(&self, kind: ExtensionKind) -> impl Iterator<Item = &Extension> + '_ {
		self.map(kind).values()
	}

	pub fn len(&self, kind: ExtensionKind) -> usize {
		self.map(kind).len()
	}

	pub fn is_empty(&self) -> bool {
		self.instance.is_empty() && self.device.is_empty()
	}

	/// Evaluates every predicate of one kind.
	pub fn supported(&self, kind: ExtensionKind, env: &dyn Conditions) -> ExtensionSet {
		ExtensionSet {
			kind,
			enabled: self.map(kind).values().map(|e| e.enable.eval(env)).collect(),
		}
	}

	/// Builds a set of one kind from extension names.
	pub fn set_from_names<'a>(
		&self,
		kind: ExtensionKind,
		names: impl IntoIterator<Item = &'a str>,
	) -> Result<ExtensionSet, GenError> {
		let mut set = ExtensionSet::empty(kind, self.len(kind));
		for name in names {
			match self.get(name) {
				Some((id, _)) if id.kind == kind => set.insert(id),
				_ => return Err(GenError::UnknownExtension(name.to_string())),
			}
		}
		Ok(set)
	}

	fn map(&self, kind: ExtensionKind) -> &IndexMap<String, Extension> {
		match kind {
			ExtensionKind::Instance => &self.instance,
			ExtensionKind::Device => &self.device,
		}
	}

	fn map_mut(&mut self, kind: ExtensionKind) -> &mut IndexMap<String, Extension> {
		match kind {
			ExtensionKind::Instance => &mut self.instance,
			ExtensionKind::Device => &mut self.device,
		}
	}
}

/// Enabled flags for one kind's extension table, one per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSet {
	kind: ExtensionKind,
	enabled: Vec<bool>,
}

impl ExtensionSet {
	pub fn empty(kind: ExtensionKind, len: usize) -> Self {
		Self {
			kind,
			enabled: vec![false; len],
		}
	}

	pub fn kind(&self) -> ExtensionKind {
		self.kind
	}

	pub fn contains(&self, id: ExtensionId) -> bool {
		id.kind == self.kind && self.enabled.get(id.index as usize).copied().unwrap_or(false)
	}

	pub fn insert(&mut self, id: ExtensionId) {
		if id.kind == self.kind
			&& let Some(slot) = self.enabled.get_mut(id.index as usize)
		{
			*slot = true;
		}
	}

	pub fn remove(&mut self, id: ExtensionId) {
		if id.kind == self.kind
			&& let Some(slot) = self.enabled.get_mut(id.index as usize)
		{
			*slot = false;
		}
	}

	/// Number of enabled extensions.
	pub fn count(&self) -> usize {
		self.enabled.iter().filter(|b| **b).count()
	}

	pub fn as_slice(&self) -> &[bool] {
		&self.enabled
	}
}

#[cfg(test)]
mod tests {
	use epgen_registry_spec::ExtensionSpec;

	use super::*;
	use crate::predicate::ConditionSet;

	fn registry() -> RegistrySpec {
		RegistrySpec {
			extensions: vec![
				ExtensionSpec::new("VK_KHR_surface", ExtensionType::Instance, &[]),
				ExtensionSpec::new("VK_KHR_swapchain", ExtensionType::Device, &[]),
				ExtensionSpec::new("VK_KHR_maintenance1", ExtensionType::Device, &[]),
			],
			..RegistrySpec::default()
		}
	}

	fn table() -> ExtensionTable {
		ExtensionTable::from_profile(
			&[
				ProfileExtensionSpec::new("VK_KHR_swapchain", 68, "HAS_SURFACE"),
				ProfileExtensionSpec::new("VK_KHR_surface", 25, "HAS_SURFACE"),
				ProfileExtensionSpec::new("VK_KHR_maintenance1", 1, true),
			],
			&registry(),
		)
		.unwrap()
	}

	#[test]
	fn partitions_by_kind_in_declaration_order() {
		let t = table();
		let device: Vec<_> = t.iter(ExtensionKind::Device).map(|e| e.name.as_str()).collect();
		assert_eq!(device, ["VK_KHR_swapchain", "VK_KHR_maintenance1"]);
		let (id, ext) = t.get("VK_KHR_surface").unwrap();
		assert_eq!(id, ExtensionId { kind: ExtensionKind::Instance, index: 0 });
		assert_eq!(ext.field_name(), "KHR_surface");
		assert_eq!(ext.revision, 25);
	}

	#[test]
	fn unknown_kind_is_fatal() {
		let err = ExtensionTable::from_profile(&[ProfileExtensionSpec::new("VK_FOO_bar", 1, true)], &registry()).unwrap_err();
		assert!(matches!(err, GenError::UnknownExtensionKind(name) if name == "VK_FOO_bar"));
	}

	#[test]
	fn duplicate_name_is_fatal() {
		let err = ExtensionTable::from_profile(
			&[
				ProfileExtensionSpec::new("VK_KHR_surface", 25, true),
				ProfileExtensionSpec::new("VK_KHR_surface", 25, true),
			],
			&registry(),
		)
		.unwrap_err();
		assert!(matches!(err, GenError::DuplicateExtension(_)));
	}

	#[test]
	fn supported_evaluates_predicates() {
		let t = table();
		let none = t.supported(ExtensionKind::Device, &ConditionSet::new());
		assert_eq!(none.as_slice(), &[false, true]);
		let surface: ConditionSet = ["HAS_SURFACE"].into_iter().collect();
		let all = t.supported(ExtensionKind::Device, &surface);
		assert_eq!(all.count(), 2);
	}

	#[test]
	fn sets_from_names_check_kind() {
		let t = table();
		let set = t.set_from_names(ExtensionKind::Device, ["VK_KHR_maintenance1"]).unwrap();
		let (id, _) = t.get("VK_KHR_maintenance1").unwrap();
		assert!(set.contains(id));
		assert!(t.set_from_names(ExtensionKind::Device, ["VK_KHR_surface"]).is_err());
	}
}
