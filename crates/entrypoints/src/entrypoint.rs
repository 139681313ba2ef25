//! Entry-point declarations and their enablement stamps.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use epgen_registry_spec::{CommandSpec, ParamSpec};

use crate::error::GenError;
use crate::extension::ExtensionId;
use crate::version::ApiVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
	pub ty: String,
	pub name: String,
	pub decl: String,
}

impl From<&ParamSpec> for Param {
	fn from(p: &ParamSpec) -> Self {
		Self {
			ty: p.ty.clone(),
			name: p.name.clone(),
			decl: p.decl_text(),
		}
	}
}

/// Handle categories owned by a logical device.
///
/// An entry point whose first parameter is one of these is a device entry
/// point and gets a trampoline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
	Device,
	CommandBuffer,
	Queue,
}

impl HandleKind {
	pub fn from_type_name(ty: &str) -> Option<Self> {
		match ty {
			"VkDevice" => Some(Self::Device),
			"VkCommandBuffer" => Some(Self::CommandBuffer),
			"VkQueue" => Some(Self::Queue),
			_ => None,
		}
	}

	pub fn type_name(self) -> &'static str {
		match self {
			Self::Device => "VkDevice",
			Self::CommandBuffer => "VkCommandBuffer",
			Self::Queue => "VkQueue",
		}
	}
}

/// Where an entry point gets its availability from.
///
/// At most one of `core_version` and `extensions` is ever populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enablement {
	pub core_version: Option<ApiVersion>,
	pub extensions: SmallVec<[ExtensionId; 2]>,
}

impl Enablement {
	pub fn is_reachable(&self) -> bool {
		self.core_version.is_some() || !self.extensions.is_empty()
	}

	pub(crate) fn stamp_core(&mut self, name: &str, version: ApiVersion) -> Result<(), GenError> {
		if let Some(existing) = self.core_version {
			return Err(GenError::CoreVersionTwice {
				name: name.to_string(),
				first: existing,
				second: version,
			});
		}
		if !self.extensions.is_empty() {
			return Err(GenError::CoreAndExtension(name.to_string()));
		}
		self.core_version = Some(version);
		Ok(())
	}

	pub(crate) fn stamp_extension(&mut self, name: &str, ext: ExtensionId) -> Result<(), GenError> {
		if self.core_version.is_some() {
			return Err(GenError::CoreAndExtension(name.to_string()));
		}
		if !self.extensions.contains(&ext) {
			self.extensions.push(ext);
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
	pub name: String,
	pub return_type: String,
	pub params: Vec<Param>,
	pub guard: Option<String>,
	pub enablement: Enablement,
}

impl EntryPoint {
	pub fn from_spec(spec: &CommandSpec) -> Self {
		Self {
			name: spec.name.clone(),
			return_type: spec.return_type.clone(),
			params: spec.params.iter().map(Param::from).collect(),
			guard: spec.guard.clone(),
			enablement: Enablement::default(),
		}
	}

	/// Handle category of the first parameter, if it is device-owned.
	pub fn owner_handle(&self) -> Option<HandleKind> {
		self.params.first().and_then(|p| HandleKind::from_type_name(&p.ty))
	}

	pub fn is_device_entrypoint(&self) -> bool {
		self.owner_handle().is_some()
	}

	/// `vkCreateDevice` with prefix `radv` becomes `radv_CreateDevice`.
	pub fn prefixed_name(&self, prefix: &str) -> Result<String, GenError> {
		let stem = self
			.name
			.strip_prefix("vk")
			.ok_or_else(|| GenError::MissingVkPrefix(self.name.clone()))?;
		Ok(format!("{prefix}_{stem}"))
	}

	pub fn decl_params(&self) -> String {
		self.params.iter().map(|p| p.decl.as_str()).collect::<Vec<_>>().join(", ")
	}

	pub fn call_params(&self) -> String {
		self.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
	}
}

/// Index of a declaration in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

/// A second name for an entry point. Property lookups go to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointAlias {
	pub name: String,
	/// Canonical (non-alias) declaration this name resolves to.
	pub target: DeclId,
	pub enablement: Enablement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
	Entry(EntryPoint),
	Alias(EntryPointAlias),
}

impl Declaration {
	pub fn name(&self) -> &str {
		match self {
			Self::Entry(e) => &e.name,
			Self::Alias(a) => &a.name,
		}
	}

	pub fn enablement(&self) -> &Enablement {
		match self {
			Self::Entry(e) => &e.enablement,
			Self::Alias(a) => &a.enablement,
		}
	}

	pub(crate) fn enablement_mut(&mut self) -> &mut Enablement {
		match self {
			Self::Entry(e) => &mut e.enablement,
			Self::Alias(a) => &mut a.enablement,
		}
	}

	pub fn as_entry(&self) -> Option<&EntryPoint> {
		match self {
			Self::Entry(e) => Some(e),
			Self::Alias(_) => None,
		}
	}
}
