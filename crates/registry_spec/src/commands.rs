use serde::{Deserialize, Serialize};

/// A single command declaration.
///
/// A declaration with `alias` set names another command and carries no
/// signature of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alias: Option<String>,
	#[serde(default)]
	pub return_type: String,
	#[serde(default)]
	pub params: Vec<ParamSpec>,
	/// Conditional-compilation symbol gating the implementation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guard: Option<String>,
}

impl CommandSpec {
	/// Creates a full (non-alias) declaration.
	pub fn new(name: impl Into<String>, return_type: impl Into<String>, params: Vec<ParamSpec>) -> Self {
		Self {
			name: name.into(),
			alias: None,
			return_type: return_type.into(),
			params,
			guard: None,
		}
	}

	/// Creates an alias declaration.
	pub fn alias(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			alias: Some(target.into()),
			..Self::default()
		}
	}

	/// Sets the guard symbol.
	pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
		self.guard = Some(guard.into());
		self
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
	#[serde(rename = "type")]
	pub ty: String,
	pub name: String,
	/// Full declaration text, e.g. `const VkAllocationCallbacks* pAllocator`.
	#[serde(default)]
	pub decl: String,
}

impl ParamSpec {
	pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
		let ty = ty.into();
		let name = name.into();
		let decl = format!("{ty} {name}");
		Self { ty, name, decl }
	}

	/// Returns the declaration text, synthesizing `type name` when none was given.
	pub fn decl_text(&self) -> String {
		if self.decl.is_empty() {
			format!("{} {}", self.ty, self.name)
		} else {
			self.decl.clone()
		}
	}
}
