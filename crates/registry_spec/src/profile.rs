use serde::{Deserialize, Serialize};

use crate::CommandSpec;

/// A driver profile: what the driver supports and under which conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
	pub name_prefix: String,
	/// Layer prefixes to emit dispatch tables for. Empty means `[name_prefix]`.
	#[serde(default)]
	pub layers: Vec<String>,
	/// Patch level stamped onto every declared API version.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_patch_version: Option<u16>,
	#[serde(default)]
	pub api_versions: Vec<ApiVersionSpec>,
	#[serde(default)]
	pub extensions: Vec<ProfileExtensionSpec>,
	/// Commands added after resolution with no enablement source.
	#[serde(default)]
	pub extra_entrypoints: Vec<CommandSpec>,
}

impl ProfileSpec {
	/// Returns the effective layer list.
	pub fn layer_names(&self) -> Vec<String> {
		if self.layers.is_empty() {
			vec![self.name_prefix.clone()]
		} else {
			self.layers.clone()
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersionSpec {
	pub version: String,
	#[serde(default)]
	pub enable: EnableSpec,
}

impl ApiVersionSpec {
	pub fn new(version: impl Into<String>, enable: impl Into<EnableSpec>) -> Self {
		Self {
			version: version.into(),
			enable: enable.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileExtensionSpec {
	pub name: String,
	#[serde(default = "default_revision")]
	pub revision: u32,
	#[serde(default)]
	pub enable: EnableSpec,
}

fn default_revision() -> u32 {
	1
}

impl ProfileExtensionSpec {
	pub fn new(name: impl Into<String>, revision: u32, enable: impl Into<EnableSpec>) -> Self {
		Self {
			name: name.into(),
			revision,
			enable: enable.into(),
		}
	}
}

/// Enable condition as written in a profile: a literal or an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnableSpec {
	Bool(bool),
	Expr(String),
}

impl Default for EnableSpec {
	fn default() -> Self {
		Self::Bool(true)
	}
}

impl From<bool> for EnableSpec {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<&str> for EnableSpec {
	fn from(s: &str) -> Self {
		Self::Expr(s.to_string())
	}
}

impl From<String> for EnableSpec {
	fn from(s: String) -> Self {
		Self::Expr(s)
	}
}
