use serde::{Deserialize, Serialize};

/// A core API feature: the version that introduced a set of commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
	#[serde(default = "default_api")]
	pub api: String,
	pub number: String,
	#[serde(default)]
	pub commands: Vec<String>,
}

fn default_api() -> String {
	"vulkan".to_string()
}

impl FeatureSpec {
	pub fn new(number: impl Into<String>, commands: &[&str]) -> Self {
		Self {
			api: default_api(),
			number: number.into(),
			commands: commands.iter().map(|c| c.to_string()).collect(),
		}
	}
}
