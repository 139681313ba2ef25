use serde::{Deserialize, Serialize};

/// Which object an extension is enabled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
	Instance,
	Device,
}

impl std::fmt::Display for ExtensionType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Instance => write!(f, "instance"),
			Self::Device => write!(f, "device"),
		}
	}
}

/// Registry-side declaration of an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSpec {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: ExtensionType,
	/// Window-system platform, which turns into a guard on required commands.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub platform: Option<String>,
	#[serde(default)]
	pub commands: Vec<String>,
}

impl ExtensionSpec {
	pub fn new(name: impl Into<String>, ty: ExtensionType, commands: &[&str]) -> Self {
		Self {
			name: name.into(),
			ty,
			platform: None,
			commands: commands.iter().map(|c| c.to_string()).collect(),
		}
	}

	pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
		self.platform = Some(platform.into());
		self
	}

	/// Returns the `VK_USE_PLATFORM_*` define guarding this extension's commands.
	pub fn platform_define(&self) -> Option<String> {
		let platform = self.platform.as_deref()?.to_uppercase();
		let suffix = if platform == "XLIB_XRANDR" { "_EXT" } else { "_KHR" };
		Some(format!("VK_USE_PLATFORM_{platform}{suffix}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn platform_define_uses_khr_suffix() {
		let ext = ExtensionSpec::new("VK_KHR_wayland_surface", ExtensionType::Instance, &[]).with_platform("wayland");
		assert_eq!(ext.platform_define().as_deref(), Some("VK_USE_PLATFORM_WAYLAND_KHR"));
	}

	#[test]
	fn platform_define_xrandr_uses_ext_suffix() {
		let ext = ExtensionSpec::new("VK_EXT_acquire_xlib_display", ExtensionType::Instance, &[]).with_platform("xlib_xrandr");
		assert_eq!(ext.platform_define().as_deref(), Some("VK_USE_PLATFORM_XLIB_XRANDR_EXT"));
	}

	#[test]
	fn no_platform_no_define() {
		let ext = ExtensionSpec::new("VK_KHR_maintenance1", ExtensionType::Device, &[]);
		assert!(ext.platform_define().is_none());
	}
}
