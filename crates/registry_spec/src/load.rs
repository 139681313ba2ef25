//! TOML loading for registry and profile documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::{ProfileSpec, RegistrySpec};

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse {what}: {source}")]
	Toml {
		what: String,
		#[source]
		source: toml::de::Error,
	},
}

fn parse<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, SpecError> {
	toml::from_str(text).map_err(|source| SpecError::Toml {
		what: what.to_string(),
		source,
	})
}

fn read(path: &Path) -> Result<String, SpecError> {
	fs::read_to_string(path).map_err(|source| SpecError::Io {
		path: path.to_path_buf(),
		source,
	})
}

impl RegistrySpec {
	pub fn from_toml_str(text: &str) -> Result<Self, SpecError> {
		parse(text, "registry")
	}
}

impl ProfileSpec {
	pub fn from_toml_str(text: &str) -> Result<Self, SpecError> {
		parse(text, "profile")
	}
}

/// Reads and parses a registry document.
pub fn load_registry(path: &Path) -> Result<RegistrySpec, SpecError> {
	let text = read(path)?;
	parse(&text, &path.display().to_string())
}

/// Reads and parses a driver profile.
pub fn load_profile(path: &Path) -> Result<ProfileSpec, SpecError> {
	let text = read(path)?;
	parse(&text, &path.display().to_string())
}
