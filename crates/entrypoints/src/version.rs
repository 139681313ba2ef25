//! API version values.
//!
//! A version is `major.minor` with an optional patch. When exactly one side of
//! a comparison carries a patch, the patch is ignored, so `1.1` and `1.1.80`
//! compare equal while `1.1.70` sorts before `1.1.80`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MAJOR_LIMIT: u16 = 1024;
const MINOR_LIMIT: u16 = 1024;
const PATCH_LIMIT: u16 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
	#[error("malformed version {0:?}")]
	Malformed(String),
	#[error("version {0:?} component out of range")]
	OutOfRange(String),
	#[error("version {0:?} does not round-trip")]
	NotCanonical(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
	major: u16,
	minor: u16,
	patch: Option<u16>,
}

impl ApiVersion {
	/// The version reported when not even the first declared version is available.
	pub const NONE: Self = Self {
		major: 0,
		minor: 0,
		patch: Some(0),
	};

	pub const fn new(major: u16, minor: u16) -> Self {
		Self {
			major,
			minor,
			patch: None,
		}
	}

	pub const fn with_patch(self, patch: u16) -> Self {
		Self {
			patch: Some(patch),
			..self
		}
	}

	pub const fn major(self) -> u16 {
		self.major
	}

	pub const fn minor(self) -> u16 {
		self.minor
	}

	pub const fn patch(self) -> Option<u16> {
		self.patch
	}

	/// Packs the version the way `VK_MAKE_VERSION` does; an absent patch is 0.
	pub const fn encode(self) -> u32 {
		let patch = match self.patch {
			Some(p) => p as u32,
			None => 0,
		};
		((self.major as u32) << 22) | ((self.minor as u32) << 12) | patch
	}

	/// Inverse of [`ApiVersion::encode`]; the result always carries a patch.
	pub const fn decode(raw: u32) -> Self {
		Self {
			major: ((raw >> 22) & 0x3ff) as u16,
			minor: ((raw >> 12) & 0x3ff) as u16,
			patch: Some((raw & 0xfff) as u16),
		}
	}

	/// Compares two versions, ignoring the patch if only one side has it.
	pub fn compare(&self, other: &Self) -> Ordering {
		let (a, b) = match (self.patch, other.patch) {
			(Some(_), None) | (None, Some(_)) => (self.without_patch(), other.without_patch()),
			_ => (*self, *other),
		};
		a.encode().cmp(&b.encode())
	}

	/// Compares `major.minor` only.
	pub fn compare_minor(&self, other: &Self) -> Ordering {
		(self.major, self.minor).cmp(&(other.major, other.minor))
	}

	/// Returns the lower of the two versions under [`ApiVersion::compare`].
	pub fn min(self, other: Self) -> Self {
		if other.compare(&self) == Ordering::Less { other } else { self }
	}

	const fn without_patch(self) -> Self {
		Self { patch: None, ..self }
	}
}

impl fmt::Display for ApiVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)?;
		if let Some(patch) = self.patch {
			write!(f, ".{patch}")?;
		}
		Ok(())
	}
}

impl FromStr for ApiVersion {
	type Err = VersionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let parts: Vec<&str> = s.split('.').collect();
		if !(2..=3).contains(&parts.len()) {
			return Err(VersionError::Malformed(s.to_string()));
		}
		let num = |p: &str| p.parse::<u16>().map_err(|_| VersionError::Malformed(s.to_string()));
		let major = num(parts[0])?;
		let minor = num(parts[1])?;
		let patch = parts.get(2).map(|p| num(*p)).transpose()?;

		if major >= MAJOR_LIMIT || minor >= MINOR_LIMIT || patch.is_some_and(|p| p >= PATCH_LIMIT) {
			return Err(VersionError::OutOfRange(s.to_string()));
		}

		let version = Self { major, minor, patch };
		if version.to_string() != s {
			return Err(VersionError::NotCanonical(s.to_string()));
		}
		Ok(version)
	}
}

impl TryFrom<String> for ApiVersion {
	type Error = VersionError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		s.parse()
	}
}

impl From<ApiVersion> for String {
	fn from(v: ApiVersion) -> Self {
		v.to_string()
	}
}
