use crate::predicate::PredicateError;
use crate::strmap::StringMapError;
use crate::version::{ApiVersion, VersionError};

/// Fatal registry inconsistencies.
///
/// Generation either succeeds completely or stops at the first of these; every
/// variant names the offending declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
	#[error("duplicate entry point {0:?}")]
	DuplicateEntryPoint(String),
	#[error("alias {alias:?} references undeclared entry point {target:?}")]
	UndeclaredAliasTarget { alias: String, target: String },
	#[error("{requirer} requires undeclared entry point {name:?}")]
	UnknownCommand { requirer: String, name: String },
	#[error("entry point {name:?} stamped with core version {first} and again with {second}")]
	CoreVersionTwice {
		name: String,
		first: ApiVersion,
		second: ApiVersion,
	},
	#[error("entry point {0:?} is provided by both a core version and an extension")]
	CoreAndExtension(String),
	#[error("feature {feature} targets api {api:?}, expected \"vulkan\"")]
	UnsupportedApi { feature: String, api: String },
	#[error("api version {version} does not follow {previous}")]
	VersionNotIncreasing { previous: ApiVersion, version: ApiVersion },
	#[error("profile declares no api versions")]
	NoApiVersions,
	#[error("bad version in {owner}: {source}")]
	Version {
		owner: String,
		#[source]
		source: VersionError,
	},
	#[error("bad enable predicate for {owner}: {source}")]
	Predicate {
		owner: String,
		#[source]
		source: PredicateError,
	},
	#[error("extension {0:?} is not declared by the registry")]
	UnknownExtensionKind(String),
	#[error("duplicate extension {0:?}")]
	DuplicateExtension(String),
	#[error("unknown extension {0:?}")]
	UnknownExtension(String),
	#[error("too many extensions for a 16-bit field index")]
	TooManyExtensions,
	#[error("entry point {0:?} does not start with \"vk\"")]
	MissingVkPrefix(String),
	#[error("no trampoline route for {name:?}: first parameter type {ty:?}")]
	UnhandledTrampoline { name: String, ty: String },
	#[error(transparent)]
	StringMap(#[from] StringMapError),
}
