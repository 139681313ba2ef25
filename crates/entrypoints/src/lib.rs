//! Entry-point registry and static lookup-table generation.
//!
//! # Pipeline
//!
//! 1. [`DriverProfile`] validates the driver's API versions and extensions.
//! 2. [`resolve`] binds aliases and stamps every entry point reachable from a
//!    core version or a supported extension.
//! 3. [`intern`] gives reachable entry points dense ids and bakes the
//!    name-to-id [`StringMap`].
//! 4. [`synthesize`] fills one dispatch table per layer and the trampoline table.
//!
//! [`EntrypointTables::generate`] runs all of it. The result is immutable;
//! [`SharedTables`] publishes replacements atomically and [`blob`] moves it
//! between processes.

pub mod blob;
pub mod dispatch;
pub mod entrypoint;
pub mod error;
pub mod extension;
pub mod intern;
pub mod predicate;
pub mod profile;
pub mod resolve;
pub mod runtime;
pub mod strmap;
pub mod tables;
pub mod version;

pub use dispatch::{
	Binding, BuildConfig, DispatchHandle, DispatchSource, DispatchTable, Layer, SymbolTable, TrampolineLayer,
	Trampolines, synthesize,
};
pub use entrypoint::{Enablement, EntryPoint, HandleKind};
pub use error::GenError;
pub use extension::{Extension, ExtensionId, ExtensionKind, ExtensionSet, ExtensionTable};
pub use intern::{EntrypointId, TableEntry, intern};
pub use predicate::{ConditionSet, Conditions, Predicate, PredicateError};
pub use profile::{ApiVersions, DriverProfile};
pub use resolve::{ResolvedRegistry, resolve};
pub use runtime::SharedTables;
pub use strmap::{StringMap, StringMapBuilder, StringMapError};
pub use tables::EntrypointTables;
pub use version::{ApiVersion, VersionError};
