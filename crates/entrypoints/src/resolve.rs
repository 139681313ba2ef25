//! Enablement resolution.
//!
//! Walks the registry once: declarations (with alias binding), then features
//! up to the maximum API version, then the supported extensions. Each phase
//! stamps the entry points it requires; anything left without a stamp is
//! unreachable.

use std::cmp::Ordering;

use rustc_hash::FxHashMap as HashMap;

use epgen_registry_spec::RegistrySpec;

use crate::entrypoint::{DeclId, Declaration, Enablement, EntryPoint, EntryPointAlias};
use crate::error::GenError;
use crate::extension::ExtensionTable;
use crate::version::ApiVersion;

/// Registry declarations after alias binding and enablement stamping.
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
	decls: Vec<Declaration>,
	by_name: HashMap<String, DeclId>,
}

impl ResolvedRegistry {
	/// Declarations in registry order.
	pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
		self.decls
			.iter()
			.enumerate()
			.map(|(i, d)| (DeclId(i as u32), d))
	}

	pub fn get(&self, name: &str) -> Option<(DeclId, &Declaration)> {
		let id = *self.by_name.get(name)?;
		Some((id, &self.decls[id.0 as usize]))
	}

	/// The canonical entry point behind `id`.
	pub fn entry(&self, id: DeclId) -> Option<&EntryPoint> {
		match self.decls.get(id.0 as usize)? {
			Declaration::Entry(e) => Some(e),
			Declaration::Alias(a) => self.decls.get(a.target.0 as usize)?.as_entry(),
		}
	}

	/// Device classification of a declaration; aliases answer for their target.
	pub fn is_device_entrypoint(&self, name: &str) -> Option<bool> {
		let (id, _) = self.get(name)?;
		Some(self.entry(id)?.is_device_entrypoint())
	}

	pub fn len(&self) -> usize {
		self.decls.len()
	}

	pub fn is_empty(&self) -> bool {
		self.decls.is_empty()
	}

	pub fn reachable_count(&self) -> usize {
		self.decls.iter().filter(|d| d.enablement().is_reachable()).count()
	}

	fn stamp(&mut self, requirer: impl FnOnce() -> String, name: &str) -> Result<&mut Declaration, GenError> {
		match self.by_name.get(name) {
			Some(id) => Ok(&mut self.decls[id.0 as usize]),
			None => Err(GenError::UnknownCommand {
				requirer: requirer(),
				name: name.to_string(),
			}),
		}
	}
}

/// Platform define a command inherits from the extension that requires it.
fn platform_guards(registry: &RegistrySpec) -> HashMap<&str, String> {
	let mut guards = HashMap::default();
	for ext in &registry.extensions {
		let Some(define) = ext.platform_define() else {
			continue;
		};
		for cmd in &ext.commands {
			guards.entry(cmd.as_str()).or_insert_with(|| define.clone());
		}
	}
	guards
}

/// Binds aliases and stamps every entry point reachable from a core version
/// up to `max_api_version` or from an extension present in `extensions`.
pub fn resolve(
	registry: &RegistrySpec,
	max_api_version: ApiVersion,
	extensions: &ExtensionTable,
) -> Result<ResolvedRegistry, GenError> {
	let guards = platform_guards(registry);
	let mut resolved = ResolvedRegistry {
		decls: Vec::with_capacity(registry.commands.len()),
		by_name: HashMap::with_capacity_and_hasher(registry.commands.len(), Default::default()),
	};

	for cmd in &registry.commands {
		if resolved.by_name.contains_key(&cmd.name) {
			return Err(GenError::DuplicateEntryPoint(cmd.name.clone()));
		}
		let decl = match &cmd.alias {
			Some(target) => {
				let Some((target_id, target_decl)) = resolved.get(target) else {
					return Err(GenError::UndeclaredAliasTarget {
						alias: cmd.name.clone(),
						target: target.clone(),
					});
				};
				let target = match target_decl {
					Declaration::Alias(a) => a.target,
					Declaration::Entry(_) => target_id,
				};
				Declaration::Alias(EntryPointAlias {
					name: cmd.name.clone(),
					target,
					enablement: Enablement::default(),
				})
			}
			None => {
				let mut ep = EntryPoint::from_spec(cmd);
				if ep.guard.is_none() {
					ep.guard = guards.get(cmd.name.as_str()).cloned();
				}
				Declaration::Entry(ep)
			}
		};
		let id = DeclId(resolved.decls.len() as u32);
		resolved.by_name.insert(cmd.name.clone(), id);
		resolved.decls.push(decl);
	}

	let mut skipped_features = 0usize;
	for feature in &registry.features {
		if feature.api != "vulkan" {
			return Err(GenError::UnsupportedApi {
				feature: feature.number.clone(),
				api: feature.api.clone(),
			});
		}
		let version: ApiVersion = feature.number.parse().map_err(|source| GenError::Version {
			owner: format!("feature {}", feature.number),
			source,
		})?;
		if version.compare(&max_api_version) == Ordering::Greater {
			skipped_features += 1;
			continue;
		}
		for name in &feature.commands {
			let decl = resolved.stamp(|| format!("feature {}", feature.number), name)?;
			decl.enablement_mut().stamp_core(name, version)?;
		}
	}

	for ext in &registry.extensions {
		let Some((ext_id, _)) = extensions.get(&ext.name) else {
			continue;
		};
		for name in &ext.commands {
			let decl = resolved.stamp(|| format!("extension {}", ext.name), name)?;
			decl.enablement_mut().stamp_extension(name, ext_id)?;
		}
	}

	for (_, decl) in resolved.decls() {
		if !decl.enablement().is_reachable() {
			tracing::trace!(name = decl.name(), "unreachable entry point");
		}
	}
	tracing::debug!(
		declared = resolved.len(),
		reachable = resolved.reachable_count(),
		skipped_features,
		"resolved entry point enablement"
	);

	Ok(resolved)
}
