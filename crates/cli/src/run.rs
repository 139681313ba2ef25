use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use epgen_entrypoints::{ApiVersion, BuildConfig, ConditionSet, EntrypointTables, ExtensionKind, blob};
use epgen_registry_spec::{RegistrySpec, load_profile, load_registry};
use tracing::info;

use crate::cli::{Command, Inputs};

pub fn run(command: Command, out: &mut dyn Write) -> Result<()> {
	match command {
		Command::Generate {
			inputs,
			out: path,
			defines,
		} => generate(&inputs, path, defines, out),
		Command::Lookup {
			inputs,
			version,
			conditions,
			no_device,
			names,
		} => lookup(&inputs, version.as_deref(), conditions, no_device, &names, out),
		Command::Stats { inputs } => stats(&inputs, out),
	}
}

fn load(inputs: &Inputs) -> Result<EntrypointTables> {
	let mut registry = RegistrySpec::default();
	for path in &inputs.registry {
		registry.merge(load_registry(path)?);
	}
	let profile = load_profile(&inputs.profile)?;
	let tables = EntrypointTables::generate(&registry, &profile)
		.with_context(|| format!("generating tables for profile {}", inputs.profile.display()))?;
	Ok(tables)
}

fn generate(inputs: &Inputs, path: Option<PathBuf>, defines: Vec<String>, out: &mut dyn Write) -> Result<()> {
	let tables = load(inputs)?;
	let config: BuildConfig = defines.into_iter().collect();
	for layer in tables.layers() {
		let resolved = layer.resolve(&config);
		let absent = resolved.slots().iter().filter(|s| s.is_none()).count();
		info!(table = layer.name(), slots = resolved.len(), absent, "resolved guards");
	}

	let path = path.unwrap_or_else(|| PathBuf::from(format!("{}_entrypoints.bin", tables.name_prefix())));
	let bytes = blob::encode(&tables)?;
	write_blob(&path, &bytes)?;
	info!(path = %path.display(), bytes = bytes.len(), "wrote table blob");
	writeln!(out, "{} entry points, {} bytes -> {}", tables.len(), bytes.len(), path.display())?;
	Ok(())
}

fn write_blob(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
		&& !parent.exists()
	{
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn lookup(
	inputs: &Inputs,
	version: Option<&str>,
	conditions: Vec<String>,
	no_device: bool,
	names: &[String],
	out: &mut dyn Write,
) -> Result<()> {
	let tables = load(inputs)?;
	let env: ConditionSet = conditions.into_iter().collect();
	let requested: ApiVersion = match version {
		Some(v) => v.parse().with_context(|| format!("--version {v:?}"))?,
		None => tables.max_api_version(),
	};
	let core = tables.api_versions().negotiate(requested, &env);
	let instance = tables.extensions().supported(ExtensionKind::Instance, &env);
	let device = (!no_device).then(|| tables.extensions().supported(ExtensionKind::Device, &env));
	info!(%requested, negotiated = %core, capability_mode = no_device, "lookup");

	for name in names {
		match tables.lookup(name) {
			Some(id) => {
				let enabled = tables.is_enabled(id, core, &instance, device.as_ref());
				writeln!(out, "{name}\t{}\t{}", id.0, if enabled { "enabled" } else { "disabled" })?;
			}
			None => writeln!(out, "{name}\t-\tnot found")?,
		}
	}
	Ok(())
}

fn stats(inputs: &Inputs, out: &mut dyn Write) -> Result<()> {
	let tables = load(inputs)?;
	let strings = tables.strings();
	writeln!(out, "entry points: {}", tables.len())?;
	writeln!(out, "names:        {}", strings.len())?;
	writeln!(out, "hash size:    {}", strings.hash_size())?;
	writeln!(out, "hash mask:    {:#x}", strings.hash_mask())?;
	writeln!(out, "load factor:  {:.3}", strings.load_factor())?;
	writeln!(out, "collisions:   {}", strings.collisions())?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn assets() -> Inputs {
		let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
		Inputs {
			registry: vec![dir.join("registry.toml")],
			profile: dir.join("profile.toml"),
		}
	}

	fn output(command: Command) -> String {
		let mut buf = Vec::new();
		run(command, &mut buf).unwrap();
		String::from_utf8(buf).unwrap()
	}

	#[test]
	fn generate_writes_a_decodable_blob() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out/tables.bin");
		output(Command::Generate {
			inputs: assets(),
			out: Some(path.clone()),
			defines: vec!["VK_USE_PLATFORM_WAYLAND_KHR".into()],
		});
		let tables = blob::decode(&std::fs::read(&path).unwrap()).unwrap();
		assert_eq!(tables, load(&assets()).unwrap());
	}

	#[test]
	fn lookup_reports_enablement() {
		let text = output(Command::Lookup {
			inputs: assets(),
			version: Some("1.1".into()),
			conditions: vec![],
			no_device: false,
			names: vec!["vkTrimCommandPool".into(), "vkTrimCommandPoolKHR".into(), "vkNope".into()],
		});
		let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
		// 1.1 needs the syncobj condition, and the alias answers for its target.
		assert_eq!(rows[0][0], "vkTrimCommandPool");
		assert_eq!(rows[0][2], "disabled");
		assert_eq!(rows[1][1], rows[0][1]);
		assert_eq!(rows[1][2], "disabled");
		assert_eq!(rows[2], ["vkNope", "-", "not found"]);
	}

	#[test]
	fn lookup_with_condition_enables_core_entry() {
		let text = output(Command::Lookup {
			inputs: assets(),
			version: None,
			conditions: vec!["device->has_syncobj".into()],
			no_device: false,
			names: vec!["vkTrimCommandPool".into()],
		});
		assert!(text.trim_end().ends_with("\tenabled"));
	}

	#[test]
	fn stats_prints_histogram() {
		let text = output(Command::Stats { inputs: assets() });
		assert!(text.contains("hash size:"));
		assert!(text.contains("9+:"));
	}

	#[test]
	fn bad_version_is_an_error() {
		let mut buf = Vec::new();
		let err = run(
			Command::Lookup {
				inputs: assets(),
				version: Some("1.x".into()),
				conditions: vec![],
				no_device: true,
				names: vec!["vkCreateInstance".into()],
			},
			&mut buf,
		)
		.unwrap_err();
		assert!(err.to_string().contains("--version"));
	}
}
