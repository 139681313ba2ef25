use epgen_entrypoints::{
	ApiVersion, BuildConfig, ConditionSet, EntrypointTables, ExtensionKind, ExtensionSet, GenError, HandleKind, blob,
};
use epgen_registry_spec::{
	ApiVersionSpec, CommandSpec, ExtensionSpec, ExtensionType, FeatureSpec, ParamSpec, ProfileExtensionSpec,
	ProfileSpec, RegistrySpec,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn cmd(name: &str, first: &str) -> CommandSpec {
	CommandSpec::new(name, "void", vec![ParamSpec::new(first, "handle")])
}

fn registry() -> RegistrySpec {
	RegistrySpec {
		commands: vec![
			cmd("vkCreateInstance", "const VkInstanceCreateInfo*"),
			cmd("vkGetDeviceProcAddr", "VkDevice"),
			cmd("vkFoo", "VkDevice"),
			cmd("vkCmdBar", "VkCommandBuffer"),
			CommandSpec::alias("vkFooKHR", "vkFoo"),
			cmd("vkCreateWaylandSurfaceKHR", "VkInstance"),
		],
		features: vec![
			FeatureSpec::new("1.0", &["vkCreateInstance", "vkGetDeviceProcAddr"]),
			FeatureSpec::new("1.1", &["vkFoo"]),
		],
		extensions: vec![
			ExtensionSpec::new("VK_KHR_wayland_surface", ExtensionType::Instance, &["vkCreateWaylandSurfaceKHR"])
				.with_platform("wayland"),
			ExtensionSpec::new("VK_TEST_ext", ExtensionType::Device, &["vkCmdBar"]),
			ExtensionSpec::new("VK_KHR_foo", ExtensionType::Device, &["vkFooKHR"]),
		],
	}
}

fn profile() -> ProfileSpec {
	ProfileSpec {
		name_prefix: "tst".into(),
		layers: vec!["tst".into(), "tst_trace".into()],
		api_patch_version: Some(7),
		api_versions: vec![ApiVersionSpec::new("1.0", true), ApiVersionSpec::new("1.1", "C")],
		extensions: vec![
			ProfileExtensionSpec::new("VK_KHR_wayland_surface", 6, "WAYLAND"),
			ProfileExtensionSpec::new("VK_TEST_ext", 1, true),
			ProfileExtensionSpec::new("VK_KHR_foo", 1, true),
		],
		extra_entrypoints: vec![cmd("vkCreateDmaBufImageINTEL", "VkDevice")],
	}
}

fn tables() -> EntrypointTables {
	EntrypointTables::generate(&registry(), &profile()).unwrap()
}

fn v(s: &str) -> ApiVersion {
	s.parse().unwrap()
}

fn conditions(atoms: &[&str]) -> ConditionSet {
	atoms.iter().copied().collect()
}

fn no_instance_exts(t: &EntrypointTables) -> ExtensionSet {
	ExtensionSet::empty(ExtensionKind::Instance, t.extensions().len(ExtensionKind::Instance))
}

#[test]
fn ids_follow_registry_order() {
	let t = tables();
	let names: Vec<_> = t.entries().iter().map(|e| e.name.as_str()).collect();
	assert_eq!(
		names,
		[
			"vkCreateInstance",
			"vkGetDeviceProcAddr",
			"vkFoo",
			"vkCmdBar",
			"vkCreateWaylandSurfaceKHR",
			"vkCreateDmaBufImageINTEL"
		]
	);
	assert_eq!(t.max_api_version(), v("1.1.7"));
	assert_eq!(t.lookup("vkNotAThing"), None);
}

#[test]
fn core_version_gated_by_condition() {
	let t = tables();
	let foo = t.lookup("vkFoo").unwrap();
	let inst = no_instance_exts(&t);
	let dev = t.extensions().supported(ExtensionKind::Device, &ConditionSet::new());

	assert!(!t.is_enabled(foo, v("1.0.7"), &inst, Some(&dev)));

	let with_c = t.api_versions().negotiate(v("1.1.0"), &conditions(&["C"]));
	assert_eq!(with_c, v("1.1.0"));
	assert!(t.is_enabled(foo, with_c, &inst, Some(&dev)));

	// Without C, 1.1 is never available, whatever the application asks for.
	let without_c = t.api_versions().negotiate(v("1.1.0"), &ConditionSet::new());
	assert_eq!(without_c, v("1.0.7"));
	assert!(!t.is_enabled(foo, without_c, &inst, Some(&dev)));
}

#[test]
fn device_extension_entry_point_in_capability_mode() {
	let t = tables();
	let bar = t.lookup("vkCmdBar").unwrap();
	let inst = no_instance_exts(&t);
	let core = v("1.0.0");

	assert!(t.is_enabled(bar, core, &inst, None));

	let lacking = ExtensionSet::empty(ExtensionKind::Device, t.extensions().len(ExtensionKind::Device));
	assert!(!t.is_enabled(bar, core, &inst, Some(&lacking)));

	let with_ext = t
		.extensions()
		.set_from_names(ExtensionKind::Device, ["VK_TEST_ext"])
		.unwrap();
	assert!(t.is_enabled(bar, core, &inst, Some(&with_ext)));
}

#[test]
fn instance_entry_points_need_no_device_context() {
	let t = tables();
	let create = t.lookup("vkCreateInstance").unwrap();
	let inst = no_instance_exts(&t);
	let dev = ExtensionSet::empty(ExtensionKind::Device, t.extensions().len(ExtensionKind::Device));
	assert!(t.is_enabled(create, v("1.0.0"), &inst, None));
	assert!(!t.is_enabled(create, v("1.0.0"), &inst, Some(&dev)));

	let surface = t.lookup("vkCreateWaylandSurfaceKHR").unwrap();
	assert!(!t.is_enabled(surface, v("1.0.0"), &inst, None));
	let wayland = t.extensions().supported(ExtensionKind::Instance, &conditions(&["WAYLAND"]));
	assert!(t.is_enabled(surface, v("1.0.0"), &wayland, None));
}

#[test]
fn alias_shares_slot_and_classification() {
	let t = tables();
	let foo = t.lookup("vkFoo").unwrap();
	assert_eq!(t.lookup("vkFooKHR"), Some(foo));
	let entry = t.entry(foo).unwrap();
	assert_eq!(entry.aliases, ["vkFooKHR"]);
	assert!(entry.is_device_entrypoint());
	assert_eq!(t.trampoline_routes().route(foo), Some(HandleKind::Device));
}

#[test]
fn lookup_checked_hides_disabled_entries() {
	let t = tables();
	let inst = no_instance_exts(&t);
	let dev = ExtensionSet::empty(ExtensionKind::Device, t.extensions().len(ExtensionKind::Device));
	assert_eq!(t.lookup_checked("vkFoo", v("1.0.0"), &inst, Some(&dev)), None);
	assert_eq!(
		t.lookup_checked("vkFoo", v("1.1.0"), &inst, Some(&dev)),
		t.lookup("vkFoo")
	);
	assert!(
		t.lookup_checked("vkCreateDmaBufImageINTEL", ApiVersion::NONE, &inst, Some(&dev))
			.is_some()
	);
}

#[test]
fn one_table_per_layer_plus_trampolines() {
	let t = tables();
	let names: Vec<_> = t.layers().iter().map(|l| l.name()).collect();
	assert_eq!(names, ["tst_dispatch_table", "tst_trace_dispatch_table"]);
	assert!(t.layers().iter().all(|l| l.len() == t.len()));
	assert_eq!(t.trampolines().len(), t.len());

	let trace = t.layer("tst_trace").unwrap();
	let foo = t.lookup("vkFooKHR").unwrap();
	assert_eq!(trace.get(foo).unwrap().as_ref().unwrap().symbol, "tst_trace_Foo");

	let surface = t.lookup("vkCreateWaylandSurfaceKHR").unwrap();
	let plain = t.layer("tst").unwrap().resolve(&BuildConfig::new());
	assert_eq!(plain.get(surface), Some(&None));
	let wayland = t
		.layer("tst")
		.unwrap()
		.resolve(&["VK_USE_PLATFORM_WAYLAND_KHR"].into_iter().collect());
	assert_eq!(wayland.get(surface), Some(&Some("tst_CreateWaylandSurfaceKHR".to_string())));
	assert_eq!(t.trampolines().get(surface), Some(&None));
}

#[test]
fn blob_round_trips() {
	let t = tables();
	let bytes = blob::encode(&t).unwrap();
	assert_eq!(&bytes[..8], blob::MAGIC);
	assert_eq!(blob::decode(&bytes).unwrap(), t);
}

#[test]
fn blob_header_is_checked() {
	let mut bytes = blob::encode(&tables()).unwrap();
	assert!(matches!(blob::decode(&bytes[..5]), Err(blob::BlobError::Truncated(5))));

	bytes[8] = bytes[8].wrapping_add(1);
	assert!(matches!(blob::decode(&bytes), Err(blob::BlobError::SchemaMismatch { .. })));

	bytes[0] = b'X';
	assert!(matches!(blob::decode(&bytes), Err(blob::BlobError::BadMagic)));
}

#[test]
fn inconsistent_inputs_abort_generation() {
	let mut reg = registry();
	reg.commands.push(cmd("vkFoo", "VkDevice"));
	assert_eq!(
		EntrypointTables::generate(&reg, &profile()),
		Err(GenError::DuplicateEntryPoint("vkFoo".into()))
	);

	let mut reg = registry();
	reg.extensions[1].commands.push("vkFoo".into());
	assert_eq!(
		EntrypointTables::generate(&reg, &profile()),
		Err(GenError::CoreAndExtension("vkFoo".into()))
	);

	let mut prof = profile();
	prof.api_versions.push(ApiVersionSpec::new("1.1", true));
	assert!(matches!(
		EntrypointTables::generate(&registry(), &prof),
		Err(GenError::VersionNotIncreasing { .. })
	));

	let mut prof = profile();
	prof.extensions.push(ProfileExtensionSpec::new("VK_KHR_unheard_of", 1, true));
	assert!(matches!(
		EntrypointTables::generate(&registry(), &prof),
		Err(GenError::UnknownExtensionKind(_))
	));
}

#[test]
fn every_reachable_entry_has_one_source() {
	let t = tables();
	for entry in t.entries() {
		let en = &entry.enablement;
		assert!(!(en.core_version.is_some() && !en.extensions.is_empty()), "{}", entry.name);
	}
}

proptest! {
	#[test]
	fn core_enablement_is_monotonic(major in 0u16..3, minor in 0u16..4, patch in 0u16..100) {
		let t = tables();
		let foo = t.lookup("vkFoo").unwrap();
		let inst = no_instance_exts(&t);
		let dev = ExtensionSet::empty(ExtensionKind::Device, t.extensions().len(ExtensionKind::Device));
		let negotiated = ApiVersion::new(major, minor).with_patch(patch);
		let expected = (major, minor) >= (1, 1);
		prop_assert_eq!(t.is_enabled(foo, negotiated, &inst, Some(&dev)), expected);
	}
}
