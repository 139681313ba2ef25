//! Dispatch tables and trampoline routing.
//!
//! A table has one slot per id. Synthesis produces symbolic [`Binding`]s; a
//! slot whose guard is not defined in a build resolves to `None` rather than
//! disappearing, so every table keeps the same shape in every configuration.

use rustc_hash::FxHashSet as HashSet;
use serde::{Deserialize, Serialize};

use crate::entrypoint::HandleKind;
use crate::error::GenError;
use crate::intern::{EntrypointId, TableEntry};

/// Conditional-compilation symbols defined for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
	defines: HashSet<String>,
}

impl BuildConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn define(&mut self, symbol: impl Into<String>) {
		self.defines.insert(symbol.into());
	}

	pub fn is_defined(&self, symbol: &str) -> bool {
		self.defines.contains(symbol)
	}
}

impl<S: Into<String>> FromIterator<S> for BuildConfig {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self {
			defines: iter.into_iter().map(Into::into).collect(),
		}
	}
}

/// What a slot points at before a build configuration is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
	pub symbol: String,
	pub guard: Option<String>,
	/// Handle the trampoline reads the owning device from.
	pub route: Option<HandleKind>,
}

impl Binding {
	pub fn resolve(&self, config: &BuildConfig) -> Option<&str> {
		match &self.guard {
			Some(guard) if !config.is_defined(guard) => None,
			_ => Some(&self.symbol),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTable<S> {
	name: String,
	slots: Box<[S]>,
}

pub type SymbolTable = DispatchTable<Option<Binding>>;

impl<S> DispatchTable<S> {
	pub fn new(name: impl Into<String>, slots: Vec<S>) -> Self {
		Self {
			name: name.into(),
			slots: slots.into_boxed_slice(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn get(&self, id: EntrypointId) -> Option<&S> {
		self.slots.get(id.index())
	}

	pub fn slots(&self) -> &[S] {
		&self.slots
	}

	/// Same-shaped table with every slot transformed.
	pub fn map<T>(&self, f: impl FnMut(&S) -> T) -> DispatchTable<T> {
		DispatchTable {
			name: self.name.clone(),
			slots: self.slots.iter().map(f).collect(),
		}
	}
}

impl SymbolTable {
	/// Concrete symbols for one build; guarded-out slots become `None`.
	pub fn resolve(&self, config: &BuildConfig) -> DispatchTable<Option<String>> {
		self.map(|slot| {
			slot.as_ref()
				.and_then(|b| b.resolve(config))
				.map(str::to_string)
		})
	}
}

/// Something that fills a dispatch table: a layer's own implementation, or
/// the routing trampolines.
pub trait DispatchSource {
	fn table_name(&self) -> String;

	/// Slot contents for one entry; `Ok(None)` leaves the slot empty.
	fn bind(&self, entry: &TableEntry) -> Result<Option<Binding>, GenError>;
}

/// An implementation variant with its own dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
	pub prefix: String,
}

impl Layer {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}
}

impl DispatchSource for Layer {
	fn table_name(&self) -> String {
		format!("{}_dispatch_table", self.prefix)
	}

	fn bind(&self, entry: &TableEntry) -> Result<Option<Binding>, GenError> {
		Ok(Some(Binding {
			symbol: entry.implementation_symbol(&self.prefix)?,
			guard: entry.guard().map(str::to_string),
			route: None,
		}))
	}
}

/// Route of a device entry point, taken from its first parameter type.
pub fn trampoline_route(entry: &TableEntry) -> Result<HandleKind, GenError> {
	let ty = entry.target.params.first().map(|p| p.ty.as_str()).unwrap_or_default();
	HandleKind::from_type_name(ty).ok_or_else(|| GenError::UnhandledTrampoline {
		name: entry.name.clone(),
		ty: ty.to_string(),
	})
}

/// Trampolines forwarding device entry points to the owning device's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrampolineLayer {
	pub prefix: String,
}

impl TrampolineLayer {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}
}

impl DispatchSource for TrampolineLayer {
	fn table_name(&self) -> String {
		format!("{}_tramp_dispatch_table", self.prefix)
	}

	fn bind(&self, entry: &TableEntry) -> Result<Option<Binding>, GenError> {
		if !entry.is_device_entrypoint() {
			return Ok(None);
		}
		let route = trampoline_route(entry)?;
		Ok(Some(Binding {
			symbol: entry.implementation_symbol(&format!("{}_tramp", self.prefix))?,
			guard: entry.guard().map(str::to_string),
			route: Some(route),
		}))
	}
}

/// Fills one table from `source`, one slot per entry in id order.
pub fn synthesize(source: &dyn DispatchSource, entries: &[TableEntry]) -> Result<SymbolTable, GenError> {
	let slots = entries
		.iter()
		.map(|entry| source.bind(entry))
		.collect::<Result<Vec<_>, _>>()?;
	let table = DispatchTable::new(source.table_name(), slots);
	tracing::debug!(
		table = table.name(),
		slots = table.len(),
		bound = table.slots().iter().filter(|s| s.is_some()).count(),
		"synthesized dispatch table"
	);
	Ok(table)
}

/// First argument of a device entry point at call time.
pub trait DispatchHandle<F> {
	fn kind(&self) -> HandleKind;

	/// Active dispatch table of the device owning this object.
	fn device_table(&self) -> &DispatchTable<Option<F>>;
}

/// Runtime form of the trampoline table: the route of every slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trampolines {
	routes: Box<[Option<HandleKind>]>,
}

impl Trampolines {
	pub fn from_table(table: &SymbolTable) -> Self {
		Self {
			routes: table
				.slots()
				.iter()
				.map(|slot| slot.as_ref().and_then(|b| b.route))
				.collect(),
		}
	}

	pub fn route(&self, id: EntrypointId) -> Option<HandleKind> {
		self.routes.get(id.index()).copied().flatten()
	}

	/// Looks up the slot for `id` in the table of the device owning `handle`.
	///
	/// Returns `None` for instance-level ids, for a handle of the wrong kind,
	/// and for empty slots.
	pub fn dispatch<'h, F, H>(&self, id: EntrypointId, handle: &'h H) -> Option<&'h F>
	where
		H: DispatchHandle<F> + ?Sized,
	{
		let route = self.route(id)?;
		if handle.kind() != route {
			return None;
		}
		handle.device_table().get(id)?.as_ref()
	}
}
