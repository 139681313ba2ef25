//! Static string-to-number map used for entry-point name lookup.
//!
//! # Layout
//!
//! All strings live in one NUL-separated byte blob, laid out in ascending
//! byte order. Each [`StringMapEntry`] records the string's offset and length
//! in the blob, its hash, and the number it maps to. The slot table holds
//! indices into the entry array, or [`EMPTY_SLOT`].
//!
//! # Hashing and probing
//!
//! The hash is a multiplicative rolling hash modulo 2^32 with
//! [`PRIME_FACTOR`]. The slot table size is the next power of two at or above
//! `1.25 * len`, so at least a fifth of the slots stay empty. Collisions are
//! resolved by adding [`PRIME_STEP`] to the hash and masking again. The step is
//! odd and the size a power of two, so a probe sequence cycles through every
//! slot and must reach an empty one.
//!
//! Lookup hashes the query the same way and walks the same sequence. Reaching
//! an empty slot means the string is absent. A slot whose entry has the same
//! hash is only a hit if the bytes match too.
//!
//! # Lifecycle
//!
//! [`StringMapBuilder`] collects strings; [`StringMapBuilder::bake`] consumes
//! it and produces an immutable [`StringMap`]. There is no incremental update.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Multiplier of the rolling hash.
pub const PRIME_FACTOR: u32 = 5024183;
/// Additive probe step.
pub const PRIME_STEP: u32 = 19;
/// Slot marker for "no entry".
pub const EMPTY_SLOT: u16 = 0xffff;
/// Probe-chain histogram buckets: 0..=8 and "9+".
pub const HISTOGRAM_BUCKETS: usize = 10;

const MAX_NUM: u32 = 1 << 31;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StringMapError {
	#[error("string {0:?} added twice")]
	Duplicate(String),
	#[error("string {string:?} maps to out-of-range number {num}")]
	NumOutOfRange { string: String, num: u32 },
	#[error("string {0:?} contains a NUL byte")]
	InteriorNul(String),
	#[error("{0} strings do not fit a 16-bit slot table")]
	TooManyStrings(usize),
	#[error("string blob exceeds 4 GiB")]
	BlobTooLarge,
}

/// Hash of a string's bytes, identical at build time and lookup time.
pub fn hash_str(s: &str) -> u32 {
	s.bytes()
		.fold(0u32, |h, b| h.wrapping_mul(PRIME_FACTOR).wrapping_add(u32::from(b)))
}

/// Slot table size for `len` strings: the next power of two >= 1.25 * len.
pub fn table_size(len: usize) -> usize {
	(len * 5).div_ceil(4).next_power_of_two()
}

/// Collects strings before the table is baked.
#[derive(Debug, Clone, Default)]
pub struct StringMapBuilder {
	strings: BTreeMap<String, u32>,
}

impl StringMapBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Maps `string` to `num`. Every string may be added once.
	pub fn add(&mut self, string: impl Into<String>, num: u32) -> Result<(), StringMapError> {
		let string = string.into();
		if num >= MAX_NUM {
			return Err(StringMapError::NumOutOfRange { string, num });
		}
		if string.as_bytes().contains(&0) {
			return Err(StringMapError::InteriorNul(string));
		}
		match self.strings.entry(string) {
			std::collections::btree_map::Entry::Occupied(o) => Err(StringMapError::Duplicate(o.key().clone())),
			std::collections::btree_map::Entry::Vacant(v) => {
				v.insert(num);
				Ok(())
			}
		}
	}

	pub fn len(&self) -> usize {
		self.strings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strings.is_empty()
	}

	/// Lays out the blob and places every string in the slot table.
	pub fn bake(self) -> Result<StringMap, StringMapError> {
		let len = self.strings.len();
		if len >= usize::from(EMPTY_SLOT) {
			return Err(StringMapError::TooManyStrings(len));
		}

		let mut blob = Vec::new();
		let mut entries = Vec::with_capacity(len);
		for (string, num) in &self.strings {
			let offset = u32::try_from(blob.len()).map_err(|_| StringMapError::BlobTooLarge)?;
			blob.extend_from_slice(string.as_bytes());
			blob.push(0);
			entries.push(StringMapEntry {
				offset,
				len: string.len() as u32,
				hash: hash_str(string),
				num: *num,
			});
		}

		let size = table_size(len);
		let mask = (size - 1) as u32;
		let mut slots = vec![EMPTY_SLOT; size];
		let mut collisions = ProbeHistogram::default();
		for (idx, entry) in entries.iter().enumerate() {
			let mut level = 0;
			let mut h = entry.hash;
			while slots[(h & mask) as usize] != EMPTY_SLOT {
				h = h.wrapping_add(PRIME_STEP);
				level += 1;
			}
			collisions.record(level);
			slots[(h & mask) as usize] = idx as u16;
		}

		tracing::debug!(
			strings = len,
			hash_size = size,
			max_chain = collisions.max_level(),
			"baked string map"
		);
		tracing::debug!("probe chains: {collisions}");

		Ok(StringMap {
			strings: blob.into_boxed_slice(),
			entries: entries.into_boxed_slice(),
			slots: slots.into_boxed_slice(),
			collisions,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMapEntry {
	/// Byte offset of the string in the blob.
	pub offset: u32,
	pub len: u32,
	pub hash: u32,
	pub num: u32,
}

/// Count of strings by probe-chain length at insertion time.
///
/// Diagnostic only; nothing reads it to make decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeHistogram {
	counts: [u32; HISTOGRAM_BUCKETS],
}

impl ProbeHistogram {
	fn record(&mut self, level: usize) {
		self.counts[level.min(HISTOGRAM_BUCKETS - 1)] += 1;
	}

	pub fn counts(&self) -> &[u32; HISTOGRAM_BUCKETS] {
		&self.counts
	}

	pub fn total(&self) -> u32 {
		self.counts.iter().sum()
	}

	/// Strings that did not land in their home slot.
	pub fn collided(&self) -> u32 {
		self.total() - self.counts[0]
	}

	/// Longest recorded bucket (9 stands for "9 or more").
	pub fn max_level(&self) -> usize {
		self.counts.iter().rposition(|c| *c > 0).unwrap_or(0)
	}
}

impl fmt::Display for ProbeHistogram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (level, count) in self.counts.iter().enumerate() {
			if level > 0 {
				f.write_str(" ")?;
			}
			let plus = if level == HISTOGRAM_BUCKETS - 1 { "+" } else { "" };
			write!(f, "{level}{plus}:{count}")?;
		}
		Ok(())
	}
}

/// Result of a lookup with its probe count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
	pub num: Option<u32>,
	pub probes: usize,
}

/// Baked, immutable string map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMap {
	strings: Box<[u8]>,
	entries: Box<[StringMapEntry]>,
	slots: Box<[u16]>,
	collisions: ProbeHistogram,
}

impl StringMap {
	/// Returns the number mapped to `s`, or `None` if it was never added.
	#[inline]
	pub fn lookup(&self, s: &str) -> Option<u32> {
		self.probe(s).num
	}

	/// Looks up `s`, also reporting how many slots were inspected.
	///
	/// Never inspects more than [`StringMap::hash_size`] slots.
	pub fn probe(&self, s: &str) -> Probe {
		let hash = hash_str(s);
		let mask = self.hash_mask();
		let mut h = hash;
		for probes in 1..=self.slots.len() {
			let idx = self.slots[(h & mask) as usize];
			if idx == EMPTY_SLOT {
				return Probe { num: None, probes };
			}
			if let Some(entry) = self.entries.get(usize::from(idx))
				&& entry.hash == hash
				&& self.entry_bytes(entry) == Some(s.as_bytes())
			{
				return Probe {
					num: Some(entry.num),
					probes,
				};
			}
			h = h.wrapping_add(PRIME_STEP);
		}
		Probe {
			num: None,
			probes: self.slots.len(),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn hash_size(&self) -> usize {
		self.slots.len()
	}

	pub fn hash_mask(&self) -> u32 {
		self.slots.len().saturating_sub(1) as u32
	}

	/// Occupied slots over table size.
	pub fn load_factor(&self) -> f64 {
		self.entries.len() as f64 / self.slots.len() as f64
	}

	pub fn collisions(&self) -> &ProbeHistogram {
		&self.collisions
	}

	/// Entries in blob (ascending string) order.
	pub fn entries(&self) -> &[StringMapEntry] {
		&self.entries
	}

	pub fn slots(&self) -> &[u16] {
		&self.slots
	}

	/// The NUL-separated string blob.
	pub fn blob(&self) -> &[u8] {
		&self.strings
	}

	pub fn entry_str(&self, entry: &StringMapEntry) -> Option<&str> {
		std::str::from_utf8(self.entry_bytes(entry)?).ok()
	}

	/// `(string, num)` pairs in ascending string order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
		self.entries
			.iter()
			.filter_map(|e| Some((self.entry_str(e)?, e.num)))
	}

	fn entry_bytes(&self, entry: &StringMapEntry) -> Option<&[u8]> {
		let start = entry.offset as usize;
		self.strings.get(start..start + entry.len as usize)
	}
}
