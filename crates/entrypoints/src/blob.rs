//! Serialized table blob.
//!
//! Layout: [`MAGIC`], little-endian [`SCHEMA_VERSION`], then the postcard
//! encoding of [`EntrypointTables`].

use std::mem::size_of;

use crate::tables::EntrypointTables;

/// Magic bytes identifying an entry-point table blob.
pub const MAGIC: &[u8; 8] = b"EPGENTBL";

/// Bumped whenever the serialized form of the tables changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Total header size in bytes (magic + version).
pub const HEADER_SIZE: usize = MAGIC.len() + size_of::<u32>();

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
	#[error("blob is {0} bytes, shorter than its header")]
	Truncated(usize),
	#[error("blob does not start with the table magic")]
	BadMagic,
	#[error("blob schema version {found}, expected {SCHEMA_VERSION}")]
	SchemaMismatch { found: u32 },
	#[error("blob payload: {0}")]
	Payload(#[from] postcard::Error),
}

pub fn encode(tables: &EntrypointTables) -> Result<Vec<u8>, BlobError> {
	let payload = postcard::to_stdvec(tables)?;
	let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
	out.extend_from_slice(MAGIC);
	out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
	out.extend_from_slice(&payload);
	Ok(out)
}

/// Checks the header and returns the payload.
pub fn validate(data: &[u8]) -> Result<&[u8], BlobError> {
	if data.len() < HEADER_SIZE {
		return Err(BlobError::Truncated(data.len()));
	}
	let (magic, rest) = data.split_at(MAGIC.len());
	if magic != MAGIC {
		return Err(BlobError::BadMagic);
	}
	let (version, payload) = rest.split_at(size_of::<u32>());
	let mut raw = [0u8; 4];
	raw.copy_from_slice(version);
	let found = u32::from_le_bytes(raw);
	if found != SCHEMA_VERSION {
		return Err(BlobError::SchemaMismatch { found });
	}
	Ok(payload)
}

pub fn decode(data: &[u8]) -> Result<EntrypointTables, BlobError> {
	let payload = validate(data)?;
	Ok(postcard::from_bytes(payload)?)
}
