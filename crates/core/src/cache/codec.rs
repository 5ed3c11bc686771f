//! Envelope codec
//!
//! Every stored blob is an envelope:
//!
//! ```text
//! +----------------+----------------------+-----------------+
//! | u32 BE length  | JSON EntryMetadata   | payload bytes   |
//! +----------------+----------------------+-----------------+
//! ```
//!
//! The header can be decoded without copying the payload, which is what
//! eviction and the sweeps need.

use tidepool_domain::constants::{ENVELOPE_LENGTH_PREFIX_BYTES, MAX_ENVELOPE_HEADER_BYTES};
use tidepool_domain::{EntryMetadata, StoreError};

/// Encode `metadata` and `payload` into one envelope
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the header cannot be serialized or
/// exceeds the header size limit.
pub fn encode(key: &str, metadata: &EntryMetadata, payload: &[u8]) -> Result<Vec<u8>, StoreError> {
    let header = serde_json::to_vec(metadata).map_err(|e| corrupt(key, e.to_string()))?;
    if header.len() > MAX_ENVELOPE_HEADER_BYTES {
        return Err(corrupt(key, format!("header of {} bytes exceeds limit", header.len())));
    }

    let header_len = u32::try_from(header.len()).map_err(|e| corrupt(key, e.to_string()))?;
    let mut out = Vec::with_capacity(ENVELOPE_LENGTH_PREFIX_BYTES + header.len() + payload.len());
    out.extend_from_slice(&header_len.to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Decode a full envelope into its metadata and payload
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the bytes are not a valid envelope.
pub fn decode(key: &str, bytes: &[u8]) -> Result<(EntryMetadata, Vec<u8>), StoreError> {
    let (metadata, body_start) = split_header(key, bytes)?;
    Ok((metadata, bytes[body_start..].to_vec()))
}

/// Decode only the metadata of an envelope
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the bytes are not a valid envelope.
pub fn decode_metadata(key: &str, bytes: &[u8]) -> Result<EntryMetadata, StoreError> {
    split_header(key, bytes).map(|(metadata, _)| metadata)
}

fn split_header(key: &str, bytes: &[u8]) -> Result<(EntryMetadata, usize), StoreError> {
    let prefix: [u8; ENVELOPE_LENGTH_PREFIX_BYTES] = bytes
        .get(..ENVELOPE_LENGTH_PREFIX_BYTES)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| corrupt(key, "envelope shorter than length prefix"))?;

    let header_len = u32::from_be_bytes(prefix) as usize;
    if header_len > MAX_ENVELOPE_HEADER_BYTES {
        return Err(corrupt(key, format!("header length {header_len} exceeds limit")));
    }

    let body_start = ENVELOPE_LENGTH_PREFIX_BYTES + header_len;
    let header = bytes
        .get(ENVELOPE_LENGTH_PREFIX_BYTES..body_start)
        .ok_or_else(|| corrupt(key, "truncated header"))?;

    let metadata = serde_json::from_slice(header).map_err(|e| corrupt(key, e.to_string()))?;
    Ok((metadata, body_start))
}

fn corrupt(key: &str, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt { key: key.to_string(), message: message.into() }
}
