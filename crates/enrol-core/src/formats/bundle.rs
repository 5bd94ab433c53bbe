//! # Document Bundle Format
//!
//! Binary serialization for the document bundle kept in the blob store.
//!
//! Format: Header (5 bytes) + postcard-serialized bundle.
//! - 4 bytes: Magic ("ENRB")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, so a
//! corrupted record is rejected without allocating for it.

use crate::{DocumentBundle, EnrolError, primitives};

/// Magic followed by the version byte.
const HEADER_SIZE: usize = 5;

fn header() -> [u8; HEADER_SIZE] {
    let [a, b, c, d] = *primitives::BUNDLE_MAGIC;
    [a, b, c, d, primitives::BUNDLE_FORMAT_VERSION]
}

/// Check the header and return the payload after it.
fn split_header(bytes: &[u8]) -> Result<&[u8], EnrolError> {
    let (magic, rest) = bytes
        .split_first_chunk::<4>()
        .ok_or_else(|| EnrolError::DeserializationError("Bundle header too short".to_string()))?;
    let (&version, payload) = rest
        .split_first()
        .ok_or_else(|| EnrolError::DeserializationError("Bundle header too short".to_string()))?;

    if magic != primitives::BUNDLE_MAGIC {
        return Err(EnrolError::DeserializationError(
            "Invalid bundle magic bytes".to_string(),
        ));
    }
    if version != primitives::BUNDLE_FORMAT_VERSION {
        return Err(EnrolError::DeserializationError(format!(
            "Unsupported bundle version: {} (expected {})",
            version,
            primitives::BUNDLE_FORMAT_VERSION
        )));
    }
    Ok(payload)
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Encode a bundle (header + payload).
pub fn bundle_to_bytes(bundle: &DocumentBundle) -> Result<Vec<u8>, EnrolError> {
    let payload = postcard::to_stdvec(bundle)
        .map_err(|e| EnrolError::SerializationError(e.to_string()))?;

    if payload.len() + HEADER_SIZE > primitives::MAX_BUNDLE_SIZE {
        return Err(EnrolError::SerializationError(format!(
            "Bundle of {} bytes exceeds maximum {} bytes",
            payload.len() + HEADER_SIZE,
            primitives::MAX_BUNDLE_SIZE
        )));
    }

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a bundle, validating size and header first.
pub fn bundle_from_bytes(bytes: &[u8]) -> Result<DocumentBundle, EnrolError> {
    if bytes.len() > primitives::MAX_BUNDLE_SIZE {
        return Err(EnrolError::DeserializationError(format!(
            "Bundle of {} bytes exceeds maximum {} bytes",
            bytes.len(),
            primitives::MAX_BUNDLE_SIZE
        )));
    }

    let payload = split_header(bytes)?;
    postcard::from_bytes(payload)
        .map_err(|e| EnrolError::DeserializationError(format!("Failed to decode bundle: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================
