//! Byte encodings of a session document
//!
//! ## Text
//!
//! Pretty-printed JSON of the `SessionDocument`.
//!
//! ## Binary
//!
//! ```text
//! ASMXBIN1 | sha256(payload) as 64 hex chars | payload (compact JSON)
//! ```
//!
//! The digest is checked before the payload is parsed.

mod digest;

pub use digest::{payload_digest, DIGEST_HEX_LEN};

use asmx_core::snapshot::SessionDocument;
use serde::{Deserialize, Serialize};

use crate::errors::{digest_mismatch, from_serde, malformed, Result};

/// Leading bytes of a binary document
pub const BINARY_MAGIC: &[u8; 8] = b"ASMXBIN1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveFormat {
    #[default]
    Text,
    Binary,
}

/// Options for `save`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    pub format: SaveFormat,
    /// Write committed history states, not just current content
    pub include_history: bool,
}

impl SaveOptions {
    pub fn binary() -> Self {
        Self {
            format: SaveFormat::Binary,
            ..Self::default()
        }
    }

    pub fn with_history(mut self) -> Self {
        self.include_history = true;
        self
    }
}

/// Encode a document in the requested format
pub fn encode(doc: &SessionDocument, format: SaveFormat) -> Result<Vec<u8>> {
    match format {
        SaveFormat::Text => serde_json::to_vec_pretty(doc).map_err(|e| from_serde("encode", e)),
        SaveFormat::Binary => {
            let payload = serde_json::to_vec(doc).map_err(|e| from_serde("encode", e))?;
            let digest = payload_digest(&payload);
            let mut bytes = Vec::with_capacity(BINARY_MAGIC.len() + DIGEST_HEX_LEN + payload.len());
            bytes.extend_from_slice(BINARY_MAGIC);
            bytes.extend_from_slice(digest.as_bytes());
            bytes.extend_from_slice(&payload);
            Ok(bytes)
        }
    }
}

/// Which format `bytes` are in
pub fn detect(bytes: &[u8]) -> SaveFormat {
    if bytes.starts_with(BINARY_MAGIC) {
        SaveFormat::Binary
    } else {
        SaveFormat::Text
    }
}

/// Decode either format, detected from the leading bytes
pub fn decode(bytes: &[u8]) -> Result<SessionDocument> {
    match detect(bytes) {
        SaveFormat::Text => serde_json::from_slice(bytes).map_err(|e| from_serde("decode", e)),
        SaveFormat::Binary => {
            let rest = &bytes[BINARY_MAGIC.len()..];
            if rest.len() < DIGEST_HEX_LEN {
                return Err(malformed("binary document is truncated inside its digest"));
            }
            let (header, payload) = rest.split_at(DIGEST_HEX_LEN);
            let expected = std::str::from_utf8(header)
                .map_err(|_| malformed("binary digest is not ASCII hex"))?;
            let actual = payload_digest(payload);
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(digest_mismatch(expected, &actual));
            }
            serde_json::from_slice(payload).map_err(|e| from_serde("decode", e))
        }
    }
}
