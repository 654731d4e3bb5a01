//! Session document export and import
//!
//! ## Responsibilities
//!
//! - Capture the containers reachable from a set of roots as a
//!   `SessionDocument`, writing each shared log once
//! - Rebuild a document inside a session with fresh identifiers
//!
//! ## Non-Responsibilities
//!
//! - Byte encodings, digests and files (handled by `asmx-store`)

pub mod document;
pub mod export;
pub mod import;

pub use document::{ContainerEntry, EdgeEntry, LogSegment, SessionDocument, FORMAT_VERSION};
pub use export::export_document;
pub use import::import_document;
