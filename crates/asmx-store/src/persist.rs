//! Save and restore entry points
//!
//! Saving names only the roots; every container reachable from them
//! through reference edges is written too. Restore hands back one handle
//! per saved root.

use std::path::Path;
use std::time::Instant;

use asmx_core::errors::ExError;
use asmx_core::factory::FactoryRegistry;
use asmx_core::snapshot::{export_document, import_document};
use asmx_core::{log_op_end, log_op_error, log_op_start, ContainerHandle, Session};
use asmx_core_types::ContainerId;

use crate::atomic::atomic_write;
use crate::codec::{self, SaveOptions};
use crate::errors::{io_error, Result};

/// Serialize `roots` and everything they reach
///
/// ## Errors
///
/// - `ExErrorKind::NotFound` / `StaleContainer`: a root is not live
/// - `ExErrorKind::Serialization`: encoding failed
pub fn save(session: &Session, roots: &[ContainerId], options: SaveOptions) -> Result<Vec<u8>> {
    let start = Instant::now();
    log_op_start!("save", roots = roots.len(), format = ?options.format);

    let result = export_document(session, roots, options.include_history)
        .map_err(|e| ExError::from(e).with_op("save"))
        .and_then(|doc| {
            let containers = doc.containers.len();
            codec::encode(&doc, options.format).map(|bytes| (containers, bytes))
        });
    match result {
        Ok((containers, bytes)) => {
            log_op_end!("save", start, containers = containers, size_bytes = bytes.len());
            Ok(bytes)
        }
        Err(err) => {
            log_op_error!("save", start, err.clone());
            Err(err)
        }
    }
}

/// Rebuild saved containers inside `session`
///
/// The format is detected from the leading bytes.
///
/// ## Errors
///
/// - `ExErrorKind::Persistence`: digest mismatch, truncated or inconsistent
///   document
/// - `ExErrorKind::Serialization`: payload is not a document
/// - `ExErrorKind::FactoryMissing`: nothing registered in `registry`
pub fn restore(
    session: &mut Session,
    bytes: &[u8],
    registry: &FactoryRegistry,
) -> Result<Vec<ContainerHandle>> {
    let start = Instant::now();
    log_op_start!("restore", size_bytes = bytes.len());

    let result = codec::decode(bytes).and_then(|doc| {
        import_document(session, &doc, registry).map_err(|e| ExError::from(e).with_op("restore"))
    });
    match &result {
        Ok(roots) => {
            log_op_end!("restore", start, roots = roots.len());
        }
        Err(err) => {
            log_op_error!("restore", start, err.clone());
        }
    }
    result
}

/// `save` followed by an atomic write to `path`
pub fn save_to_path(
    session: &Session,
    roots: &[ContainerId],
    options: SaveOptions,
    path: &Path,
) -> Result<()> {
    let bytes = save(session, roots, options)?;
    atomic_write(path, &bytes)?;
    tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "document written");
    Ok(())
}

/// Read `path` and `restore` it
pub fn restore_from_path(
    session: &mut Session,
    path: &Path,
    registry: &FactoryRegistry,
) -> Result<Vec<ContainerHandle>> {
    let bytes = std::fs::read(path).map_err(|e| io_error("read_save_file", e))?;
    restore(session, &bytes, registry)
}
