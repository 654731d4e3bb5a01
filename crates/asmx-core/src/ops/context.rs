//! Nested activate / deactivate protocol
//!
//! Exactly one log is active at a time: the log of the innermost frame.
//! Mutating operations check it through `Session::require_active`.

use asmx_core_types::ContainerId;

use super::session::{ContextFrame, Session};
use crate::errors::{AsmError, Result};
use crate::lifecycle::sweep::reap_armed;
use crate::manager::ChangeSeverity;

/// Proof of one open bracket; release in LIFO order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationToken {
    token: u64,
    container: ContainerId,
}

impl ActivationToken {
    pub fn container(&self) -> ContainerId {
        self.container
    }
}

/// Make `container`'s log the active one
///
/// # Errors
/// * `ContainerNotFound` / `StaleContainer` - Unknown or swept container
pub fn nested_activate(session: &mut Session, container: ContainerId) -> Result<ActivationToken> {
    reap_armed(session);
    let log = session.container(container)?.manager.log;
    let token = session.next_token();
    session.context.push(ContextFrame {
        token,
        container,
        log,
        severity: ChangeSeverity::NoChange,
    });
    tracing::debug!(container_id = container.raw(), token, "context activated");
    Ok(ActivationToken { token, container })
}

/// Close the innermost bracket
///
/// Commits the log's open transaction when no outer frame still uses the
/// same log, then reports the combined severity (the caller's plus whatever
/// the operations inside the bracket noted) to the container's manager.
///
/// # Errors
/// * `NotInContext` - `token` is not the innermost frame
pub fn nested_deactivate(
    session: &mut Session,
    token: ActivationToken,
    severity: ChangeSeverity,
) -> Result<ChangeSeverity> {
    match session.context.last() {
        Some(frame) if frame.token == token.token => {}
        _ => return Err(AsmError::NotInContext { token: token.token }),
    }
    let frame = session
        .context
        .pop()
        .ok_or(AsmError::NotInContext { token: token.token })?;
    let reported = frame.severity.max(severity);

    let still_open = session.context.iter().any(|f| f.log == frame.log);
    if !still_open {
        if let Some(log) = session.logs.get_mut(&frame.log) {
            log.note_state();
        }
    }
    if let Some(record) = session.containers.get_mut(&frame.container) {
        record.manager.notify(reported);
    }
    tracing::debug!(
        container_id = frame.container.raw(),
        token = frame.token,
        severity = ?reported,
        "context deactivated"
    );

    reap_armed(session);
    Ok(reported)
}

/// Run `f` inside a bracket on `container`
///
/// The bracket is closed whether `f` succeeds or fails; the severity
/// reported is whatever the operations inside noted.
pub fn in_context<T>(
    session: &mut Session,
    container: ContainerId,
    f: impl FnOnce(&mut Session) -> Result<T>,
) -> Result<T> {
    let token = nested_activate(session, container)?;
    let outcome = f(session);
    let closed = nested_deactivate(session, token, ChangeSeverity::NoChange);
    let value = outcome?;
    closed?;
    Ok(value)
}
