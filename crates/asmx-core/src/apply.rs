//! Functional-boundary apply function
//!
//! `apply()` runs one command inside a bracket on the target container:
//!
//! - the container's log is activated for the duration of the command;
//! - every command validates before it mutates, so a failed command leaves
//!   edge lists, owner records, memo tables and use counts untouched;
//! - the bracket reports the severity the command noted to the container's
//!   manager when it closes.
//!
//! ## Example
//!
//! ```
//! use asmx_core::apply::apply;
//! use asmx_core::commands::{Command, CommandOutcome};
//! use asmx_core::model::CustomerInfo;
//! use asmx_core::ops::{container_ops, Session};
//!
//! let mut session = Session::new();
//! let part = container_ops::create_container(&mut session, CustomerInfo::new("part")).unwrap();
//! let outcome = apply(
//!     &mut session,
//!     part.id(),
//!     Command::CreateContent { kind: "body".to_string(), owner: None },
//! )
//! .unwrap();
//! assert!(matches!(outcome, CommandOutcome::ContentCreated(_)));
//! ```

use std::time::Instant;

use asmx_core_types::ContainerId;

use crate::commands::{Command, CommandOutcome};
use crate::errors::Result;
use crate::model::PropertyValue;
use crate::ops::{container_ops, in_context, property_ops, reference_ops, Session};
use crate::{log_op_end, log_op_error, log_op_start};

/// Apply a command in `container`'s context
///
/// # Errors
///
/// Whatever the underlying operation reports; see `AsmError`.
pub fn apply(session: &mut Session, container: ContainerId, cmd: Command) -> Result<CommandOutcome> {
    let op = cmd.op_name();
    let start = Instant::now();
    log_op_start!(op, container_id = container.raw());

    let result = in_context(session, container, |s| execute(s, container, cmd));
    match &result {
        Ok(_) => {
            log_op_end!(op, start, container_id = container.raw());
        }
        Err(err) => {
            log_op_error!(op, start, err.clone(), container_id = container.raw());
        }
    }
    result
}

fn execute(session: &mut Session, container: ContainerId, cmd: Command) -> Result<CommandOutcome> {
    match cmd {
        Command::CreateContent { kind, owner } => {
            container_ops::create_content(session, container, &kind, owner)
                .map(CommandOutcome::ContentCreated)
        }

        Command::DeleteContent { content } => {
            container_ops::delete_content(session, container, content)
                .map(CommandOutcome::ContentDeleted)
        }

        Command::CreateCompositeRoot => container_ops::create_composite_root(session, container)
            .map(CommandOutcome::CompositeRootCreated),

        Command::AddReference {
            target,
            transform,
            pushback,
        } => reference_ops::add_reference(session, container, target, &transform, pushback)
            .map(CommandOutcome::ReferenceAdded),

        Command::RemoveReference { edge } => {
            reference_ops::remove_reference(session, edge)?;
            Ok(CommandOutcome::ReferenceRemoved(edge))
        }

        Command::SetProperty { component, value } => {
            property_ops::set_property(session, component, container, value)
                .map(CommandOutcome::PropertySet)
        }

        Command::RemoveProperty { property } => {
            property_ops::remove_property(session, property)?;
            Ok(CommandOutcome::PropertyRemoved(property))
        }

        Command::Suppress { component } => {
            property_ops::set_property(session, component, container, PropertyValue::Suppress(true))
                .map(CommandOutcome::PropertySet)
        }

        Command::Unsuppress { component } => property_ops::set_property(
            session,
            component,
            container,
            PropertyValue::Suppress(false),
        )
        .map(CommandOutcome::PropertySet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AsmError;
    use crate::manager::ChangeSeverity;
    use crate::model::CustomerInfo;
    use nalgebra::Matrix4;

    #[test]
    fn test_apply_brackets_and_reports_severity() {
        let mut session = Session::new();
        let asm = container_ops::create_container(&mut session, CustomerInfo::new("asm")).unwrap();

        apply(&mut session, asm.id(), Command::CreateCompositeRoot).unwrap();
        assert_eq!(session.context_depth(), 0);
        assert_eq!(
            session.manager(asm.id()).unwrap().last_severity(),
            Some(ChangeSeverity::Geometric)
        );
    }

    #[test]
    fn test_failed_command_leaves_edges_untouched() {
        let mut session = Session::new();
        let asm = container_ops::create_container(&mut session, CustomerInfo::new("asm")).unwrap();
        let part = container_ops::create_container(&mut session, CustomerInfo::new("part")).unwrap();
        apply(&mut session, asm.id(), Command::CreateCompositeRoot).unwrap();

        let mut skewed = Matrix4::identity();
        skewed[(0, 1)] = 0.5;
        let err = apply(
            &mut session,
            asm.id(),
            Command::AddReference {
                target: part.id(),
                transform: skewed,
                pushback: true,
            },
        )
        .unwrap_err();

        assert!(matches!(err, AsmError::InvalidTransform { .. }));
        assert!(reference_ops::edges_of(&session, asm.id()).unwrap().is_empty());
        assert_eq!(part.use_count(), 1);
    }
}
