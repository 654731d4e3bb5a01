use asmx_core_types::{ComponentId, ProxyId};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::ops::Session;

/// What a render request is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderTarget {
    Component(ComponentId),
    Content(ProxyId),
}

/// Rendering layer the session forwards requests to
///
/// The session checks that the target exists and otherwise does not
/// interpret the request.
pub trait RenderBridge {
    fn highlight(&mut self, target: RenderTarget, on: bool);

    fn hide(&mut self, target: RenderTarget, hidden: bool);
}

fn check_target(session: &Session, target: RenderTarget) -> Result<()> {
    match target {
        RenderTarget::Component(id) => session.component(id).map(|_| ()),
        RenderTarget::Content(id) => session.proxy(id).map(|_| ()),
    }
}

/// Forward a highlight request
///
/// Returns false when no bridge is attached.
///
/// # Errors
/// * `ComponentNotFound` / `ProxyNotFound` - Unknown target
pub fn request_highlight(session: &mut Session, target: RenderTarget, on: bool) -> Result<bool> {
    check_target(session, target)?;
    match session.render.as_mut() {
        Some(bridge) => {
            bridge.highlight(target, on);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Forward a display-hide request
///
/// This is a renderer-side toggle, separate from the recorded `Hide`
/// property.
///
/// # Errors
/// * `ComponentNotFound` / `ProxyNotFound` - Unknown target
pub fn request_hide(session: &mut Session, target: RenderTarget, hidden: bool) -> Result<bool> {
    check_target(session, target)?;
    match session.render.as_mut() {
        Some(bridge) => {
            bridge.hide(target, hidden);
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AsmError;
    use crate::model::CustomerInfo;
    use crate::ops::component_ops::resolve_component;
    use crate::ops::container_ops::create_container;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording(Rc<RefCell<Vec<(RenderTarget, bool)>>>);

    impl RenderBridge for Recording {
        fn highlight(&mut self, target: RenderTarget, on: bool) {
            self.0.borrow_mut().push((target, on));
        }

        fn hide(&mut self, _target: RenderTarget, _hidden: bool) {}
    }

    #[test]
    fn test_requests_are_forwarded_verbatim() {
        let mut session = Session::new();
        let part = create_container(&mut session, CustomerInfo::new("part")).unwrap();
        let c = resolve_component(&mut session, part.id(), &[]).unwrap();

        let target = RenderTarget::Component(c.id());
        assert!(!request_highlight(&mut session, target, true).unwrap());

        let seen = Rc::new(RefCell::new(Vec::new()));
        session.set_render_bridge(Box::new(Recording(seen.clone())));
        assert!(request_highlight(&mut session, target, true).unwrap());
        assert_eq!(*seen.borrow(), vec![(target, true)]);
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut session = Session::new();
        let err = request_hide(&mut session, RenderTarget::Content(ProxyId::from_raw(4)), true)
            .unwrap_err();
        assert!(matches!(err, AsmError::ProxyNotFound { .. }));
    }
}
