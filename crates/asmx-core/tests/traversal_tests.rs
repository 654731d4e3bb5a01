mod common;

use approx::assert_relative_eq;
use asmx_core::ops::{component_ops, in_context, property_ops, Session};
use asmx_core::render::{request_highlight, scene_description, RenderBridge, RenderTarget};
use asmx_core::traversal::{get_components, ComponentRequest};
use common::linkage;
use std::cell::RefCell;
use std::rc::Rc;

fn paths(session: &Session, handles: &[asmx_core::ComponentHandle]) -> Vec<usize> {
    handles
        .iter()
        .map(|h| component_ops::component_path(session, h.id()).unwrap().len())
        .collect()
}

#[test]
fn test_requests_select_by_depth_and_kind() {
    // GIVEN the linkage top component
    let mut session = Session::new();
    let l = linkage(&mut session);
    let top = component_ops::resolve_component(&mut session, l.top.id(), &[]).unwrap();

    // WHEN each request kind is walked
    let immediate = get_components(&mut session, top.id(), ComponentRequest::Immediate, false).unwrap();
    let sub = get_components(&mut session, top.id(), ComponentRequest::Sub, false).unwrap();
    let all = get_components(&mut session, top.id(), ComponentRequest::All, false).unwrap();
    let leaf = get_components(&mut session, top.id(), ComponentRequest::Leaf, false).unwrap();

    // THEN depth-first preorder in sibling order is preserved
    assert_eq!(paths(&session, &immediate), vec![1, 1]);
    assert_eq!(paths(&session, &sub), vec![1, 2, 1, 2]);
    assert_eq!(paths(&session, &all), vec![0, 1, 2, 1, 2]);
    assert_eq!(paths(&session, &leaf), vec![2, 2]);
    assert_eq!(all[0], top);
    let first_leaf = component_ops::component_path(&session, leaf[0].id()).unwrap();
    assert_eq!(first_leaf.edges, vec![l.left, l.pin_edge]);
}

#[test]
fn test_leaf_walk_from_part_returns_itself() {
    let mut session = Session::new();
    let l = linkage(&mut session);
    let pin = component_ops::resolve_component(&mut session, l.pin.id(), &[]).unwrap();

    let leaf = get_components(&mut session, pin.id(), ComponentRequest::Leaf, false).unwrap();

    assert_eq!(leaf, vec![pin]);
}

#[test]
fn test_scene_carries_resolved_state() {
    // GIVEN the right sub-assembly hidden
    let mut session = Session::new();
    let l = linkage(&mut session);
    let right = component_ops::resolve_component(&mut session, l.top.id(), &[l.right]).unwrap();
    in_context(&mut session, l.top.id(), |s| property_ops::hide(s, right.id())).unwrap();

    // WHEN the scene is described
    let scene = scene_description(&mut session, l.top.id(), false).unwrap();

    // THEN every node carries its placement and the hidden branch is flagged
    assert_eq!(scene.len(), 5);
    let right_pin = &scene[4];
    assert_eq!(right_pin.end_container, l.pin.id());
    assert!(right_pin.hidden);
    assert!(!scene[2].hidden);
    let origin = right_pin.transform.transform_point(&nalgebra::Point3::origin());
    assert_relative_eq!(origin, nalgebra::Point3::new(20.0, 0.0, 5.0), epsilon = 1e-12);
}

#[derive(Default)]
struct Recorder {
    highlights: Rc<RefCell<Vec<(RenderTarget, bool)>>>,
}

impl RenderBridge for Recorder {
    fn highlight(&mut self, target: RenderTarget, on: bool) {
        self.highlights.borrow_mut().push((target, on));
    }

    fn hide(&mut self, _target: RenderTarget, _hidden: bool) {}
}

#[test]
fn test_highlight_is_forwarded_untouched() {
    let mut session = Session::new();
    let l = linkage(&mut session);
    let top = component_ops::resolve_component(&mut session, l.top.id(), &[]).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    session.set_render_bridge(Box::new(Recorder {
        highlights: Rc::clone(&seen),
    }));

    let forwarded = request_highlight(&mut session, RenderTarget::Component(top.id()), true).unwrap();

    assert!(forwarded);
    assert_eq!(*seen.borrow(), vec![(RenderTarget::Component(top.id()), true)]);
}
