//! In-memory capture of boundary events for tests
//!
//! Events are decoded into the fields boundary operations emit, so tests can
//! ask what happened to one container or component without string matching.
//! The capture is process-wide; tests running in parallel see each other's
//! events and should filter by container id or a unique op name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use asmx_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, FIELD_COMPONENT_ID, FIELD_CONTAINER_ID, FIELD_DURATION_MS,
    FIELD_ERR_CODE, FIELD_ERR_COMPONENT_ID, FIELD_ERR_CONTAINER_ID, FIELD_EVENT, FIELD_OP,
};
use asmx_core_types::{ComponentId, ContainerId};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One decoded event
#[derive(Clone, Debug, Default)]
pub struct CapturedEvent {
    pub op: Option<String>,
    pub event: Option<String>,
    /// Subject container, or the container named by the error
    pub container_id: Option<u64>,
    /// Subject component, or the component named by the error
    pub component_id: Option<u64>,
    pub duration_ms: Option<u64>,
    pub err_code: Option<String>,
    /// Every other field, debug-formatted
    pub extra: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn is_boundary_close(&self) -> bool {
        matches!(self.event.as_deref(), Some(EVENT_END) | Some(EVENT_END_ERROR))
    }

    pub fn concerns_container(&self, container: ContainerId) -> bool {
        self.container_id == Some(container.raw())
    }

    pub fn concerns_component(&self, component: ComponentId) -> bool {
        self.component_id == Some(component.raw())
    }
}

impl Visit for CapturedEvent {
    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            FIELD_CONTAINER_ID | FIELD_ERR_CONTAINER_ID => self.container_id = Some(value),
            FIELD_COMPONENT_ID | FIELD_ERR_COMPONENT_ID => self.component_id = Some(value),
            FIELD_DURATION_MS => self.duration_ms = Some(value),
            other => {
                self.extra.insert(other.to_string(), value.to_string());
            }
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            FIELD_OP => &mut self.op,
            FIELD_EVENT => &mut self.event,
            FIELD_ERR_CODE => &mut self.err_code,
            other => {
                self.extra.insert(other.to_string(), value.to_string());
                return;
            }
        };
        *slot = Some(value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.extra
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

type Shared = Arc<Mutex<Vec<CapturedEvent>>>;

struct CaptureLayer {
    events: Shared,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut captured = CapturedEvent::default();
        event.record(&mut captured);
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Read side of the capture
#[derive(Clone)]
pub struct TestCapture {
    events: Shared,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events with this op name, in emission order
    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.op.as_deref() == Some(op))
    }

    /// Events naming `container`, in emission order
    pub fn events_for_container(&self, container: ContainerId) -> Vec<CapturedEvent> {
        self.filtered(|e| e.concerns_container(container))
    }

    /// Events naming `component`, in emission order
    pub fn events_for_component(&self, component: ComponentId) -> Vec<CapturedEvent> {
        self.filtered(|e| e.concerns_component(component))
    }

    /// `(op, event)` pairs of the boundaries run on `container`
    pub fn boundary_trail(&self, container: ContainerId) -> Vec<(String, String)> {
        self.events_for_container(container)
            .into_iter()
            .filter_map(|e| Some((e.op?, e.event?)))
            .collect()
    }

    /// Error code of the last failed `op`, if any
    pub fn last_error_code(&self, op: &str) -> Option<String> {
        self.events_for_op(op)
            .into_iter()
            .rev()
            .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
            .and_then(|e| e.err_code)
    }

    fn filtered(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| keep(e)).collect()
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture as the global subscriber on first use
///
/// # Example
///
/// ```
/// use asmx_core::logging_facility::test_capture::init_test_capture;
/// use asmx_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_capture_op", container_id = 11u64);
/// assert_eq!(capture.events_for_op("doc_capture_op")[0].container_id, Some(11));
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let events = Shared::default();
            let layer = CaptureLayer {
                events: events.clone(),
            };
            tracing_subscriber::registry().with(layer).try_init().ok();
            TestCapture { events }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_fills_subject_ids() {
        let mut event = CapturedEvent {
            event: Some(EVENT_END_ERROR.to_string()),
            container_id: Some(4),
            ..CapturedEvent::default()
        };
        assert!(event.is_boundary_close());
        assert!(event.concerns_container(ContainerId::from_raw(4)));
        assert!(!event.concerns_component(ComponentId::from_raw(4)));

        event.event = Some("start".to_string());
        assert!(!event.is_boundary_close());
    }
}
