//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Identifiers
pub const FIELD_CONTAINER_ID: &str = "container_id";
pub const FIELD_COMPONENT_ID: &str = "component_id";
pub const FIELD_EDGE_ID: &str = "edge_id";
pub const FIELD_LOG_ID: &str = "log_id";

// Collection sizes
pub const FIELD_PATH_LEN: &str = "path_len";
pub const FIELD_ROOT_COUNT: &str = "root_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_CONTAINER_ID: &str = "err_container_id";
pub const FIELD_ERR_COMPONENT_ID: &str = "err_component_id";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
