//! Boundary logging macros
//!
//! A boundary operation emits exactly one `start` and then either one `end`
//! or one `end_error`. The closing macros take the `Instant` captured
//! before the operation ran and derive `duration_ms` from it.

/// Log the start of a boundary operation
///
/// # Example
///
/// ```
/// # use asmx_core::log_op_start;
/// log_op_start!("cleanup");
/// log_op_start!("add_reference", container_id = 3u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::asmx_core_types::schema::EVENT_START,
            $($($field)*)?
        );
    };
}

/// Log the successful end of a boundary operation
///
/// # Example
///
/// ```
/// # use asmx_core::log_op_end;
/// let started = std::time::Instant::now();
/// log_op_end!("cleanup", started, containers_deleted = 2u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, $started:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::asmx_core_types::schema::EVENT_END,
            duration_ms = $started.elapsed().as_millis() as u64,
            $($($field)*)?
        );
    };
}

/// Log the failed end of a boundary operation
///
/// `$err` is anything convertible into `ExError`. The container and
/// component the error names are recorded as `err_container_id` and
/// `err_component_id` when present.
///
/// # Example
///
/// ```
/// # use asmx_core::{log_op_error, errors::AsmError};
/// # use asmx_core::asmx_core_types::ContainerId;
/// let started = std::time::Instant::now();
/// let err = AsmError::NotAnAssembly { container_id: ContainerId::from_raw(4) };
/// log_op_error!("add_reference", started, err);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $started:expr, $err:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::asmx_core_types::schema::EVENT_END_ERROR,
            duration_ms = $started.elapsed().as_millis() as u64,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_container_id = ex_err.container_id().map(|c| c.raw()),
            err_component_id = ex_err.component_id().map(|c| c.raw()),
            $($($field)*)?
        );
    }};
}
