//! Application Layer
//!
//! Wires the screening pipeline to its two entry points:
//! - `ScanScheduler`: unattended polling with held-position checks
//! - `ScanService`: on-demand scans ranked by an external service

pub mod alert_dispatcher;
pub mod payload;
pub mod position_monitor;
pub mod scan_service;
pub mod scheduler;

pub use alert_dispatcher::AlertDispatcher;
pub use payload::build_payload;
pub use position_monitor::{HeldPositionMonitor, PositionCheck, DEFAULT_GAP_THRESHOLD};
pub use scan_service::{
    acknowledgement, render_reply, render_summary, ScanError, ScanOutcome, ScanParams,
    ScanService, MAX_NUM_SCANS,
};
pub use scheduler::{ActiveWindow, CycleReport, ScanScheduler, ScheduleSettings};
