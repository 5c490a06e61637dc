//! # mocap - skeleton motion capture to BVH
//!
//! Records full-body poses pushed by a skeleton-tracking sensor and writes
//! them out as a BVH document. Provides:
//! - A recording state machine that locks onto one tracked body
//! - Owned pose snapshots, decoupled from the sensor's frame buffer
//! - A BVH writer over a fixed 20-joint skeleton
//! - A background recorder thread plus a C FFI for native sensor drivers
//!
//! ## Quick Start
//! ```no_run
//! use mocap::{BodyFrame, Recorder, RecorderConfig};
//!
//! let recorder = Recorder::start(RecorderConfig::default()).unwrap();
//! let sensor = recorder.sender();
//!
//! recorder.toggle_recording();
//! // From the sensor callback:
//! sensor.push(BodyFrame::default()).unwrap();
//! recorder.toggle_recording();
//!
//! recorder.export_to_path("take.bvh").unwrap();
//! ```

pub mod error;
pub mod types;
pub mod skeleton;
pub mod rotation;
pub mod pose;
pub mod session;
pub mod bvh;
pub mod config;
pub mod recorder;
pub mod ffi;

pub use error::MocapError;
pub use types::*;
pub use pose::Pose;
pub use rotation::{quaternion_to_euler, EulerAngles};
pub use session::{
    FrameOutcome, RecordingSession, RecordingState, SessionStatus, SharedSession, TrackingPolicy,
};
pub use config::{ExportConfig, RecorderConfig};
pub use recorder::{FrameSender, Recorder};

/// Result type alias for mocap operations.
pub type Result<T> = std::result::Result<T, MocapError>;
