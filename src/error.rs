use crate::types::JointType;
use std::fmt;

/// Errors that can occur while recording or exporting motion data.
#[derive(Debug, thiserror::Error)]
pub enum MocapError {
    #[error("Body is missing joint data for {0:?}")]
    MissingJoint(JointType),

    #[error("Invalid tracking state tag: {0}")]
    InvalidTrackingState(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recorder thread failed to start: {0}")]
    Spawn(String),

    #[error("Recorder stopped")]
    RecorderStopped,

    #[error("Channel disconnected")]
    ChannelDisconnected,
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &MocapError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut msg) = self.message.lock() {
            msg.clear();
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
