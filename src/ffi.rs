//! C FFI layer for mocap.
//!
//! Lets a native sensor driver push frames and issue the record/export
//! commands through an opaque recorder handle.
//! The generated C header is written to `include/mocap.h` by cbindgen.

use crate::config::RecorderConfig;
use crate::error::LastError;
use crate::recorder::Recorder;
use crate::types::{
    Body, BodyFrame, JointSample, JointSet, JointType, Quaternion, TrackingState, Vec3,
    JOINT_COUNT,
};
use crate::{MocapError, Result};
use std::ffi::{c_char, c_int, CStr};
use std::time::Duration;

static LAST_ERROR: LastError = LastError::new();

/// Opaque recorder handle for C consumers.
pub struct McRecorder(Recorder);

/// One joint in C-compatible layout.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct McJoint {
    /// Position [x, y, z] in meters.
    pub position: [f64; 3],
    /// Parent-relative rotation quaternion [x, y, z, w].
    pub rotation: [f64; 4],
}

/// One candidate body in C-compatible layout.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct McBody {
    pub tracking_id: u32,
    /// 0 = not tracked, 1 = position only, 2 = inferred, 3 = tracked.
    pub tracking_state: c_int,
    /// Body center [x, y, z] in meters.
    pub position: [f64; 3],
    /// Bit `i` set when `joints[i]` holds data.
    pub joint_mask: u32,
    /// Indexed by joint enumeration order.
    pub joints: [McJoint; JOINT_COUNT],
}

impl TryFrom<&McBody> for Body {
    type Error = MocapError;

    fn try_from(raw: &McBody) -> Result<Body> {
        let tracking_state = TrackingState::try_from(raw.tracking_state)?;
        let mask = JointSet::from_bits_truncate(raw.joint_mask);
        let joints = JointType::ALL
            .into_iter()
            .filter(|&joint| mask.contains(JointSet::of(joint)))
            .map(|joint| {
                let j = &raw.joints[joint.index()];
                JointSample {
                    joint,
                    position: Vec3::new(j.position[0], j.position[1], j.position[2]),
                    hierarchical_rotation: Quaternion::new(
                        j.rotation[0],
                        j.rotation[1],
                        j.rotation[2],
                        j.rotation[3],
                    ),
                }
            })
            .collect();

        Ok(Body {
            tracking_id: raw.tracking_id,
            tracking_state,
            position: Vec3::new(raw.position[0], raw.position[1], raw.position[2]),
            joints,
        })
    }
}

/// Start a recorder. Settings are read from `MOCAP_*` environment variables.
/// Returns NULL on error (check mc_last_error()).
#[no_mangle]
pub extern "C" fn mc_recorder_new() -> *mut McRecorder {
    match Recorder::start(RecorderConfig::from_env()) {
        Ok(rec) => Box::into_raw(Box::new(McRecorder(rec))),
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Stop a recorder and free its resources.
///
/// # Safety
/// `rec` must be a pointer returned by `mc_recorder_new`, or null.
#[no_mangle]
pub unsafe extern "C" fn mc_recorder_free(rec: *mut McRecorder) {
    if !rec.is_null() {
        drop(Box::from_raw(rec));
    }
}

/// Push one sensor frame. The body array is copied before returning, so the
/// caller may reuse it immediately.
/// Returns 0 if queued, 1 if dropped because the queue is full, -1 on error.
///
/// # Safety
/// `rec` must be a valid recorder pointer. `bodies` must point to `count`
/// `McBody` elements, or be null when `count` is 0.
#[no_mangle]
pub unsafe extern "C" fn mc_push_frame(
    rec: *const McRecorder,
    bodies: *const McBody,
    count: c_int,
    timestamp_us: u64,
) -> c_int {
    if rec.is_null() || count < 0 || (bodies.is_null() && count > 0) {
        return -1;
    }
    let rec = &*rec;

    let raw: &[McBody] = if count == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(bodies, count as usize)
    };

    let result = raw
        .iter()
        .map(Body::try_from)
        .collect::<Result<Vec<Body>>>()
        .and_then(|bodies| {
            rec.0.push(BodyFrame {
                timestamp_us,
                bodies,
            })
        });

    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Start or stop recording. Returns 1 if now recording, 0 if stopped, -1 on error.
///
/// # Safety
/// `rec` must be a valid recorder pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn mc_toggle_recording(rec: *const McRecorder) -> c_int {
    if rec.is_null() {
        return -1;
    }
    let rec = &*rec;
    c_int::from(rec.0.toggle_recording().is_recording())
}

/// Check whether the recorder is currently recording.
///
/// # Safety
/// `rec` must be a valid recorder pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn mc_is_recording(rec: *const McRecorder) -> bool {
    if rec.is_null() {
        return false;
    }
    let rec = &*rec;
    rec.0.status().state.is_recording()
}

/// Number of frames recorded so far.
///
/// # Safety
/// `rec` must be a valid recorder pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn mc_frame_count(rec: *const McRecorder) -> u64 {
    if rec.is_null() {
        return 0;
    }
    let rec = &*rec;
    rec.0.status().frame_count as u64
}

/// Wait up to `timeout_ms` for queued frames to be processed.
/// Returns true when the queue is drained.
///
/// # Safety
/// `rec` must be a valid recorder pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn mc_flush(rec: *const McRecorder, timeout_ms: u32) -> bool {
    if rec.is_null() {
        return false;
    }
    let rec = &*rec;
    rec.0.flush(Duration::from_millis(timeout_ms as u64))
}

/// Write all recorded frames to `path` as BVH.
/// Returns the number of frames written, or -1 on error.
///
/// # Safety
/// `rec` must be a valid recorder pointer and `path` a null-terminated
/// UTF-8 string, or either may be null.
#[no_mangle]
pub unsafe extern "C" fn mc_export(rec: *const McRecorder, path: *const c_char) -> i64 {
    if rec.is_null() || path.is_null() {
        return -1;
    }
    let rec = &*rec;
    let path = match CStr::from_ptr(path).to_str() {
        Ok(p) => p,
        Err(e) => {
            LAST_ERROR.set(&MocapError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                e,
            )));
            return -1;
        }
    };

    match rec.0.export_to_path(path) {
        Ok(frames) => frames as i64,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next mocap API call that fails.
#[no_mangle]
pub extern "C" fn mc_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

/// Clear the last error message.
#[no_mangle]
pub extern "C" fn mc_clear_error() {
    LAST_ERROR.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn c_body(id: u32, state: c_int, mask: u32) -> McBody {
        let mut joints = [McJoint {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }; JOINT_COUNT];
        joints[JointType::HipCenter.index()].position = [0.25, 1.0, 2.0];
        McBody {
            tracking_id: id,
            tracking_state: state,
            position: [0.0, 0.0, 2.0],
            joint_mask: mask,
            joints,
        }
    }

    #[test]
    fn test_body_from_c() {
        let body = Body::try_from(&c_body(4, 3, JointSet::all().bits())).unwrap();
        assert!(body.is_tracked());
        assert_eq!(body.joints.len(), JOINT_COUNT);
        assert_eq!(
            body.joint(JointType::HipCenter).unwrap().position,
            Vec3::new(0.25, 1.0, 2.0)
        );

        let partial = (JointSet::all() - JointSet::HEAD).bits();
        let body = Body::try_from(&c_body(4, 3, partial)).unwrap();
        assert_eq!(body.joint_set().first_missing(), Some(JointType::Head));

        assert!(matches!(
            Body::try_from(&c_body(4, 9, 0)),
            Err(MocapError::InvalidTrackingState(9))
        ));
    }

    #[test]
    fn test_record_and_export_through_c_api() {
        let rec = mc_recorder_new();
        assert!(!rec.is_null());

        unsafe {
            assert_eq!(mc_toggle_recording(rec), 1);
            assert!(mc_is_recording(rec));

            let bodies = [c_body(2, 0, 0), c_body(5, 3, JointSet::all().bits())];
            for ts in 0..3 {
                assert_eq!(mc_push_frame(rec, bodies.as_ptr(), 2, ts), 0);
            }
            assert!(mc_flush(rec, 2000));
            assert_eq!(mc_frame_count(rec), 3);

            assert_eq!(mc_push_frame(rec, std::ptr::null(), 0, 4), 0);
            assert!(mc_flush(rec, 2000));
            assert_eq!(mc_frame_count(rec), 3);

            assert_eq!(mc_toggle_recording(rec), 0);

            let path = std::env::temp_dir().join(format!("mocap-ffi-{}.bvh", std::process::id()));
            let c_path = CString::new(path.to_str().unwrap()).unwrap();
            assert_eq!(mc_export(rec, c_path.as_ptr()), 3);
            let text = std::fs::read_to_string(&path).unwrap();
            let _ = std::fs::remove_file(&path);
            assert!(text.contains("Frames:\t3\r\n"));
            assert!(text.contains("\r\n0.25 1.00 2.00 "));

            mc_recorder_free(rec);
        }
    }

    #[test]
    fn test_null_handles() {
        unsafe {
            assert_eq!(mc_toggle_recording(std::ptr::null()), -1);
            assert_eq!(mc_push_frame(std::ptr::null(), std::ptr::null(), 0, 0), -1);
            assert_eq!(mc_export(std::ptr::null(), std::ptr::null()), -1);
            assert_eq!(mc_frame_count(std::ptr::null()), 0);
            mc_recorder_free(std::ptr::null_mut());
        }
    }
}
