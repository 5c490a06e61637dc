//! Recording session: which body to follow, and the poses captured from it.
//!
//! ```text
//!            toggle                 first tracked body
//!   Idle  ──────────▶  Unlocked  ─────────────────────▶  Locked(id)
//!    ▲                    ▲   ◀──────────────────────────   │
//!    │      toggle        │      id not tracked / absent    │
//!    └────────────────────┴─────────────────────────────────┘
//! ```
//!
//! Frames accumulate across record/stop cycles; nothing is cleared unless
//! [`RecordingSession::clear`] is called.

use crate::bvh;
use crate::config::ExportConfig;
use crate::pose::Pose;
use crate::types::{Body, BodyFrame};
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a body is chosen while no body is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingPolicy {
    /// First tracked body in slot order.
    #[default]
    FirstTracked,
    /// Tracked body nearest the sensor (smallest body-center z).
    ClosestTracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    /// Recording, waiting for a tracked body.
    Unlocked,
    /// Recording, following the body with this tracking id.
    Locked(u32),
}

impl RecordingState {
    pub fn is_recording(self) -> bool {
        self != RecordingState::Idle
    }
}

/// What `on_frame_ready` did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not recording.
    Ignored,
    /// Recording but no tracked body to lock onto.
    NoCandidate,
    /// Locked onto `body` and stored this frame.
    Acquired { body: u32, frame_index: usize },
    Recorded { frame_index: usize },
    /// Locked body was not tracked this frame; lock dropped, frame not stored.
    Lost { body: u32 },
}

/// Point-in-time view for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: RecordingState,
    pub frame_count: usize,
    /// Most recently locked body, kept after the lock is dropped.
    pub last_tracked: Option<u32>,
}

#[derive(Debug)]
pub struct RecordingSession {
    frames: Vec<Pose>,
    state: RecordingState,
    last_tracked: Option<u32>,
    policy: TrackingPolicy,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(TrackingPolicy::default())
    }
}

impl RecordingSession {
    pub fn new(policy: TrackingPolicy) -> Self {
        Self {
            frames: Vec::new(),
            state: RecordingState::Idle,
            last_tracked: None,
            policy,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn frames(&self) -> &[Pose] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            frame_count: self.frames.len(),
            last_tracked: self.last_tracked,
        }
    }

    /// Start or stop recording. Stored frames are kept; the body lock is not.
    pub fn toggle_recording(&mut self) -> RecordingState {
        self.state = match self.state {
            RecordingState::Idle => RecordingState::Unlocked,
            RecordingState::Unlocked | RecordingState::Locked(_) => RecordingState::Idle,
        };
        log::info!(
            "Recording {} ({} frames stored)",
            if self.is_recording() { "started" } else { "stopped" },
            self.frames.len()
        );
        self.state
    }

    /// Drop every stored frame. Recording state is unchanged.
    pub fn clear(&mut self) {
        log::info!("Clearing {} recorded frames", self.frames.len());
        self.frames.clear();
    }

    /// Feed one sensor frame through the state machine.
    ///
    /// A body missing joint data is rejected with `MissingJoint` and not
    /// stored; a lock acquired in the same call is kept.
    pub fn on_frame_ready(&mut self, frame: &BodyFrame) -> Result<FrameOutcome> {
        match self.state {
            RecordingState::Idle => Ok(FrameOutcome::Ignored),
            RecordingState::Unlocked => {
                let Some(body) = self.select(frame) else {
                    return Ok(FrameOutcome::NoCandidate);
                };
                let id = body.tracking_id;
                self.state = RecordingState::Locked(id);
                self.last_tracked = Some(id);
                log::info!("Tracking body {}", id);

                let frame_index = self.append(body)?;
                Ok(FrameOutcome::Acquired {
                    body: id,
                    frame_index,
                })
            }
            RecordingState::Locked(id) => {
                match frame.bodies.iter().find(|b| b.tracking_id == id) {
                    Some(body) if body.is_tracked() => {
                        let frame_index = self.append(body)?;
                        Ok(FrameOutcome::Recorded { frame_index })
                    }
                    _ => {
                        self.state = RecordingState::Unlocked;
                        log::info!("Lost body {}, reacquiring", id);
                        Ok(FrameOutcome::Lost { body: id })
                    }
                }
            }
        }
    }

    fn select<'a>(&self, frame: &'a BodyFrame) -> Option<&'a Body> {
        let mut tracked = frame.bodies.iter().filter(|b| b.is_tracked());
        match self.policy {
            TrackingPolicy::FirstTracked => tracked.next(),
            TrackingPolicy::ClosestTracked => {
                tracked.min_by(|a, b| a.position.z.total_cmp(&b.position.z))
            }
        }
    }

    fn append(&mut self, body: &Body) -> Result<usize> {
        let pose = Pose::snapshot(body)?;
        self.frames.push(pose);
        Ok(self.frames.len() - 1)
    }
}

/// A session shared between the frame-delivery thread and the command caller.
///
/// Every operation takes the one lock. Export copies the frames out and
/// renders after releasing it, so delivery is never held up by formatting.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<RecordingSession>>,
}

impl SharedSession {
    pub fn new(session: RecordingSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session. A panic on another thread cannot leave it half
    /// updated, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, RecordingSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle_recording(&self) -> RecordingState {
        self.lock().toggle_recording()
    }

    pub fn on_frame_ready(&self, frame: &BodyFrame) -> Result<FrameOutcome> {
        self.lock().on_frame_ready(frame)
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    /// Owned copy of the recorded frames.
    pub fn frames(&self) -> Vec<Pose> {
        self.lock().frames().to_vec()
    }

    /// Render every recorded frame as a BVH document.
    pub fn export(&self, config: &ExportConfig) -> String {
        let frames = self.frames();
        bvh::export(&frames, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointSample, JointType, Quaternion, TrackingState, Vec3};
    use crate::MocapError;

    fn body(id: u32, state: TrackingState, root: Vec3) -> Body {
        Body {
            tracking_id: id,
            tracking_state: state,
            position: root,
            joints: JointType::ALL
                .iter()
                .map(|&joint| JointSample {
                    joint,
                    position: root,
                    hierarchical_rotation: Quaternion::IDENTITY,
                })
                .collect(),
        }
    }

    fn frame(bodies: Vec<Body>) -> BodyFrame {
        BodyFrame {
            timestamp_us: 0,
            bodies,
        }
    }

    fn tracked(id: u32, x: f64) -> Body {
        body(id, TrackingState::Tracked, Vec3::new(x, 0.5, 2.0))
    }

    fn recording() -> RecordingSession {
        let mut session = RecordingSession::default();
        session.toggle_recording();
        session
    }

    #[test]
    fn test_idle_ignores_frames() {
        let mut session = RecordingSession::default();
        for _ in 0..5 {
            let outcome = session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();
            assert_eq!(outcome, FrameOutcome::Ignored);
        }
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.state(), RecordingState::Idle);
    }

    #[test]
    fn test_unlocked_without_tracked_body() {
        let mut session = recording();
        let f = frame(vec![
            body(1, TrackingState::NotTracked, Vec3::ZERO),
            body(2, TrackingState::PositionOnly, Vec3::ZERO),
            body(3, TrackingState::Inferred, Vec3::ZERO),
        ]);
        assert_eq!(session.on_frame_ready(&f).unwrap(), FrameOutcome::NoCandidate);
        assert_eq!(session.state(), RecordingState::Unlocked);
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn test_locks_first_tracked_in_slot_order() {
        let mut session = recording();
        let f = frame(vec![
            body(4, TrackingState::NotTracked, Vec3::ZERO),
            tracked(9, 0.0),
            tracked(2, 0.0),
        ]);
        assert_eq!(
            session.on_frame_ready(&f).unwrap(),
            FrameOutcome::Acquired {
                body: 9,
                frame_index: 0
            }
        );
        assert_eq!(session.state(), RecordingState::Locked(9));
    }

    #[test]
    fn test_closest_policy() {
        let mut session = RecordingSession::new(TrackingPolicy::ClosestTracked);
        session.toggle_recording();
        let near = body(5, TrackingState::Tracked, Vec3::new(0.0, 0.0, 1.2));
        let far = body(6, TrackingState::Tracked, Vec3::new(0.0, 0.0, 3.0));
        session.on_frame_ready(&frame(vec![far, near])).unwrap();
        assert_eq!(session.state(), RecordingState::Locked(5));
    }

    #[test]
    fn test_follows_locked_body_until_lost() {
        let mut session = recording();
        for i in 0..3 {
            session
                .on_frame_ready(&frame(vec![tracked(1, i as f64)]))
                .unwrap();
        }
        assert_eq!(session.state(), RecordingState::Locked(1));
        assert_eq!(session.frame_count(), 3);

        // Another tracked body does not steal the lock.
        let outcome = session
            .on_frame_ready(&frame(vec![tracked(2, 9.0), tracked(1, 3.0)]))
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Recorded { frame_index: 3 });
        assert_eq!(session.frames()[3].root_position.x, 3.0);

        let lost = frame(vec![body(1, TrackingState::Inferred, Vec3::ZERO)]);
        assert_eq!(
            session.on_frame_ready(&lost).unwrap(),
            FrameOutcome::Lost { body: 1 }
        );
        assert_eq!(session.state(), RecordingState::Unlocked);
        assert_eq!(session.frame_count(), 4);
        assert_eq!(session.status().last_tracked, Some(1));
    }

    #[test]
    fn test_absent_locked_body_counts_as_lost() {
        let mut session = recording();
        session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();
        let outcome = session.on_frame_ready(&frame(vec![tracked(2, 0.0)])).unwrap();
        assert_eq!(outcome, FrameOutcome::Lost { body: 1 });
        assert_eq!(session.frame_count(), 1);

        // Reacquired on the next frame.
        session.on_frame_ready(&frame(vec![tracked(2, 0.0)])).unwrap();
        assert_eq!(session.state(), RecordingState::Locked(2));
        assert_eq!(session.frame_count(), 2);
    }

    #[test]
    fn test_toggle_never_clears_frames() {
        let mut session = recording();
        session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();

        assert_eq!(session.toggle_recording(), RecordingState::Idle);
        assert_eq!(session.frame_count(), 1);
        assert_eq!(session.status().last_tracked, Some(1));

        // Selection is forgotten on stop.
        assert_eq!(session.toggle_recording(), RecordingState::Unlocked);
        session.toggle_recording();
        session.toggle_recording();
        assert_eq!(session.state(), RecordingState::Unlocked);
        assert_eq!(session.frame_count(), 1);

        session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();
        assert_eq!(session.frame_count(), 2);
    }

    #[test]
    fn test_missing_joint_not_stored() {
        let mut session = recording();
        let mut partial = tracked(1, 0.0);
        partial.joints.retain(|s| s.joint != JointType::AnkleLeft);

        let err = session.on_frame_ready(&frame(vec![partial.clone()])).unwrap_err();
        assert!(matches!(err, MocapError::MissingJoint(JointType::AnkleLeft)));
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.state(), RecordingState::Locked(1));

        assert!(session.on_frame_ready(&frame(vec![partial])).is_err());
        session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();
        assert_eq!(session.frame_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut session = recording();
        session.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();
        session.clear();
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.state(), RecordingState::Locked(1));
    }

    #[test]
    fn test_shared_session_export_copies() {
        let shared = SharedSession::default();
        shared.toggle_recording();
        shared.on_frame_ready(&frame(vec![tracked(1, 0.0)])).unwrap();

        let doc = shared.export(&ExportConfig::default());
        assert!(doc.contains("Frames:\t1\r\n"));
        assert_eq!(shared.status().frame_count, 1);
    }
}
