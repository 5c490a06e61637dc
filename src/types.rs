/// Position in sensor space, meters [x, y, z].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion [x, y, z, w], matching the sensor SDK's Vector4 layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Number of joints in the tracked skeleton.
pub const JOINT_COUNT: usize = 20;

/// Skeleton joints, in sensor enumeration order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    HipCenter = 0,
    Spine = 1,
    ShoulderCenter = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
}

impl JointType {
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::HipCenter,
        JointType::Spine,
        JointType::ShoulderCenter,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<JointType> {
        Self::ALL.get(index).copied()
    }

    /// Joint name as written into the BVH hierarchy.
    pub const fn name(self) -> &'static str {
        match self {
            JointType::HipCenter => "HipCenter",
            JointType::Spine => "Spine",
            JointType::ShoulderCenter => "ShoulderCenter",
            JointType::Head => "Head",
            JointType::ShoulderLeft => "ShoulderLeft",
            JointType::ElbowLeft => "ElbowLeft",
            JointType::WristLeft => "WristLeft",
            JointType::HandLeft => "HandLeft",
            JointType::ShoulderRight => "ShoulderRight",
            JointType::ElbowRight => "ElbowRight",
            JointType::WristRight => "WristRight",
            JointType::HandRight => "HandRight",
            JointType::HipLeft => "HipLeft",
            JointType::KneeLeft => "KneeLeft",
            JointType::AnkleLeft => "AnkleLeft",
            JointType::FootLeft => "FootLeft",
            JointType::HipRight => "HipRight",
            JointType::KneeRight => "KneeRight",
            JointType::AnkleRight => "AnkleRight",
            JointType::FootRight => "FootRight",
        }
    }
}

bitflags::bitflags! {
    /// Set of joints, bit `i` = `JointType` with index `i`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct JointSet: u32 {
        const HIP_CENTER      = 1 << 0;
        const SPINE           = 1 << 1;
        const SHOULDER_CENTER = 1 << 2;
        const HEAD            = 1 << 3;
        const SHOULDER_LEFT   = 1 << 4;
        const ELBOW_LEFT      = 1 << 5;
        const WRIST_LEFT      = 1 << 6;
        const HAND_LEFT       = 1 << 7;
        const SHOULDER_RIGHT  = 1 << 8;
        const ELBOW_RIGHT     = 1 << 9;
        const WRIST_RIGHT     = 1 << 10;
        const HAND_RIGHT      = 1 << 11;
        const HIP_LEFT        = 1 << 12;
        const KNEE_LEFT       = 1 << 13;
        const ANKLE_LEFT      = 1 << 14;
        const FOOT_LEFT       = 1 << 15;
        const HIP_RIGHT       = 1 << 16;
        const KNEE_RIGHT      = 1 << 17;
        const ANKLE_RIGHT     = 1 << 18;
        const FOOT_RIGHT      = 1 << 19;
    }
}

impl JointSet {
    pub const fn of(joint: JointType) -> JointSet {
        JointSet::from_bits_retain(1 << joint.index())
    }

    /// First joint (in enumeration order) that is not in the set.
    pub fn first_missing(self) -> Option<JointType> {
        JointType::ALL
            .into_iter()
            .find(|&joint| !self.contains(JointSet::of(joint)))
    }
}

/// Tracking status the sensor reports for a candidate body.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    NotTracked = 0,
    PositionOnly = 1,
    Inferred = 2,
    Tracked = 3,
}

impl TryFrom<i32> for TrackingState {
    type Error = crate::MocapError;

    fn try_from(tag: i32) -> crate::Result<Self> {
        match tag {
            0 => Ok(TrackingState::NotTracked),
            1 => Ok(TrackingState::PositionOnly),
            2 => Ok(TrackingState::Inferred),
            3 => Ok(TrackingState::Tracked),
            other => Err(crate::MocapError::InvalidTrackingState(other)),
        }
    }
}

/// One joint as delivered by the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub joint: JointType,
    pub position: Vec3,
    /// Rotation relative to the parent joint.
    pub hierarchical_rotation: Quaternion,
}

/// A candidate body in one sensor frame.
///
/// Joint data is only meaningful when `tracking_state` is `Tracked`.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub tracking_id: u32,
    pub tracking_state: TrackingState,
    /// Body center, used for nearest-body selection.
    pub position: Vec3,
    pub joints: Vec<JointSample>,
}

impl Body {
    pub fn is_tracked(&self) -> bool {
        self.tracking_state == TrackingState::Tracked
    }

    pub fn joint(&self, joint: JointType) -> Option<&JointSample> {
        self.joints.iter().find(|s| s.joint == joint)
    }

    pub fn joint_set(&self) -> JointSet {
        self.joints
            .iter()
            .fold(JointSet::empty(), |set, s| set | JointSet::of(s.joint))
    }
}

/// Everything the sensor delivers for one frame tick, bodies in slot order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyFrame {
    /// Sensor timestamp in microseconds.
    pub timestamp_us: u64,
    pub bodies: Vec<Body>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index_round_trip() {
        for (i, joint) in JointType::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(JointType::from_index(i), Some(*joint));
        }
        assert_eq!(JointType::from_index(JOINT_COUNT), None);
    }

    #[test]
    fn test_joint_set_bits_match_enum() {
        assert_eq!(JointSet::of(JointType::HipCenter), JointSet::HIP_CENTER);
        assert_eq!(JointSet::of(JointType::Head), JointSet::HEAD);
        assert_eq!(JointSet::of(JointType::FootRight), JointSet::FOOT_RIGHT);
        assert_eq!(JointSet::all().bits(), (1 << JOINT_COUNT) - 1);
    }

    #[test]
    fn test_first_missing() {
        assert_eq!(JointSet::all().first_missing(), None);
        let set = JointSet::all() - JointSet::KNEE_LEFT - JointSet::HAND_RIGHT;
        assert_eq!(set.first_missing(), Some(JointType::HandRight));
        assert_eq!(JointSet::empty().first_missing(), Some(JointType::HipCenter));
    }

    #[test]
    fn test_tracking_state_from_tag() {
        assert_eq!(TrackingState::try_from(3).unwrap(), TrackingState::Tracked);
        assert_eq!(TrackingState::try_from(0).unwrap(), TrackingState::NotTracked);
        assert!(matches!(
            TrackingState::try_from(7),
            Err(crate::MocapError::InvalidTrackingState(7))
        ));
    }
}
