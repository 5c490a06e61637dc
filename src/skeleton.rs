//! Fixed joint hierarchy of the tracked skeleton.
//!
//! ```text
//! HipCenter
//! ├── Spine
//! │   └── ShoulderCenter
//! │       ├── Head (end site)
//! │       ├── ShoulderLeft → ElbowLeft → WristLeft → HandLeft (end site)
//! │       └── ShoulderRight → ElbowRight → WristRight → HandRight (end site)
//! ├── HipLeft → KneeLeft → AnkleLeft → FootLeft (end site)
//! └── HipRight → KneeRight → AnkleRight → FootRight (end site)
//! ```

use crate::types::{JointType, JOINT_COUNT};

/// Rotation channels per non-root joint.
pub const ROTATION_CHANNELS: usize = 3;
/// Position + rotation channels on the root.
pub const ROOT_CHANNELS: usize = 6;

const END_SITES: [JointType; 5] = [
    JointType::Head,
    JointType::HandLeft,
    JointType::HandRight,
    JointType::FootLeft,
    JointType::FootRight,
];

/// Number of joints that carry rotation channels.
pub const CHANNEL_JOINT_COUNT: usize = JOINT_COUNT - END_SITES.len();

pub fn root() -> JointType {
    JointType::HipCenter
}

/// Children of `joint`, in export order.
pub fn children(joint: JointType) -> &'static [JointType] {
    use JointType::*;
    match joint {
        HipCenter => &[Spine, HipLeft, HipRight],
        Spine => &[ShoulderCenter],
        ShoulderCenter => &[Head, ShoulderLeft, ShoulderRight],
        ShoulderLeft => &[ElbowLeft],
        ElbowLeft => &[WristLeft],
        WristLeft => &[HandLeft],
        ShoulderRight => &[ElbowRight],
        ElbowRight => &[WristRight],
        WristRight => &[HandRight],
        HipLeft => &[KneeLeft],
        KneeLeft => &[AnkleLeft],
        AnkleLeft => &[FootLeft],
        HipRight => &[KneeRight],
        KneeRight => &[AnkleRight],
        AnkleRight => &[FootRight],
        Head | HandLeft | HandRight | FootLeft | FootRight => &[],
    }
}

pub fn is_end_site(joint: JointType) -> bool {
    END_SITES.contains(&joint)
}

/// Motion channels declared for `joint`: 6 on the root, 0 on end sites, 3 elsewhere.
pub fn channel_count(joint: JointType) -> usize {
    if joint == root() {
        ROOT_CHANNELS
    } else if is_end_site(joint) {
        0
    } else {
        ROTATION_CHANNELS
    }
}

/// Values per motion line: root position plus one rotation triple per channel joint.
pub const fn motion_value_count() -> usize {
    3 + ROTATION_CHANNELS * CHANNEL_JOINT_COUNT
}

/// Pre-order walk from the root, yielding `(joint, depth)` with the root at depth 0.
pub fn depth_first() -> DepthFirst {
    DepthFirst {
        stack: vec![(root(), 0)],
    }
}

/// Joints carrying rotation channels, in pre-order.
pub fn channel_joints() -> impl Iterator<Item = JointType> {
    depth_first()
        .map(|(joint, _)| joint)
        .filter(|&joint| !is_end_site(joint))
}

/// Iterator returned by [`depth_first`].
pub struct DepthFirst {
    stack: Vec<(JointType, usize)>,
}

impl Iterator for DepthFirst {
    type Item = (JointType, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (joint, depth) = self.stack.pop()?;
        // Reverse so the first child is popped first.
        self.stack
            .extend(children(joint).iter().rev().map(|&child| (child, depth + 1)));
        Some((joint, depth))
    }
}
