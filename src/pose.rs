use crate::skeleton;
use crate::types::{Body, JointType, Quaternion, Vec3, JOINT_COUNT};
use crate::{MocapError, Result};

/// One recorded frame: root position plus every joint's parent-relative rotation.
///
/// Owns all of its data; nothing borrows from the sensor's delivery buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub root_position: Vec3,
    /// Indexed by `JointType::index()`.
    pub rotations: [Quaternion; JOINT_COUNT],
}

impl Pose {
    /// Copy a delivered body into an owned pose.
    ///
    /// Fails with [`MocapError::MissingJoint`] if the body does not carry a
    /// sample for every joint. The root position is taken from the root joint's
    /// sample, not from the body center.
    pub fn snapshot(body: &Body) -> Result<Pose> {
        if let Some(missing) = body.joint_set().first_missing() {
            return Err(MocapError::MissingJoint(missing));
        }

        let mut rotations = [Quaternion::IDENTITY; JOINT_COUNT];
        let mut root_position = Vec3::ZERO;
        for sample in &body.joints {
            rotations[sample.joint.index()] = sample.hierarchical_rotation;
            if sample.joint == skeleton::root() {
                root_position = sample.position;
            }
        }

        Ok(Pose {
            root_position,
            rotations,
        })
    }

    pub fn rotation(&self, joint: JointType) -> Quaternion {
        self.rotations[joint.index()]
    }
}
