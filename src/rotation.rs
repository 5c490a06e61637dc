use crate::types::Quaternion;

/// Euler angles in degrees.
///
/// `pitch` rotates about X, `yaw` about Z, `roll` about Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl EulerAngles {
    /// Values in BVH `Zrotation Xrotation Yrotation` channel order.
    pub fn zxy(&self) -> [f64; 3] {
        [self.yaw, self.pitch, self.roll]
    }
}

/// Convert a hierarchical joint rotation to Euler angles in degrees.
///
///   pitch = atan2(2(xw - yz), 1 - 2(x² + z²))
///   yaw   = asin(2(xy + zw))
///   roll  = atan2(2(yw - xz), 1 - 2(y² + z²))
///
/// The asin argument is clamped to [-1, 1], so a quaternion that drifted
/// slightly off unit length saturates at ±90° yaw instead of producing NaN.
pub fn quaternion_to_euler(q: Quaternion) -> EulerAngles {
    let Quaternion { x, y, z, w } = q;
    let pitch = (2.0 * x * w - 2.0 * y * z).atan2(1.0 - 2.0 * x * x - 2.0 * z * z);
    let yaw = (2.0 * x * y + 2.0 * z * w).clamp(-1.0, 1.0).asin();
    let roll = (2.0 * y * w - 2.0 * x * z).atan2(1.0 - 2.0 * y * y - 2.0 * z * z);
    EulerAngles {
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Same formula without clamping. Yaw is NaN when |2(xy + zw)| > 1.
pub fn quaternion_to_euler_unclamped(q: Quaternion) -> EulerAngles {
    let Quaternion { x, y, z, w } = q;
    EulerAngles {
        pitch: (2.0 * x * w - 2.0 * y * z)
            .atan2(1.0 - 2.0 * x * x - 2.0 * z * z)
            .to_degrees(),
        yaw: (2.0 * x * y + 2.0 * z * w).asin().to_degrees(),
        roll: (2.0 * y * w - 2.0 * x * z)
            .atan2(1.0 - 2.0 * y * y - 2.0 * z * z)
            .to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identity() {
        let e = quaternion_to_euler(Quaternion::IDENTITY);
        assert!(close(e.pitch, 0.0));
        assert!(close(e.yaw, 0.0));
        assert!(close(e.roll, 0.0));
    }

    #[test]
    fn test_quarter_turn_about_x() {
        let e = quaternion_to_euler(Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2));
        assert!(close(e.pitch, 90.0));
        assert!(close(e.yaw, 0.0));
        assert!(close(e.roll, 0.0));
    }

    #[test]
    fn test_quarter_turn_about_y() {
        let e = quaternion_to_euler(Quaternion::new(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2));
        assert!(close(e.roll, 90.0));
        assert!(close(e.pitch, 0.0));
        assert!(close(e.yaw, 0.0));
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let e = quaternion_to_euler(Quaternion::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2));
        assert!(close(e.yaw, 90.0));
    }

    #[test]
    fn test_non_unit_input_is_clamped() {
        // 2(xy + zw) = 1.08, outside asin's domain.
        let q = Quaternion::new(0.0, 0.0, 0.735, 0.735);
        assert!(close(quaternion_to_euler(q).yaw, 90.0));
        assert!(quaternion_to_euler_unclamped(q).yaw.is_nan());
    }

    #[test]
    fn test_zxy_order() {
        let e = EulerAngles {
            pitch: 1.0,
            yaw: 2.0,
            roll: 3.0,
        };
        assert_eq!(e.zxy(), [2.0, 1.0, 3.0]);
    }
}
