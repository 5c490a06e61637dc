//! BVH document writer.
//!
//! The hierarchy section depends only on the fixed skeleton; the motion
//! section has one line per recorded pose. Every line ends in CRLF.
//!
//! Joint offsets are always zero: bone lengths are not measured.

use crate::config::{ExportConfig, MAX_PRECISION};
use crate::pose::Pose;
use crate::rotation::quaternion_to_euler;
use crate::skeleton;
use crate::types::JointType;
use std::fmt::Write;

const EOL: &str = "\r\n";
const ZERO_OFFSET: &str = "OFFSET\t0.00\t0.00\t0.00";
const ROOT_CHANNEL_DECL: &str = "CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation";
const JOINT_CHANNEL_DECL: &str = "CHANNELS 3 Zrotation Xrotation Yrotation";

/// Full document: hierarchy followed by motion.
pub fn export(frames: &[Pose], config: &ExportConfig) -> String {
    let mut out = write_hierarchy();
    out.push_str(&write_motion(frames, config));
    out
}

/// The `HIERARCHY` section.
pub fn write_hierarchy() -> String {
    let mut out = String::new();
    out.push_str("HIERARCHY");
    out.push_str(EOL);
    write_joint(&mut out, skeleton::root(), 0);
    out
}

fn write_joint(out: &mut String, joint: JointType, depth: usize) {
    let indent = "\t".repeat(depth);

    if joint == skeleton::root() {
        line(out, &indent, &format!("ROOT {}", joint.name()));
    } else if skeleton::is_end_site(joint) {
        line(out, &indent, "End Site");
    } else {
        line(out, &indent, &format!("JOINT {}", joint.name()));
    }
    line(out, &indent, "{");

    let inner = "\t".repeat(depth + 1);
    line(out, &inner, ZERO_OFFSET);
    match skeleton::channel_count(joint) {
        skeleton::ROOT_CHANNELS => line(out, &inner, ROOT_CHANNEL_DECL),
        skeleton::ROTATION_CHANNELS => line(out, &inner, JOINT_CHANNEL_DECL),
        _ => {}
    }

    for &child in skeleton::children(joint) {
        write_joint(out, child, depth + 1);
    }

    line(out, &indent, "}");
}

fn line(out: &mut String, indent: &str, text: &str) {
    out.push_str(indent);
    out.push_str(text);
    out.push_str(EOL);
}

/// The `MOTION` section.
pub fn write_motion(frames: &[Pose], config: &ExportConfig) -> String {
    let mut out = String::new();
    out.push_str("MOTION");
    out.push_str(EOL);
    let _ = write!(out, "Frames:\t{}{}", frames.len(), EOL);
    let _ = write!(out, "Frame Time: {:.6}{}", config.frame_time_s, EOL);
    let precision = config.precision.min(MAX_PRECISION);

    for pose in frames {
        let values = motion_values(pose);
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            push_value(&mut out, *value, precision);
        }
        out.push_str(EOL);
    }
    out
}

/// Channel values for one pose, in the order the hierarchy declares them.
pub fn motion_values(pose: &Pose) -> Vec<f64> {
    let mut values = Vec::with_capacity(skeleton::motion_value_count());
    let p = pose.root_position;
    values.extend_from_slice(&[p.x, p.y, p.z]);
    for joint in skeleton::channel_joints() {
        values.extend_from_slice(&quaternion_to_euler(pose.rotation(joint)).zxy());
    }
    values
}

fn push_value(out: &mut String, value: f64, precision: usize) {
    let text = format!("{:.*}", precision, value);
    // Small negatives round to "-0.00"; write them as plain zero.
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => out.push_str(rest),
        _ => out.push_str(&text),
    }
}
