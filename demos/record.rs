//! Record a synthetic performer and export it as BVH.
//!
//! A fake sensor thread pushes 30 Hz frames with two candidate bodies. The
//! first one walks in, drops out of tracking for half a second, and comes back.
//!
//! Usage: cargo run --example record -- [output.bvh]

use mocap::{
    Body, BodyFrame, JointSample, JointType, Quaternion, Recorder, RecorderConfig, TrackingState,
    Vec3,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn performer(id: u32, state: TrackingState, t: f64) -> Body {
    let root = Vec3::new(0.3 * t.sin(), 0.9, 2.5 - 0.1 * t);
    let sway = (t * 2.0).sin() * 0.2;
    let joints = JointType::ALL
        .iter()
        .map(|&joint| JointSample {
            joint,
            position: root,
            hierarchical_rotation: match joint {
                JointType::ElbowLeft | JointType::ElbowRight => {
                    Quaternion::new(sway.sin(), 0.0, 0.0, sway.cos())
                }
                _ => Quaternion::IDENTITY,
            },
        })
        .collect();
    Body {
        tracking_id: id,
        tracking_state: state,
        position: root,
        joints,
    }
}

fn main() {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "capture.bvh".to_string());

    let recorder = match Recorder::start(RecorderConfig::from_env()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start recorder: {}", e);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let sensor = {
        let sender = recorder.sender();
        let running = running.clone();
        std::thread::spawn(move || {
            let start = Instant::now();
            let mut dropped: u64 = 0;
            while running.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f64();
                let state = if (1.5..2.0).contains(&t) {
                    TrackingState::Inferred
                } else {
                    TrackingState::Tracked
                };
                let frame = BodyFrame {
                    timestamp_us: (t * 1e6) as u64,
                    bodies: vec![
                        performer(11, state, t),
                        performer(12, TrackingState::PositionOnly, t),
                    ],
                };
                match sender.push(frame) {
                    Ok(true) => {}
                    Ok(false) => dropped += 1,
                    Err(e) => {
                        eprintln!("Sensor stopped: {}", e);
                        break;
                    }
                }
                std::thread::sleep(FRAME_INTERVAL);
            }
            dropped
        })
    };

    println!("Recording for 3s...");
    recorder.toggle_recording();
    std::thread::sleep(Duration::from_secs(3));
    recorder.toggle_recording();

    running.store(false, Ordering::Relaxed);
    let dropped = sensor.join().unwrap_or(0);
    recorder.flush(Duration::from_secs(1));

    let status = recorder.status();
    println!(
        "Stopped: {} frames, last body {:?}, {} dropped by sensor",
        status.frame_count, status.last_tracked, dropped
    );

    match recorder.export_to_path(&output) {
        Ok(frames) => println!("Wrote {} frames to {}", frames, output),
        Err(e) => {
            eprintln!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}
