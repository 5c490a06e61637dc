use crate::bvh;
use crate::config::{ExportConfig, RecorderConfig};
use crate::session::{RecordingSession, RecordingState, SessionStatus, SharedSession};
use crate::types::BodyFrame;
use crate::{MocapError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sensor-side handle for pushing frames to a [`Recorder`].
///
/// Never blocks: if the queue is full the frame is dropped.
#[derive(Clone)]
pub struct FrameSender {
    sender: Sender<BodyFrame>,
    pending: Arc<AtomicUsize>,
}

impl FrameSender {
    /// Queue a frame. Returns `Ok(false)` if it was dropped because the queue is full.
    pub fn push(&self, frame: BodyFrame) -> Result<bool> {
        // Counted before sending so the recorder can never see it go negative.
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.sender.try_send(frame) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                match e {
                    crossbeam_channel::TrySendError::Full(frame) => {
                        log::trace!("Frame queue full, dropping frame at {}us", frame.timestamp_us);
                        Ok(false)
                    }
                    crossbeam_channel::TrySendError::Disconnected(_) => {
                        Err(MocapError::ChannelDisconnected)
                    }
                }
            }
        }
    }
}

/// Records sensor frames on a background thread and exports them on demand.
///
/// Frames pushed through [`FrameSender`] are fed to the shared
/// [`RecordingSession`] by a dedicated thread; toggle and export are called
/// from the owner's thread.
pub struct Recorder {
    session: SharedSession,
    sender: FrameSender,
    export: ExportConfig,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Recorder {
    /// Start a recorder with an empty session.
    pub fn start(config: RecorderConfig) -> Result<Recorder> {
        let session = SharedSession::new(RecordingSession::new(config.policy));
        Self::with_session(session, config)
    }

    /// Start a recorder feeding an existing session.
    pub fn with_session(session: SharedSession, config: RecorderConfig) -> Result<Recorder> {
        let (sender, receiver) = crossbeam_channel::bounded(config.queue_capacity.max(1));
        let pending = Arc::new(AtomicUsize::new(0));
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread = {
            let session = session.clone();
            let pending = pending.clone();
            let stop_flag = stop_flag.clone();
            let poll_interval = config.poll_interval;
            std::thread::Builder::new()
                .name("mocap-recorder".into())
                .spawn(move || {
                    recorder_loop(receiver, session, pending, stop_flag, poll_interval);
                })
                .map_err(|e| MocapError::Spawn(e.to_string()))?
        };

        Ok(Recorder {
            session,
            sender: FrameSender { sender, pending },
            export: config.export,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// Handle for the sensor side.
    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    /// Queue a frame from the owner's thread.
    pub fn push(&self, frame: BodyFrame) -> Result<bool> {
        if !self.is_active() {
            return Err(MocapError::RecorderStopped);
        }
        self.sender.push(frame)
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn toggle_recording(&self) -> RecordingState {
        self.session.toggle_recording()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Wait until every queued frame has been processed.
    ///
    /// Returns `false` on timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.sender.pending.load(Ordering::SeqCst) > 0 {
            if Instant::now() >= deadline || !self.is_active() {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Render everything recorded so far as a BVH document.
    pub fn export(&self) -> String {
        self.session.export(&self.export)
    }

    /// Write the BVH document to `path`. Returns the number of frames written.
    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let frames = self.session.frames();
        let document = bvh::export(&frames, &self.export);
        std::fs::write(path, document)?;
        log::info!("Exported {} frames to {}", frames.len(), path.display());
        Ok(frames.len())
    }

    /// Check if the recorder thread is still running.
    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
    }

    /// Stop the recorder thread and wait for it to finish. Unprocessed frames are dropped.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drains the frame queue into the session until the stop flag is set.
///
/// Wakes every `poll_interval` when idle to check the flag.
fn recorder_loop(
    receiver: Receiver<BodyFrame>,
    session: SharedSession,
    pending: Arc<AtomicUsize>,
    stop_flag: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    log::info!("Recorder started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("Recorder stopping (stop flag set)");
            break;
        }

        let frame = match receiver.recv_timeout(poll_interval) {
            Ok(frame) => frame,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                log::info!("Frame channel disconnected, stopping recorder");
                break;
            }
        };

        if let Err(e) = session.on_frame_ready(&frame) {
            log::warn!("Rejected frame at {}us: {}", frame.timestamp_us, e);
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }

    stop_flag.store(true, Ordering::Relaxed);
}
