//! The data-link front object: load data, start/stop a run, observe.
//!
//! `DataLink` owns the frame set and runs the transmission on a worker
//! thread, handing the observer an `mpsc::Receiver` of [`Event`]s. The
//! receiver disconnects when the run ends, so `for event in rx` is the
//! whole observer loop. One run at a time; frame state is written back
//! when the worker finishes or is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use linksim_frame::{segment, Frame};

use crate::channel::Channel;
use crate::engine::{transmit, EngineConfig};
use crate::error::{LinkError, Result};
use crate::event::Event;

/// Cloneable handle that requests cooperative cancellation.
///
/// Separate from [`DataLink`] so signal handlers and other threads can
/// hold one without borrowing the link.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the run stop before its next frame.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

/// A simulated data-link endpoint.
pub struct DataLink {
    frames: Arc<Mutex<Vec<Frame>>>,
    running: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    config: EngineConfig,
    seed: Option<u64>,
}

impl DataLink {
    /// Link with default timing and an entropy-seeded channel.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Link with explicit engine configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            frames: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
            config,
            seed: None,
        }
    }

    /// Use a fixed channel seed, making every run reproducible.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Segment `data` into frames, replacing any previous frame set.
    ///
    /// Returns the number of frames created. Rejected while a run is
    /// active.
    pub fn load(&mut self, data: &[u8]) -> Result<usize> {
        if self.running.load(Ordering::SeqCst) {
            return Err(LinkError::AlreadyRunning);
        }
        self.reap_worker();

        let frames = segment(data)?;
        let count = frames.len();
        *self.frames.lock().expect("frame set lock poisoned") = frames;
        Ok(count)
    }

    /// Start a transmission run on a worker thread.
    ///
    /// The returned receiver yields every [`Event`] of the run and
    /// disconnects when the worker exits. Errors when no frames are
    /// loaded or a run is already active.
    pub fn start(&mut self) -> Result<Receiver<Event>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(LinkError::AlreadyRunning);
        }
        if self.frames.lock().expect("frame set lock poisoned").is_empty() {
            self.running.store(false, Ordering::SeqCst);
            return Err(LinkError::NoFrames);
        }
        self.reap_worker();
        self.cancel.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let frames = Arc::clone(&self.frames);
        let running = Arc::clone(&self.running);
        let cancel = Arc::clone(&self.cancel);
        let config = self.config.clone();
        let seed = self.seed;

        self.worker = Some(thread::spawn(move || {
            let mut local = frames.lock().expect("frame set lock poisoned").clone();
            let mut channel = match seed {
                Some(seed) => Channel::from_seed(seed),
                None => Channel::from_entropy(),
            };
            let _ = transmit(&mut local, &mut channel, &config, &tx, &cancel);
            // Publish final frame states (cancelled runs included)
            // before the observer sees the channel close.
            *frames.lock().expect("frame set lock poisoned") = local;
            running.store(false, Ordering::SeqCst);
        }));

        Ok(rx)
    }

    /// Request cooperative cancellation of the active run.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// A cloneable stop handle for use from other threads.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the frame set.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().expect("frame set lock poisoned").clone()
    }

    fn reap_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Default for DataLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DataLink {
    fn drop(&mut self) {
        self.stop();
        self.reap_worker();
    }
}
