//! Bounded Blocking Frame Queue
//!
//! The sole synchronization primitive between the real-time callback and
//! the processing thread. Producer/consumer with a hard capacity bound:
//! a full queue blocks the producer instead of growing memory, which is
//! the explicit backpressure control. A slow pipeline therefore stalls
//! the callback thread - an intentional latency/robustness trade, and the
//! reason the pipeline must drain fast enough that the bound is never hit
//! in steady state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// One block of interleaved f32 samples; ownership transfers on push/pop
pub type AudioFrame = Vec<f32>;

/// Default queue bound in frames
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Thread-safe bounded FIFO of audio frames
///
/// Shutdown is a one-way transition: once signalled it is never cleared,
/// every blocked thread wakes, pushes become silent drops and pops drain
/// whatever is left before returning `None`.
pub struct BufferQueue {
    frames: Mutex<VecDeque<AudioFrame>>,
    has_data: Condvar,
    has_space: Condvar,
    capacity: usize,
    done: AtomicBool,
}

impl BufferQueue {
    /// Create a queue holding at most `capacity` frames
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            has_data: Condvar::new(),
            has_space: Condvar::new(),
            capacity,
            done: AtomicBool::new(false),
        }
    }

    /// Add a frame, blocking while the queue is full
    ///
    /// If shutdown is observed (before or while waiting) the frame is
    /// discarded and the call returns - lost-frame semantics during
    /// teardown, not an error.
    pub fn push(&self, frame: AudioFrame) {
        let mut frames = self.frames.lock();
        while frames.len() >= self.capacity && !self.done.load(Ordering::Relaxed) {
            self.has_space.wait(&mut frames);
        }
        if self.done.load(Ordering::Relaxed) {
            return;
        }
        frames.push_back(frame);
        drop(frames);
        self.has_data.notify_one();
    }

    /// Remove the front frame, blocking while the queue is empty
    ///
    /// Returns `None` only when the queue is empty AND shut down; frames
    /// still queued at shutdown are drained first, in FIFO order.
    pub fn pop(&self) -> Option<AudioFrame> {
        let mut frames = self.frames.lock();
        while frames.is_empty() && !self.done.load(Ordering::Relaxed) {
            self.has_data.wait(&mut frames);
        }
        let frame = frames.pop_front();
        drop(frames);
        if frame.is_some() {
            self.has_space.notify_one();
        }
        frame
    }

    /// Signal shutdown and wake every blocked producer and consumer
    ///
    /// One-way and idempotent; safe to call from any thread.
    pub fn shutdown(&self) {
        {
            // Holding the lock while setting the flag closes the window
            // between a waiter's condition check and its wait
            let _frames = self.frames.lock();
            self.done.store(true, Ordering::Relaxed);
        }
        self.has_data.notify_all();
        self.has_space.notify_all();
    }

    /// Number of frames currently queued
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn is_shutdown(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }
}
