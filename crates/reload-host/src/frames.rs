//! # Frame Scheduler
//!
//! Fixed-rate tick loop standing in for the game server's frame callback.
//! Runs on the thread that calls [`FrameScheduler::run_until`]; registered
//! callbacks are invoked there and nowhere else.

use skin_reload::TickScheduler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Host frame loop.
pub struct FrameScheduler {
    interval: Duration,
    callbacks: Vec<Box<dyn FnMut()>>,
    frames: u64,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            callbacks: Vec::new(),
            frames: 0,
        }
    }

    /// Run every registered callback once, in registration order.
    pub fn run_frame(&mut self) {
        self.frames += 1;
        for callback in &mut self.callbacks {
            callback();
        }
    }

    /// Tick at the configured rate until `stop` is set.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        debug!(interval_us = self.interval.as_micros() as u64, "Frame loop started");
        let mut next = Instant::now();

        while !stop.load(Ordering::Acquire) {
            self.run_frame();

            next += self.interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                let behind = now - next;
                if behind > self.interval * 10 {
                    warn!(behind_ms = behind.as_millis() as u64, "Frame loop falling behind");
                }
                // Don't try to catch up with a burst of frames.
                next = now;
            }
        }

        debug!(frames = self.frames, "Frame loop stopped");
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TickScheduler for FrameScheduler {
    fn register_tick_callback(&mut self, callback: Box<dyn FnMut()>) {
        self.callbacks.push(callback);
    }
}
