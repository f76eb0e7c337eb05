//! Non-blocking frame admission
//!
//! At most one frame's geometry + draw sequence runs at a time. A frame that
//! arrives while another is in flight is dropped, never queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;

#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    in_flight: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a frame, or return `None` (and count a skip) if one is running.
    pub fn try_begin(&self) -> Option<FrameTicket> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(FrameTicket {
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Frame skipped, previous frame still in flight ({} skipped)", skipped);
            None
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Held for the duration of one frame; releases the gate on drop.
#[derive(Debug)]
pub struct FrameTicket {
    in_flight: Arc<AtomicBool>,
}

impl Drop for FrameTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
