//! Pending-resize flag shared between the window and the frame loop
//!
//! The window's resize notification is the only writer and the frame loop the
//! only reader. Only the latest extent matters, so a flag plus one packed
//! extent is enough; no queue.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ash::vk;

/// Single-writer / single-reader resize notification
#[derive(Debug, Default)]
pub struct ResizeSignal {
    pending: AtomicBool,
    extent: AtomicU64,
}

impl ResizeSignal {
    /// Create a cleared signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resize to `width` x `height` (writer side)
    pub fn notify(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.extent.store(packed, Ordering::Relaxed);
        // Release pairs with the Acquire in `is_pending`/`take` so the extent is visible first
        self.pending.store(true, Ordering::Release);
    }

    /// True if a resize arrived and has not been consumed yet
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Last extent reported by the writer
    pub fn latest_extent(&self) -> vk::Extent2D {
        let packed = self.extent.load(Ordering::Relaxed);
        vk::Extent2D {
            width: (packed >> 32) as u32,
            height: packed as u32,
        }
    }

    /// Consume the pending resize, returning its extent
    pub fn take(&self) -> Option<vk::Extent2D> {
        if self.pending.swap(false, Ordering::Acquire) {
            Some(self.latest_extent())
        } else {
            None
        }
    }
}
