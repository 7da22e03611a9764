//! Semaphores and fences with RAII cleanup

use ash::prelude::VkResult;
use ash::{vk, Device};

use crate::render::RenderResult;

/// GPU-GPU synchronization primitive
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create a new binary semaphore
    pub fn new(device: Device) -> RenderResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe { device.create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// CPU-GPU synchronization primitive
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a new fence
    pub fn new(device: Device, signaled: bool) -> RenderResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe { device.create_fence(&create_info, None)? };
        Ok(Self { device, fence })
    }

    /// Wait for the fence to be signaled
    ///
    /// Returns the raw Vulkan result so callers can map it to a swapchain status.
    pub fn wait(&self, timeout: u64) -> VkResult<()> {
        unsafe { self.device.wait_for_fences(&[self.fence], true, timeout) }
    }

    /// Return the fence to the unsignaled state
    pub fn reset(&self) -> VkResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]) }
    }

    /// Get the fence handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Per-slot objects for one frame in flight
///
/// The fence starts signaled so the first wait on a fresh slot returns
/// immediately.
pub struct FrameSync {
    /// Signaled by acquisition, waited on by the submission
    pub image_available: Semaphore,
    /// Signaled when the slot's submission completes
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the synchronization objects for one slot
    pub fn new(device: &Device) -> RenderResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device.clone(), true)?,
        })
    }

    /// Replace the fence if a failed submission left it unsignaled
    ///
    /// Only valid while the device is idle.
    pub fn ensure_signaled(&mut self, device: &Device) -> RenderResult<()> {
        let signaled = unsafe { device.get_fence_status(self.in_flight.handle())? };
        if !signaled {
            log::debug!("Replacing unsignaled frame fence");
            self.in_flight = Fence::new(device.clone(), true)?;
        }
        Ok(())
    }
}
