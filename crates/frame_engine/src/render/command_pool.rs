//! One command buffer per swapchain image
//!
//! The pool is resized in lockstep with the swapchain. A size change frees
//! every buffer and allocates a fresh set; buffers are never partially reused.

use std::rc::Rc;

use ash::vk;

use crate::render::{GraphicsDevice, RenderError, RenderResult};

/// Per-image command buffers, indexed by swapchain image index
pub struct CommandBufferPool<D: GraphicsDevice> {
    device: Rc<D>,
    buffers: Vec<vk::CommandBuffer>,
}

impl<D: GraphicsDevice> CommandBufferPool<D> {
    /// Create an empty pool
    pub fn new(device: Rc<D>) -> Self {
        Self {
            device,
            buffers: Vec::new(),
        }
    }

    /// Make the pool hold exactly `count` buffers
    ///
    /// Returns `true` if the buffers were reallocated.
    pub fn ensure_size(&mut self, count: u32) -> RenderResult<bool> {
        if self.buffers.len() == count as usize {
            return Ok(false);
        }

        log::debug!(
            "Resizing command buffer pool from {} to {} buffers",
            self.buffers.len(),
            count
        );
        self.release();

        let buffers = self.device.allocate_command_buffers(count)?;
        if buffers.len() != count as usize {
            self.device.free_command_buffers(&buffers);
            return Err(RenderError::InvalidOperation {
                reason: format!(
                    "Device allocated {} command buffers, expected {}",
                    buffers.len(),
                    count
                ),
            });
        }
        self.buffers = buffers;
        Ok(true)
    }

    /// Buffer for swapchain image `image_index`
    pub fn get(&self, image_index: u32) -> RenderResult<vk::CommandBuffer> {
        self.buffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| RenderError::InvalidOperation {
                reason: format!(
                    "No command buffer for image {} (pool holds {})",
                    image_index,
                    self.buffers.len()
                ),
            })
    }

    /// Number of buffers currently held
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// True if no buffers are allocated
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    fn release(&mut self) {
        if !self.buffers.is_empty() {
            self.device.free_command_buffers(&self.buffers);
            self.buffers.clear();
        }
    }
}

impl<D: GraphicsDevice> Drop for CommandBufferPool<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, MockDevice};

    #[test]
    fn test_ensure_size_allocates_once() {
        let device = Rc::new(MockDevice::new());
        let mut pool = CommandBufferPool::new(Rc::clone(&device));

        assert!(pool.ensure_size(3).unwrap());
        assert!(!pool.ensure_size(3).unwrap());

        assert_eq!(pool.len(), 3);
        assert_eq!(device.count(|call| matches!(call, Call::Allocate { .. })), 1);
        assert_eq!(device.count(|call| matches!(call, Call::Free { .. })), 0);
    }

    #[test]
    fn test_resize_frees_everything_and_allocates_fresh() {
        let device = Rc::new(MockDevice::new());
        let mut pool = CommandBufferPool::new(Rc::clone(&device));

        pool.ensure_size(2).unwrap();
        let old = [pool.get(0).unwrap(), pool.get(1).unwrap()];

        pool.ensure_size(3).unwrap();
        let new: Vec<_> = (0..3).map(|i| pool.get(i).unwrap()).collect();

        assert!(new.iter().all(|buffer| !old.contains(buffer)));
        assert!(device.calls().contains(&Call::Free { buffers: old.to_vec() }));
    }

    #[test]
    fn test_get_out_of_range_is_an_error() {
        let device = Rc::new(MockDevice::new());
        let mut pool = CommandBufferPool::new(device);
        pool.ensure_size(2).unwrap();

        assert!(matches!(pool.get(2), Err(RenderError::InvalidOperation { .. })));
    }

    #[test]
    fn test_drop_frees_buffers() {
        let device = Rc::new(MockDevice::new());
        {
            let mut pool = CommandBufferPool::new(Rc::clone(&device));
            pool.ensure_size(2).unwrap();
        }
        assert_eq!(device.count(|call| matches!(call, Call::Free { .. })), 1);
    }
}
