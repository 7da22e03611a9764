//! Scripted stand-ins for the GPU, the window and the drawing callback
//!
//! Every device-side operation is appended to a shared call log so tests can
//! assert on ordering (for example that a swapchain generation is only
//! dropped after a device idle wait).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use ash::vk::{self, Handle};

use crate::render::{
    Drawable, FrameTarget, GraphicsDevice, PresentationSurface, RenderError, RenderResult,
    SwapchainBackend, SwapchainStatus,
};

/// Shorthand for building an extent
pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

/// One logged device-side operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    WaitIdle,
    Allocate { count: u32 },
    Free { buffers: Vec<vk::CommandBuffer> },
    BuildSwapchain { extent: (u32, u32), migrated_from: Option<u64> },
    DropSwapchain { id: u64 },
    Acquire { swapchain: u64, status: SwapchainStatus },
    BeginRecording { buffer: vk::CommandBuffer, image_index: u32 },
    FinishRecording { buffer: vk::CommandBuffer },
    Submit { swapchain: u64, buffer: vk::CommandBuffer, image_index: u32, status: SwapchainStatus },
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    next_buffer: u64,
    next_swapchain: u64,
    image_counts: VecDeque<u32>,
    acquire_script: VecDeque<SwapchainStatus>,
    submit_script: VecDeque<SwapchainStatus>,
    zero_extent_builds: u32,
}

impl MockState {
    fn log(&mut self, call: Call) {
        self.calls.push(call);
    }
}

/// Scripted [`GraphicsDevice`]
pub struct MockDevice {
    state: Rc<RefCell<MockState>>,
}

impl MockDevice {
    /// Device whose swapchains have two images and always succeed
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    /// Image counts for successive generations; the last one repeats
    pub fn with_image_counts(self, counts: &[u32]) -> Self {
        self.state.borrow_mut().image_counts = counts.iter().copied().collect();
        self
    }

    /// Statuses returned by the next acquisitions, then `Success`
    pub fn script_acquire(&self, statuses: &[SwapchainStatus]) {
        self.state.borrow_mut().acquire_script.extend(statuses.iter().copied());
    }

    /// Statuses returned by the next presents, then `Success`
    pub fn script_submit(&self, statuses: &[SwapchainStatus]) {
        self.state.borrow_mut().submit_script.extend(statuses.iter().copied());
    }

    /// Make the next `count` builds fail with a zero extent, as a surface
    /// minimized between the size query and the build would
    pub fn script_zero_extent_builds(&self, count: u32) {
        self.state.borrow_mut().zero_extent_builds = count;
    }

    /// Snapshot of the call log
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Number of logged calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Id of the most recently built swapchain
    pub fn last_swapchain_id(&self) -> u64 {
        self.state.borrow().next_swapchain - 1
    }

    fn next_image_count(state: &mut MockState) -> u32 {
        if state.image_counts.len() > 1 {
            state.image_counts.pop_front().unwrap_or(2)
        } else {
            state.image_counts.front().copied().unwrap_or(2)
        }
    }
}

impl GraphicsDevice for MockDevice {
    type Swapchain = MockSwapchain;

    fn wait_idle(&self) -> RenderResult<()> {
        self.state.borrow_mut().log(Call::WaitIdle);
        Ok(())
    }

    fn allocate_command_buffers(&self, count: u32) -> RenderResult<Vec<vk::CommandBuffer>> {
        let mut state = self.state.borrow_mut();
        state.log(Call::Allocate { count });
        let buffers = (0..count)
            .map(|_| {
                state.next_buffer += 1;
                vk::CommandBuffer::from_raw(state.next_buffer)
            })
            .collect();
        Ok(buffers)
    }

    fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        self.state.borrow_mut().log(Call::Free {
            buffers: buffers.to_vec(),
        });
    }

    fn begin_recording(&self, target: &FrameTarget) -> RenderResult<()> {
        self.state.borrow_mut().log(Call::BeginRecording {
            buffer: target.command_buffer,
            image_index: target.image_index,
        });
        Ok(())
    }

    fn finish_recording(&self, command_buffer: vk::CommandBuffer) -> RenderResult<()> {
        self.state.borrow_mut().log(Call::FinishRecording {
            buffer: command_buffer,
        });
        Ok(())
    }

    fn build_swapchain(
        &self,
        extent: vk::Extent2D,
        previous: Option<MockSwapchain>,
    ) -> RenderResult<MockSwapchain> {
        let zero_extent = {
            let mut state = self.state.borrow_mut();
            let scripted = state.zero_extent_builds > 0;
            state.zero_extent_builds = state.zero_extent_builds.saturating_sub(1);
            scripted
        };
        if zero_extent {
            // Like the Vulkan backend, a failed build still consumes the old generation
            drop(previous);
            return Err(RenderError::ZeroExtent { width: 0, height: 0 });
        }

        let swapchain = {
            let mut state = self.state.borrow_mut();
            let id = state.next_swapchain;
            state.next_swapchain += 1;
            let image_count = Self::next_image_count(&mut state);
            state.log(Call::BuildSwapchain {
                extent: (extent.width, extent.height),
                migrated_from: previous.as_ref().map(|old| old.id),
            });
            MockSwapchain {
                id,
                extent,
                image_count,
                next_image: 0,
                state: Rc::clone(&self.state),
            }
        };
        // The old generation is retired once the new one exists
        drop(previous);
        Ok(swapchain)
    }
}

/// Generation produced by [`MockDevice`]
pub struct MockSwapchain {
    id: u64,
    extent: vk::Extent2D,
    image_count: u32,
    next_image: u32,
    state: Rc<RefCell<MockState>>,
}

impl SwapchainBackend for MockSwapchain {
    fn image_count(&self) -> u32 {
        self.image_count
    }

    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn render_pass(&self) -> vk::RenderPass {
        vk::RenderPass::from_raw(self.id + 1)
    }

    fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        vk::Framebuffer::from_raw((self.id + 1) * 100 + index as u64)
    }

    fn acquire_next_image(&mut self) -> (u32, SwapchainStatus) {
        let mut state = self.state.borrow_mut();
        let status = state.acquire_script.pop_front().unwrap_or(SwapchainStatus::Success);
        state.log(Call::Acquire {
            swapchain: self.id,
            status,
        });
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        (index, status)
    }

    fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> SwapchainStatus {
        let mut state = self.state.borrow_mut();
        let status = state.submit_script.pop_front().unwrap_or(SwapchainStatus::Success);
        state.log(Call::Submit {
            swapchain: self.id,
            buffer: command_buffer,
            image_index,
            status,
        });
        status
    }
}

impl Drop for MockSwapchain {
    fn drop(&mut self) {
        self.state.borrow_mut().log(Call::DropSwapchain { id: self.id });
    }
}

/// Scripted [`PresentationSurface`]
pub struct MockSurface {
    extents: VecDeque<vk::Extent2D>,
    resized: bool,
    close_after: Option<usize>,
    close_after_waits: Option<usize>,
    pub polls: usize,
    pub waits: usize,
}

impl MockSurface {
    /// Surface that always reports `width` x `height`
    pub fn fixed(width: u32, height: u32) -> Self {
        Self::sequence(&[extent(width, height)])
    }

    /// Surface reporting `extents` on successive queries; the last one repeats
    pub fn sequence(extents: &[vk::Extent2D]) -> Self {
        Self {
            extents: extents.iter().copied().collect(),
            resized: false,
            close_after: None,
            close_after_waits: None,
            polls: 0,
            waits: 0,
        }
    }

    /// Request close once `polls` event polls have happened
    pub fn closing_after(mut self, polls: usize) -> Self {
        self.close_after = Some(polls);
        self
    }

    /// Request close once `waits` event waits have happened
    pub fn closing_after_waits(mut self, waits: usize) -> Self {
        self.close_after_waits = Some(waits);
        self
    }

    /// Simulate the window's resize notification
    pub fn resize_to(&mut self, width: u32, height: u32) {
        self.extents = VecDeque::from([extent(width, height)]);
        self.resized = true;
    }

    /// Replace the extents reported from now on
    pub fn set_extents(&mut self, extents: &[vk::Extent2D]) {
        self.extents = extents.iter().copied().collect();
    }

    /// Raise the resize flag without changing the extent
    pub fn flag_resized(&mut self) {
        self.resized = true;
    }
}

impl PresentationSurface for MockSurface {
    fn extent(&self) -> vk::Extent2D {
        self.extents.front().copied().unwrap_or_default()
    }

    fn should_close(&self) -> bool {
        self.close_after.is_some_and(|limit| self.polls >= limit)
            || self.close_after_waits.is_some_and(|limit| self.waits >= limit)
    }

    fn poll_events(&mut self) {
        self.polls += 1;
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        if self.extents.len() > 1 {
            self.extents.pop_front();
        }
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized_flag(&mut self) {
        self.resized = false;
    }
}

/// Drawing callback that remembers what it was asked to do
#[derive(Default)]
pub struct MockDrawable {
    pub recorded: Vec<u32>,
    pub rebuilds: Vec<(vk::RenderPass, vk::Extent2D)>,
    fail: bool,
}

impl MockDrawable {
    /// Drawable whose recording always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Drawable for MockDrawable {
    fn swapchain_rebuilt(&mut self, render_pass: vk::RenderPass, extent: vk::Extent2D) -> RenderResult<()> {
        self.rebuilds.push((render_pass, extent));
        Ok(())
    }

    fn record(&mut self, target: &FrameTarget) -> RenderResult<()> {
        if self.fail {
            return Err(RenderError::Recording("scripted failure".to_string()));
        }
        self.recorded.push(target.image_index);
        Ok(())
    }
}
