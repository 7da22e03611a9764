//! Per-frame acquire → record → submit/present protocol
//!
//! [`FrameRenderer`] is the only place that decides when the swapchain is
//! rebuilt. Staleness can surface at two independent points: acquisition
//! (the backend already knows the chain is invalid) and the post-submit
//! checkpoint (the backend reports it while presenting, or the window's
//! resize notification raced ahead of the backend). Both funnel into
//! [`FrameRenderer::recreate_swapchain`], and only at a frame boundary.

use std::rc::Rc;

use ash::vk;

use crate::render::swapchain_manager::is_drawable;
use crate::render::{
    CommandBufferPool, Drawable, FrameTarget, GraphicsDevice, PresentationSurface, RenderError,
    RenderResult, SwapchainManager, SwapchainStatus,
};

/// Where the renderer is inside the per-frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Between frames
    Idle,
    /// Waiting for a presentable image
    Acquiring,
    /// Filling the image's command buffer
    Recording,
    /// Submitting and presenting
    Submitting,
    /// Rebuilding the swapchain
    Recreating,
}

/// What happened to one call of [`FrameRenderer::draw_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was presented and the chain is still current
    Presented,
    /// The frame was presented, then the chain was rebuilt for the next one
    PresentedThenRecreated,
    /// Acquisition found the chain out of date; nothing was recorded or submitted
    Dropped,
}

/// Frame loop driver and swapchain lifecycle owner
pub struct FrameRenderer<D: GraphicsDevice> {
    // Field order is release order: buffers, then the chain, then the device handle
    command_buffers: CommandBufferPool<D>,
    swapchain: Option<SwapchainManager<D>>,
    device: Rc<D>,
    state: FrameState,
    current_image: Option<u32>,
    frames_presented: u64,
}

impl<D: GraphicsDevice> FrameRenderer<D> {
    /// Build the first swapchain generation and its command buffers
    ///
    /// Blocks while the surface is minimized.
    pub fn new<S, R>(device: Rc<D>, surface: &mut S, drawable: &mut R) -> RenderResult<Self>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        let mut renderer = Self {
            command_buffers: CommandBufferPool::new(Rc::clone(&device)),
            swapchain: None,
            device,
            state: FrameState::Idle,
            current_image: None,
            frames_presented: 0,
        };
        renderer.recreate_swapchain(surface, drawable)?;
        Ok(renderer)
    }

    /// Render until the surface asks to close, then wait for the device to go idle
    pub fn run<S, R>(&mut self, surface: &mut S, drawable: &mut R) -> RenderResult<()>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        log::info!("Entering frame loop");
        while !surface.should_close() {
            surface.poll_events();
            self.draw_frame(surface, drawable)?;
        }

        log::info!(
            "Frame loop finished after {} presented frames ({} swapchain rebuilds)",
            self.frames_presented,
            self.swapchain_sequence()
        );
        self.device.wait_idle()
    }

    /// Produce one frame
    ///
    /// On error the renderer is returned to [`FrameState::Idle`] so the caller
    /// may try again if the failure was transient.
    pub fn draw_frame<S, R>(&mut self, surface: &mut S, drawable: &mut R) -> RenderResult<FrameOutcome>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        debug_assert_eq!(self.state, FrameState::Idle);

        let outcome = self.advance_frame(surface, drawable);
        if outcome.is_err() {
            self.state = FrameState::Idle;
            self.current_image = None;
        }
        outcome
    }

    fn advance_frame<S, R>(&mut self, surface: &mut S, drawable: &mut R) -> RenderResult<FrameOutcome>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        self.state = FrameState::Acquiring;
        let (image_index, status) = self.swapchain_mut()?.acquire_next_image();
        match status {
            SwapchainStatus::OutOfDate => {
                log::warn!("Swapchain out of date on acquire, dropping frame");
                self.recreate_swapchain(surface, drawable)?;
                return Ok(FrameOutcome::Dropped);
            }
            SwapchainStatus::Failed(code) => return Err(RenderError::AcquireFailed(code)),
            SwapchainStatus::Success | SwapchainStatus::Suboptimal => {}
        }

        self.current_image = Some(image_index);
        self.state = FrameState::Recording;
        let command_buffer = self.record(image_index, drawable)?;

        self.state = FrameState::Submitting;
        let status = self.swapchain_mut()?.submit(command_buffer, image_index);
        self.current_image = None;
        if matches!(status, SwapchainStatus::Success | SwapchainStatus::Suboptimal) {
            self.frames_presented += 1;
        }

        if status.is_stale() || surface.was_resized() {
            log::debug!("Rebuilding swapchain after present (status {:?})", status);
            surface.reset_resized_flag();
            self.recreate_swapchain(surface, drawable)?;
            return Ok(FrameOutcome::PresentedThenRecreated);
        }
        if let SwapchainStatus::Failed(code) = status {
            return Err(RenderError::PresentFailed(code));
        }

        self.state = FrameState::Idle;
        log::trace!("Presented image {}", image_index);
        Ok(FrameOutcome::Presented)
    }

    /// Rebuild the swapchain against the surface's current extent
    ///
    /// Waits out a minimized surface, drains the device, migrates the old
    /// generation into the new one and resizes the command buffers to match.
    /// A zero extent reported by the backend sends it back to waiting. If the
    /// surface asks to close while minimized, returns without a new chain.
    pub fn recreate_swapchain<S, R>(&mut self, surface: &mut S, drawable: &mut R) -> RenderResult<()>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        self.state = FrameState::Recreating;
        let result = self.rebuild(surface, drawable);
        self.state = FrameState::Idle;
        result
    }

    fn rebuild<S, R>(&mut self, surface: &mut S, drawable: &mut R) -> RenderResult<()>
    where
        S: PresentationSurface,
        R: Drawable,
    {
        let next_sequence = self.swapchain.as_ref().map(|previous| previous.sequence() + 1);

        let swapchain = loop {
            let Some(extent) = wait_for_drawable_extent(surface) else {
                log::info!("Close requested while the surface was minimized");
                return Ok(());
            };

            self.device.wait_idle()?;
            let built = match self.swapchain.take() {
                None => SwapchainManager::create(&*self.device, extent)
                    .map(|fresh| fresh.with_sequence(next_sequence.unwrap_or(0))),
                Some(previous) => SwapchainManager::recreate(&*self.device, extent, previous),
            };

            match built {
                Ok(swapchain) => break swapchain,
                Err(RenderError::ZeroExtent { width, height }) => {
                    // The surface shrank to nothing after the window reported a size
                    log::debug!("Backend reported a {}x{} extent, waiting again", width, height);
                    surface.wait_events();
                }
                Err(e) => return Err(e),
            }
        };

        let (image_count, render_pass, extent) = (swapchain.image_count(), swapchain.render_pass(), swapchain.extent());
        self.swapchain = Some(swapchain);

        self.command_buffers.ensure_size(image_count)?;
        debug_assert_eq!(self.command_buffers.len(), image_count as usize);

        drawable.swapchain_rebuilt(render_pass, extent)
    }

    fn record<R: Drawable>(&self, image_index: u32, drawable: &mut R) -> RenderResult<vk::CommandBuffer> {
        let swapchain = self.swapchain_ref()?;
        debug_assert_eq!(self.command_buffers.len(), swapchain.image_count() as usize);

        let target = FrameTarget {
            command_buffer: self.command_buffers.get(image_index)?,
            image_index,
            render_pass: swapchain.render_pass(),
            framebuffer: swapchain.framebuffer(image_index)?,
            extent: swapchain.extent(),
        };

        self.device.begin_recording(&target)?;
        drawable.record(&target)?;
        self.device.finish_recording(target.command_buffer)?;
        Ok(target.command_buffer)
    }

    fn swapchain_ref(&self) -> RenderResult<&SwapchainManager<D>> {
        self.swapchain.as_ref().ok_or_else(missing_swapchain)
    }

    fn swapchain_mut(&mut self) -> RenderResult<&mut SwapchainManager<D>> {
        self.swapchain.as_mut().ok_or_else(missing_swapchain)
    }

    /// Current protocol state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Image acquired for the frame in progress, if any
    pub fn current_image(&self) -> Option<u32> {
        self.current_image
    }

    /// Image count of the active swapchain (0 if none)
    pub fn image_count(&self) -> u32 {
        self.swapchain.as_ref().map_or(0, SwapchainManager::image_count)
    }

    /// Number of per-image command buffers
    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    /// Extent of the active swapchain
    pub fn extent(&self) -> Option<vk::Extent2D> {
        self.swapchain.as_ref().map(SwapchainManager::extent)
    }

    /// Number of rebuilds since the first generation
    pub fn swapchain_sequence(&self) -> u64 {
        self.swapchain.as_ref().map_or(0, SwapchainManager::sequence)
    }

    /// Frames successfully handed to presentation
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl<D: GraphicsDevice> Drop for FrameRenderer<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            log::error!("Device wait failed during renderer teardown: {}", e);
        }
    }
}

/// Block on window events until the surface has a non-zero extent
///
/// Returns `None` if the surface asks to close while waiting.
pub fn wait_for_drawable_extent<S: PresentationSurface>(surface: &mut S) -> Option<vk::Extent2D> {
    let mut extent = surface.extent();
    if !is_drawable(extent) {
        log::debug!("Surface minimized, waiting for a drawable extent");
    }
    while !is_drawable(extent) {
        if surface.should_close() {
            return None;
        }
        surface.wait_events();
        extent = surface.extent();
    }
    Some(extent)
}

fn missing_swapchain() -> RenderError {
    RenderError::InvalidOperation {
        reason: "No active swapchain".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{extent, Call, MockDevice, MockDrawable, MockSurface};

    fn renderer(
        device: &Rc<MockDevice>,
        surface: &mut MockSurface,
        drawable: &mut MockDrawable,
    ) -> FrameRenderer<MockDevice> {
        FrameRenderer::new(Rc::clone(device), surface, drawable).unwrap()
    }

    #[test]
    fn test_new_builds_chain_and_matching_buffers() {
        let device = Rc::new(MockDevice::new().with_image_counts(&[3]));
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();

        let renderer = renderer(&device, &mut surface, &mut drawable);

        assert_eq!(renderer.image_count(), 3);
        assert_eq!(renderer.command_buffer_count(), 3);
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(drawable.rebuilds.len(), 1);
        assert_eq!(drawable.rebuilds[0].1, extent(800, 600));
    }

    #[test]
    fn test_successful_frame_returns_to_idle() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(renderer.current_image(), None);
        assert!(!surface.was_resized());
        assert_eq!(drawable.recorded, vec![0]);
        assert_eq!(renderer.frames_presented(), 1);
    }

    #[test]
    fn test_recording_happens_inside_begin_and_finish() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        let frame: Vec<_> = device
            .calls()
            .into_iter()
            .skip_while(|call| !matches!(call, Call::Acquire { .. }))
            .collect();
        assert!(matches!(frame[1], Call::BeginRecording { image_index: 0, .. }));
        assert!(matches!(frame[2], Call::FinishRecording { .. }));
        assert!(matches!(frame[3], Call::Submit { image_index: 0, .. }));
    }

    #[test]
    fn test_suboptimal_acquire_still_draws() {
        let device = Rc::new(MockDevice::new());
        device.script_acquire(&[SwapchainStatus::Suboptimal]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(renderer.swapchain_sequence(), 0);
    }

    #[test]
    fn test_acquire_failure_is_fatal() {
        let device = Rc::new(MockDevice::new());
        device.script_acquire(&[SwapchainStatus::Failed(vk::Result::ERROR_DEVICE_LOST)]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let result = renderer.draw_frame(&mut surface, &mut drawable);

        assert!(matches!(result, Err(RenderError::AcquireFailed(vk::Result::ERROR_DEVICE_LOST))));
        assert!(drawable.recorded.is_empty());
    }

    #[test]
    fn test_present_failure_is_fatal() {
        let device = Rc::new(MockDevice::new());
        device.script_submit(&[SwapchainStatus::Failed(vk::Result::ERROR_SURFACE_LOST_KHR)]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let result = renderer.draw_frame(&mut surface, &mut drawable);

        assert!(matches!(result, Err(RenderError::PresentFailed(_))));
    }

    #[test]
    fn test_failed_present_with_pending_resize_rebuilds() {
        let device = Rc::new(MockDevice::new());
        device.script_submit(&[SwapchainStatus::Failed(vk::Result::ERROR_SURFACE_LOST_KHR)]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        surface.flag_resized();
        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert_eq!(outcome, FrameOutcome::PresentedThenRecreated);
        assert_eq!(renderer.swapchain_sequence(), 1);
        assert_eq!(renderer.frames_presented(), 0);
        assert!(!surface.was_resized());
    }

    #[test]
    fn test_frame_after_fatal_error_starts_from_idle() {
        let device = Rc::new(MockDevice::new());
        device.script_submit(&[SwapchainStatus::Failed(vk::Result::ERROR_SURFACE_LOST_KHR)]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        assert!(renderer.draw_frame(&mut surface, &mut drawable).is_err());
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(renderer.current_image(), None);

        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented);
    }

    #[test]
    fn test_backend_zero_extent_waits_and_rebuilds() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);
        let first_id = device.last_swapchain_id();

        device.script_zero_extent_builds(1);
        device.script_acquire(&[SwapchainStatus::OutOfDate]);
        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert_eq!(outcome, FrameOutcome::Dropped);
        assert_eq!(surface.waits, 1);
        assert!(device.calls().contains(&Call::DropSwapchain { id: first_id }));
        assert_eq!(renderer.image_count(), 2);
        assert_eq!(renderer.command_buffer_count(), 2);
        assert_eq!(renderer.swapchain_sequence(), 1);
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(drawable.rebuilds.len(), 2);

        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented);
    }

    #[test]
    fn test_close_while_minimized_skips_creation() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(0, 0).closing_after_waits(2);
        let mut drawable = MockDrawable::default();

        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        assert_eq!(surface.waits, 2);
        assert_eq!(renderer.image_count(), 0);
        assert!(drawable.rebuilds.is_empty());
        assert_eq!(device.count(|call| matches!(call, Call::BuildSwapchain { .. })), 0);

        renderer.run(&mut surface, &mut drawable).unwrap();
        assert_eq!(renderer.frames_presented(), 0);
    }

    #[test]
    fn test_recording_failure_is_fatal_and_skips_submit() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::failing();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let result = renderer.draw_frame(&mut surface, &mut drawable);

        assert!(matches!(result, Err(RenderError::Recording(_))));
        assert_eq!(device.count(|call| matches!(call, Call::Submit { .. })), 0);
    }

    #[test]
    fn test_out_of_date_present_rebuilds_for_next_frame() {
        let device = Rc::new(MockDevice::new());
        device.script_submit(&[SwapchainStatus::OutOfDate]);
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        let outcome = renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert_eq!(outcome, FrameOutcome::PresentedThenRecreated);
        assert_eq!(renderer.swapchain_sequence(), 1);
        assert_eq!(renderer.state(), FrameState::Idle);
    }

    #[test]
    fn test_resize_flag_alone_triggers_rebuild() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        surface.resize_to(1280, 720);
        renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        assert!(!surface.was_resized());
        assert_eq!(renderer.extent(), Some(extent(1280, 720)));
        assert_eq!(drawable.rebuilds.last().map(|r| r.1), Some(extent(1280, 720)));
    }

    #[test]
    fn test_run_stops_on_close_and_waits_idle() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600).closing_after(4);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);

        renderer.run(&mut surface, &mut drawable).unwrap();

        assert_eq!(renderer.frames_presented(), 4);
        assert_eq!(device.calls().last(), Some(&Call::WaitIdle));
    }

    #[test]
    fn test_drop_waits_for_device_before_releasing() {
        let device = Rc::new(MockDevice::new());
        let mut surface = MockSurface::fixed(800, 600);
        let mut drawable = MockDrawable::default();
        let mut renderer = renderer(&device, &mut surface, &mut drawable);
        renderer.draw_frame(&mut surface, &mut drawable).unwrap();

        drop(renderer);

        let calls = device.calls();
        let tail: Vec<_> = calls.iter().rev().take(3).rev().collect();
        assert_eq!(tail[0], &Call::WaitIdle);
        assert!(matches!(tail[1], Call::Free { .. }));
        assert!(matches!(tail[2], Call::DropSwapchain { .. }));
    }
}
