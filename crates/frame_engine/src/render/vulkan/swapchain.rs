//! One Vulkan swapchain generation
//!
//! Owns the swapchain handle, its image views, per-image depth buffers and
//! framebuffers, and the synchronization objects used to pace frames. When a
//! generation is rebuilt, the render pass (if the color format is unchanged)
//! and the per-slot sync objects move into the successor.

use std::rc::Rc;

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::render::vulkan::framebuffer::{DepthBuffer, Framebuffer, ImageView};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::sync::{FrameSync, Semaphore};
use crate::render::vulkan::VulkanDevice;
use crate::render::{RenderError, RenderResult, SwapchainBackend, SwapchainStatus};

/// Presentable images plus everything built on top of them
pub struct VulkanSwapchain {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,

    framebuffers: Vec<Framebuffer>,
    depth_buffers: Vec<DepthBuffer>,
    image_views: Vec<ImageView>,
    render_pass: Rc<RenderPass>,

    // One per image
    render_finished: Vec<Semaphore>,
    images_in_flight: Vec<vk::Fence>,
    // One per frame in flight
    frames: Vec<FrameSync>,
    current_frame: usize,

    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl VulkanSwapchain {
    /// Build a generation for `window_extent`, migrating from `previous` if given
    ///
    /// The device must be idle when `previous` is supplied.
    pub fn new(device: &VulkanDevice, window_extent: vk::Extent2D, mut previous: Option<Self>) -> RenderResult<Self> {
        let physical = device.physical();
        let surface = device.surface();
        let raw = device.raw().clone();

        let capabilities = surface.capabilities(physical.device)?;
        let format = choose_surface_format(&surface.formats(physical.device)?)?;
        let present_mode =
            choose_present_mode(&surface.present_modes(physical.device)?, device.config().prefer_mailbox);
        let extent = choose_extent(&capabilities, window_extent);
        if extent.width == 0 || extent.height == 0 {
            return Err(RenderError::ZeroExtent {
                width: extent.width,
                height: extent.height,
            });
        }
        let min_image_count = choose_image_count(&capabilities);

        let queue_families = [physical.graphics_family, physical.present_family];
        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(min_image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(previous.as_ref().map_or(vk::SwapchainKHR::null(), |old| old.swapchain));

        create_info = if physical.graphics_family == physical.present_family {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_families)
        };

        let loader = SwapchainLoader::new(device.instance(), &raw);
        let swapchain = unsafe { loader.create_swapchain(&create_info, None)? };

        // Salvage what can be reused; the old chain is retired once its
        // replacement render pass exists
        let (reused_pass, frames) = match previous.as_mut() {
            Some(old) => (
                (old.render_pass.color_format() == format.format).then(|| Rc::clone(&old.render_pass)),
                std::mem::take(&mut old.frames),
            ),
            None => (None, Vec::new()),
        };
        let render_pass = match reused_pass {
            Some(render_pass) => render_pass,
            None => match RenderPass::new_forward_pass(raw.clone(), format.format) {
                Ok(render_pass) => Rc::new(render_pass),
                Err(e) => {
                    unsafe { loader.destroy_swapchain(swapchain, None) };
                    return Err(e);
                }
            },
        };
        drop(previous);

        let mut generation = Self {
            device: raw.clone(),
            loader,
            swapchain,
            graphics_queue: device.logical().graphics_queue(),
            present_queue: device.logical().present_queue(),
            framebuffers: Vec::new(),
            depth_buffers: Vec::new(),
            image_views: Vec::new(),
            render_pass,
            render_finished: Vec::new(),
            images_in_flight: Vec::new(),
            frames,
            current_frame: 0,
            format,
            extent,
        };
        generation.build_attachments(device)?;
        generation.prepare_frames(device.config().max_frames_in_flight)?;

        log::debug!(
            "Swapchain format {:?}, present mode {:?}, {} images, {} frames in flight",
            format.format,
            present_mode,
            generation.image_views.len(),
            generation.frames.len()
        );

        Ok(generation)
    }

    fn build_attachments(&mut self, device: &VulkanDevice) -> RenderResult<()> {
        let images = unsafe { self.loader.get_swapchain_images(self.swapchain)? };

        for &image in &images {
            let color = ImageView::new(self.device.clone(), image, self.format.format, vk::ImageAspectFlags::COLOR)?;
            let depth = DepthBuffer::new(self.device.clone(), device.physical(), self.extent)?;
            let framebuffer = Framebuffer::new(
                self.device.clone(),
                self.render_pass.handle(),
                &[color.handle(), depth.image_view()],
                self.extent,
            )?;

            self.image_views.push(color);
            self.depth_buffers.push(depth);
            self.framebuffers.push(framebuffer);
            self.render_finished.push(Semaphore::new(self.device.clone())?);
        }

        self.images_in_flight = vec![vk::Fence::null(); images.len()];
        Ok(())
    }

    fn prepare_frames(&mut self, frames_in_flight: usize) -> RenderResult<()> {
        for frame in &mut self.frames {
            frame.ensure_signaled(&self.device)?;
        }
        self.frames.truncate(frames_in_flight);
        while self.frames.len() < frames_in_flight {
            self.frames.push(FrameSync::new(&self.device)?);
        }
        Ok(())
    }
}

impl SwapchainBackend for VulkanSwapchain {
    fn image_count(&self) -> u32 {
        self.image_views.len() as u32
    }

    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index].handle()
    }

    fn acquire_next_image(&mut self) -> (u32, SwapchainStatus) {
        let frame = &self.frames[self.current_frame];
        let frame_fence = frame.in_flight.handle();

        if let Err(e) = frame.in_flight.wait(u64::MAX) {
            return (0, SwapchainStatus::Failed(e));
        }

        let acquired = unsafe {
            self.loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                frame.image_available.handle(),
                vk::Fence::null(),
            )
        };
        let (index, status) = match acquired {
            Ok((index, suboptimal)) => (index, SwapchainStatus::from_suboptimal(suboptimal)),
            Err(e) => return (0, SwapchainStatus::from_error(e)),
        };

        // The image may still be in use by a frame from another slot
        let image_fence = self.images_in_flight[index as usize];
        if image_fence != vk::Fence::null() && image_fence != frame_fence {
            if let Err(e) = unsafe { self.device.wait_for_fences(&[image_fence], true, u64::MAX) } {
                return (index, SwapchainStatus::Failed(e));
            }
        }
        self.images_in_flight[index as usize] = frame_fence;

        (index, status)
    }

    fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> SwapchainStatus {
        let frame = &self.frames[self.current_frame];

        let wait_semaphores = [frame.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.render_finished[image_index as usize].handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let submitted = frame.in_flight.reset().and_then(|()| unsafe {
            self.device
                .queue_submit(self.graphics_queue, &[submit_info.build()], frame.in_flight.handle())
        });
        if let Err(e) = submitted {
            return SwapchainStatus::Failed(e);
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let status = match unsafe { self.loader.queue_present(self.present_queue, &present_info) } {
            Ok(suboptimal) => SwapchainStatus::from_suboptimal(suboptimal),
            Err(e) => SwapchainStatus::from_error(e),
        };

        self.current_frame = (self.current_frame + 1) % self.frames.len();
        status
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        // Everything referencing the images goes before the swapchain itself
        self.framebuffers.clear();
        self.depth_buffers.clear();
        self.image_views.clear();
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> RenderResult<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.first())
        .copied()
        .ok_or_else(|| RenderError::InitializationFailed("Surface reports no formats".to_string()))
}

fn choose_present_mode(modes: &[vk::PresentModeKHR], prefer_mailbox: bool) -> vk::PresentModeKHR {
    if prefer_mailbox && modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: window_extent
            .width
            .clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: window_extent
            .height
            .clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities() -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D {
                width: 1024,
                height: 768,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_prefers_srgb_bgra() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(choose_surface_format(&formats[..1]).unwrap().format, vk::Format::R8G8B8A8_UNORM);
        assert!(choose_surface_format(&[]).is_err());
    }

    #[test]
    fn test_mailbox_only_when_preferred_and_available() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::MAILBOX);
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&modes[..1], true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_is_clamped_when_surface_defers() {
        let extent = choose_extent(
            &capabilities(),
            vk::Extent2D {
                width: 4000,
                height: 600,
            },
        );
        assert_eq!((extent.width, extent.height), (1024, 600));
    }

    #[test]
    fn test_surface_extent_wins_when_fixed() {
        let mut caps = capabilities();
        caps.current_extent = vk::Extent2D {
            width: 640,
            height: 480,
        };
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!((extent.width, extent.height), (640, 480));
    }

    #[test]
    fn test_image_count_one_above_minimum_within_maximum() {
        let mut caps = capabilities();
        assert_eq!(choose_image_count(&caps), 3);
        caps.max_image_count = 2;
        assert_eq!(choose_image_count(&caps), 2);
        caps.max_image_count = 0;
        assert_eq!(choose_image_count(&caps), 3);
    }
}
