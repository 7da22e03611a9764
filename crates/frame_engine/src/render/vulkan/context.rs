//! Instance, surface, physical and logical device setup
//!
//! Each layer is its own RAII type so that [`super::VulkanDevice`] can
//! express teardown order through field order alone.

use std::collections::HashSet;
use std::ffi::{c_char, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};

use crate::render::vulkan::Window;
use crate::render::{RenderError, RenderResult};

const VALIDATION_LAYER: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

/// Loaded Vulkan entry, instance and optional debug messenger
pub struct VulkanInstance {
    entry: Entry,
    instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Load Vulkan and create an instance with the extensions GLFW needs
    ///
    /// Validation is silently downgraded when the Khronos layer is missing.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> RenderResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| RenderError::InitializationFailed(format!("Failed to load Vulkan: {e:?}")))?;

        let enable_validation = enable_validation && Self::validation_layer_available(&entry)?;

        let app_name = CString::new(app_name)
            .map_err(|_| RenderError::InitializationFailed("Application name contains NUL".to_string()))?;
        let engine_name = CString::new("frame_engine")
            .map_err(|_| RenderError::InitializationFailed("Engine name contains NUL".to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let required_extensions = window.required_instance_extensions()?;
        let extension_names = required_extensions
            .into_iter()
            .map(|name| {
                CString::new(name)
                    .map_err(|_| RenderError::InitializationFailed("Invalid extension name".to_string()))
            })
            .collect::<RenderResult<Vec<_>>>()?;

        let mut extensions: Vec<*const c_char> = extension_names.iter().map(|name| name.as_ptr()).collect();
        let mut layers: Vec<*const c_char> = Vec::new();
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
            layers.push(VALIDATION_LAYER.as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        let debug = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::info!(
            "Vulkan instance created (validation {})",
            if debug.is_some() { "on" } else { "off" }
        );

        Ok(Self { entry, instance, debug })
    }

    fn validation_layer_available(entry: &Entry) -> RenderResult<bool> {
        let layers = entry.enumerate_instance_layer_properties()?;
        let available = layers
            .iter()
            .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == VALIDATION_LAYER);

        if !available {
            log::warn!("Validation requested but VK_LAYER_KHRONOS_validation is not installed");
        }
        Ok(available)
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> RenderResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        Ok(unsafe { debug_utils.create_debug_utils_messenger(&create_info, None)? })
    }

    /// Loader entry points
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Instance function table
    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Window surface and the extension loader that owns it
pub struct WindowSurface {
    loader: Surface,
    surface: vk::SurfaceKHR,
}

impl WindowSurface {
    /// Create the surface for `window`
    pub fn new(instance: &VulkanInstance, window: &Window) -> RenderResult<Self> {
        let loader = Surface::new(instance.entry(), instance.instance());
        let surface = window.create_vulkan_surface(instance.instance().handle())?;
        Ok(Self { loader, surface })
    }

    /// Surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// `VK_KHR_surface` function table
    pub fn loader(&self) -> &Surface {
        &self.loader
    }

    /// Current capabilities for `physical_device`
    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> RenderResult<vk::SurfaceCapabilitiesKHR> {
        Ok(unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?
        })
    }

    /// Supported formats for `physical_device`
    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> RenderResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(unsafe { self.loader.get_physical_device_surface_formats(physical_device, self.surface)? })
    }

    /// Supported present modes for `physical_device`
    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> RenderResult<Vec<vk::PresentModeKHR>> {
        Ok(unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)?
        })
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Selected GPU and the queue families used on it
pub struct PhysicalDeviceInfo {
    /// Physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Queue family used for rendering
    pub graphics_family: u32,
    /// Queue family used for presentation
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick the first suitable GPU, preferring discrete ones
    pub fn select_suitable_device(instance: &Instance, surface: &WindowSurface) -> RenderResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices()? };

        let mut candidates: Vec<Self> = devices
            .into_iter()
            .filter_map(|device| match Self::evaluate_device(instance, device, surface) {
                Ok(info) => info,
                Err(e) => {
                    log::debug!("Skipping physical device: {}", e);
                    None
                }
            })
            .collect();

        candidates.sort_by_key(|info| info.properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU);
        let selected = candidates.into_iter().next().ok_or(RenderError::NoSuitableDevice)?;

        log::info!("Selected GPU: {}", selected.name());
        Ok(selected)
    }

    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: &WindowSurface,
    ) -> RenderResult<Option<Self>> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if graphics_family.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface
                    .loader()
                    .get_physical_device_surface_support(device, index, surface.handle())?
            };
            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let (Some(graphics_family), Some(present_family)) = (graphics_family, present_family) else {
            return Ok(None);
        };

        let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };
        let has_swapchain = extensions
            .iter()
            .any(|available| unsafe { CStr::from_ptr(available.extension_name.as_ptr()) } == SwapchainLoader::name());
        if !has_swapchain {
            return Ok(None);
        }

        if surface.formats(device)?.is_empty() || surface.present_modes(device)?.is_empty() {
            return Ok(None);
        }

        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };

        Ok(Some(Self {
            device,
            properties,
            memory_properties,
            graphics_family,
            present_family,
        }))
    }

    /// Human-readable device name
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Index of a memory type allowed by `type_filter` with `properties`
    pub fn find_memory_type(&self, type_filter: u32, properties: vk::MemoryPropertyFlags) -> RenderResult<u32> {
        (0..self.memory_properties.memory_type_count)
            .find(|&i| {
                (type_filter & (1 << i)) != 0
                    && self.memory_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
            .ok_or_else(|| RenderError::InvalidOperation {
                reason: "Failed to find suitable memory type".to_string(),
            })
    }
}

/// Logical device and its queues
pub struct LogicalDevice {
    device: Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl LogicalDevice {
    /// Create the device with the swapchain extension enabled
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> RenderResult<Self> {
        let unique_families: HashSet<u32> = [physical.graphics_family, physical.present_family].into_iter().collect();

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe { instance.create_device(physical.device, &create_info, None)? };
        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical.present_family, 0) };

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
        })
    }

    /// Device function table
    pub fn handle(&self) -> &Device {
        &self.device
    }

    /// Queue used for rendering submissions
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Queue used for presentation
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}
