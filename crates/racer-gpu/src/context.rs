//! Render system: owns every negotiated GPU object.

use std::ffi::CStr;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};

use crate::capabilities::DeviceInfo;
use crate::command::CommandPool;
use crate::device::LogicalDevice;
use crate::error::{GpuError, Result};
use crate::instance::Instance;
use crate::physical_device::{probe_devices, select_device};
use crate::queue_family::QueueFamilyIndices;
use crate::surface::Surface;
use crate::swapchain::{Swapchain, SwapchainConfig};

/// Device extensions every render system needs.
pub fn required_device_extensions() -> Vec<&'static CStr> {
    vec![ash::khr::swapchain::NAME]
}

/// Main GPU context holding the negotiated Vulkan objects.
///
/// Fields drop in declaration order, which is the reverse of creation:
/// swapchain, command pool, device, surface, instance.
pub struct RenderSystem {
    swapchain: Swapchain,
    command_pool: CommandPool,
    swapchain_loader: ash::khr::swapchain::Device,
    device: LogicalDevice,
    physical_device: vk::PhysicalDevice,
    device_info: DeviceInfo,
    queue_families: QueueFamilyIndices,
    surface: Surface,
    instance: Instance,
    vsync: bool,
}

impl RenderSystem {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        self.device.raw()
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Identity of the selected GPU.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue()
    }

    /// Get the present queue.
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue()
    }

    /// Get the graphics queue family index.
    pub fn graphics_queue_family(&self) -> u32 {
        self.device.graphics_queue_family()
    }

    /// Get the present queue family index.
    pub fn present_queue_family(&self) -> u32 {
        self.device.present_queue_family()
    }

    /// Get the command pool for the graphics family.
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// Get the current swapchain.
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Get the swapchain extension loader.
    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    /// Get the parameters of the current swapchain.
    pub fn swapchain_config(&self) -> &SwapchainConfig {
        self.swapchain.config()
    }

    /// Get the Vulkan entry point.
    ///
    /// Together with [`Self::instance`], this is where a debug messenger can
    /// be attached when [`Self::validation_enabled`] is set.
    pub fn entry(&self) -> &ash::Entry {
        self.instance.entry()
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        self.instance.raw()
    }

    /// Whether debug utils and validation layers were requested.
    pub fn validation_enabled(&self) -> bool {
        self.instance.validation_enabled()
    }

    /// Get the surface handle.
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface.handle()
    }

    /// Wait for device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }

    /// Replace the swapchain after the surface changed size or was
    /// invalidated.
    ///
    /// The whole negotiation runs again. The current swapchain is handed to
    /// the driver as the old swapchain, then destroyed together with its
    /// image views once the replacement exists.
    pub fn recreate_swapchain(&mut self, desired_extent: vk::Extent2D) -> Result<()> {
        self.wait_idle()?;

        let replacement = unsafe {
            let support = self.surface.query_support(self.physical_device)?;
            let config = SwapchainConfig::negotiate(
                &support,
                &self.queue_families,
                desired_extent,
                self.vsync,
            )?;

            Swapchain::new(
                self.device.raw(),
                &self.swapchain_loader,
                self.surface.handle(),
                config,
                Some(&self.swapchain),
            )?
        };

        // Dropping the old swapchain destroys it
        self.swapchain = replacement;

        info!(
            "Swapchain recreated: {}x{} ({} images, {:?})",
            self.swapchain.extent().width,
            self.swapchain.extent().height,
            self.swapchain.images().len(),
            self.swapchain.config().present_mode,
        );

        Ok(())
    }
}

impl Drop for RenderSystem {
    fn drop(&mut self) {
        let _ = self.device.wait_idle();
    }
}

/// Builder for creating a render system.
pub struct RenderSystemBuilder {
    app_name: String,
    enable_validation: bool,
    vsync: bool,
    device_extensions: Vec<&'static CStr>,
}

impl Default for RenderSystemBuilder {
    fn default() -> Self {
        Self {
            app_name: "Racer".to_string(),
            enable_validation: cfg!(debug_assertions),
            vsync: false,
            device_extensions: required_device_extensions(),
        }
    }
}

impl RenderSystemBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers and debug utils.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Force FIFO presentation instead of preferring mailbox.
    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Require an extra device extension on top of the swapchain extension.
    pub fn device_extension(mut self, extension: &'static CStr) -> Self {
        if !self.device_extensions.contains(&extension) {
            self.device_extensions.push(extension);
        }
        self
    }

    /// Device extensions a GPU must expose to be selected.
    pub fn device_extensions(&self) -> &[&'static CStr] {
        &self.device_extensions
    }

    /// Build the render system for a window.
    ///
    /// Each stage is held in a local guard, so a failure part-way releases
    /// everything created so far in reverse order.
    ///
    /// # Safety
    /// The window must outlive the returned render system.
    pub unsafe fn build<W>(self, window: &W, desired_extent: vk::Extent2D) -> Result<RenderSystem>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;

        // Create Vulkan instance
        let instance = Instance::new(display.as_raw(), &self.app_name, self.enable_validation)?;

        // Create surface
        let surface = Surface::from_window(&instance, window)?;

        // Select physical device
        let candidates = probe_devices(instance.raw(), &surface, &self.device_extensions)?;
        debug!("Found {} GPU(s)", candidates.len());
        let selected = select_device(candidates, &self.device_extensions)?;

        info!("Selected GPU: {}", selected.info.summary());

        // Create logical device
        let device = LogicalDevice::new(
            instance.raw(),
            selected.physical_device,
            &selected.queue_families,
            &self.device_extensions,
        )?;

        // Create command pool
        let command_pool = CommandPool::new(
            device.raw(),
            device.graphics_queue_family(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )?;

        // Create swapchain
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.raw(), device.raw());
        let support = surface.query_support(selected.physical_device)?;
        let config = SwapchainConfig::negotiate(
            &support,
            &selected.queue_families,
            desired_extent,
            self.vsync,
        )?;
        let swapchain = Swapchain::new(
            device.raw(),
            &swapchain_loader,
            surface.handle(),
            config,
            None,
        )?;

        info!(
            "Swapchain created: {}x{} ({} images, {:?}, {:?})",
            config.extent.width,
            config.extent.height,
            swapchain.images().len(),
            config.format,
            config.present_mode,
        );

        Ok(RenderSystem {
            swapchain,
            command_pool,
            swapchain_loader,
            device,
            physical_device: selected.physical_device,
            device_info: selected.info,
            queue_families: selected.queue_families,
            surface,
            instance,
            vsync: self.vsync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_always_requires_swapchain() {
        let builder = RenderSystemBuilder::new();
        assert_eq!(builder.device_extensions(), &[ash::khr::swapchain::NAME]);
    }

    #[test]
    fn extra_extensions_are_not_duplicated() {
        let builder = RenderSystemBuilder::new()
            .device_extension(ash::khr::swapchain::NAME)
            .device_extension(ash::khr::maintenance1::NAME)
            .device_extension(ash::khr::maintenance1::NAME);

        assert_eq!(
            builder.device_extensions(),
            &[ash::khr::swapchain::NAME, ash::khr::maintenance1::NAME]
        );
    }

    #[test]
    fn builder_settings() {
        let builder = RenderSystemBuilder::new()
            .app_name("Test")
            .validation(true)
            .vsync(true);

        assert_eq!(builder.app_name, "Test");
        assert!(builder.enable_validation);
        assert!(builder.vsync);
    }
}
