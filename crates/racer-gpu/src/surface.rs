//! Presentation surface and its capability query.
//!
//! The surface is created from a window's raw handles; everything the device
//! selector and swapchain negotiator need to know about it comes from
//! [`Surface::query_support`].

use crate::error::{GpuError, Result};
use crate::instance::Instance;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Owned presentation surface.
///
/// Destroyed on drop. Must be dropped before the [`Instance`] it was created
/// from and after every swapchain built on it.
pub struct Surface {
    surface: vk::SurfaceKHR,
    loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Create a surface for a window.
    ///
    /// # Safety
    /// The window must outlive the returned surface.
    pub unsafe fn from_window<W>(instance: &Instance, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

        let surface = ash_window::create_surface(
            instance.entry(),
            instance.raw(),
            display.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

        let loader = ash::khr::surface::Instance::new(instance.entry(), instance.raw());

        Ok(Self { surface, loader })
    }

    /// Get the raw surface handle.
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface extension loader.
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.loader
    }

    /// Query what a physical device supports on this surface.
    ///
    /// # Safety
    /// The physical device must belong to the instance this surface was
    /// created from.
    pub unsafe fn query_support(&self, physical_device: vk::PhysicalDevice) -> Result<SurfaceSupport> {
        let capabilities = self
            .loader
            .get_physical_device_surface_capabilities(physical_device, self.surface)?;

        let formats = self
            .loader
            .get_physical_device_surface_formats(physical_device, self.surface)?;

        let present_modes = self
            .loader
            .get_physical_device_surface_present_modes(physical_device, self.surface)?;

        Ok(SurfaceSupport {
            capabilities,
            formats,
            present_modes,
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Surface capabilities query result.
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats, in driver order.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// At least one format and one present mode are available.
    ///
    /// Extent and image-count limits do not take part in this check.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn support(
        formats: Vec<vk::SurfaceFormatKHR>,
        present_modes: Vec<vk::PresentModeKHR>,
    ) -> SurfaceSupport {
        SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats,
            present_modes,
        }
    }

    fn srgb() -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn adequate_with_formats_and_modes() {
        assert!(support(vec![srgb()], vec![vk::PresentModeKHR::FIFO]).is_adequate());
    }

    #[test]
    fn inadequate_without_formats() {
        assert!(!support(vec![], vec![vk::PresentModeKHR::FIFO]).is_adequate());
    }

    #[test]
    fn inadequate_without_present_modes() {
        assert!(!support(vec![srgb()], vec![]).is_adequate());
    }

    #[test]
    fn adequacy_ignores_extent_limits() {
        let mut s = support(vec![srgb()], vec![vk::PresentModeKHR::FIFO]);
        s.capabilities.max_image_extent = vk::Extent2D { width: 0, height: 0 };
        s.capabilities.max_image_count = 0;
        assert!(s.is_adequate());
    }
}
