//! Swapchain negotiation and management.
//!
//! Negotiation is split into pure selection functions, combined by
//! [`SwapchainConfig::negotiate`], and the driver-facing [`Swapchain::new`].
//! A swapchain is never modified after creation; on resize or surface loss
//! it is replaced wholesale.

use crate::error::{GpuError, Result};
use crate::queue_family::QueueFamilyIndices;
use crate::surface::SurfaceSupport;
use ash::vk;

/// Width reported in `current_extent` when the surface lets the swapchain
/// decide its size.
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

/// How swapchain images are shared between queue families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    /// One family owns the images.
    Exclusive,
    /// Graphics and present families share the images.
    Concurrent([u32; 2]),
}

impl ImageSharing {
    /// Exclusive when both roles use the same family, concurrent otherwise.
    pub fn for_families(graphics: u32, present: u32) -> Self {
        if graphics == present {
            Self::Exclusive
        } else {
            Self::Concurrent([graphics, present])
        }
    }

    /// Vulkan sharing mode.
    pub fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    /// Queue families listed in the create info; empty when exclusive.
    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(families) => families,
        }
    }
}

/// The negotiated swapchain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    /// Minimum image count requested from the driver.
    pub image_count: u32,
    pub sharing: ImageSharing,
    /// Surface transform, passed through from the capabilities.
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    /// Choose swapchain parameters from queried surface support.
    ///
    /// Deterministic: identical inputs always yield an identical config.
    pub fn negotiate(
        support: &SurfaceSupport,
        queue_families: &QueueFamilyIndices,
        desired_extent: vk::Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        let surface_format =
            select_surface_format(&support.formats).ok_or(GpuError::SwapchainInadequate)?;
        let (graphics, present) = queue_families.graphics_and_present()?;

        Ok(Self {
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode: select_present_mode(&support.present_modes, vsync),
            extent: calculate_extent(&support.capabilities, desired_extent),
            image_count: select_image_count(&support.capabilities),
            sharing: ImageSharing::for_families(graphics, present),
            pre_transform: support.capabilities.current_transform,
        })
    }

    /// The chosen format and color space as a Vulkan pair.
    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format: self.format,
            color_space: self.color_space,
        }
    }
}

/// Swapchain wrapper.
///
/// Owns the swapchain handle and one image view per image. Both are
/// destroyed on drop, which must happen before the logical device is
/// destroyed.
pub struct Swapchain {
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    config: SwapchainConfig,
    device: ash::Device,
    loader: ash::khr::swapchain::Device,
}

impl Swapchain {
    /// Create a new swapchain.
    ///
    /// Pass the swapchain being replaced as `old_swapchain` so the driver can
    /// reuse its resources; it stays valid and must be dropped by the caller.
    ///
    /// # Safety
    /// All handles must be valid and `surface` must be the surface the config
    /// was negotiated against.
    pub unsafe fn new(
        device: &ash::Device,
        swapchain_loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        config: SwapchainConfig,
        old_swapchain: Option<&Swapchain>,
    ) -> Result<Self> {
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(config.image_count)
            .image_format(config.format)
            .image_color_space(config.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.mode())
            .queue_family_indices(config.sharing.queue_family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain.map_or(vk::SwapchainKHR::null(), Swapchain::handle));

        let handle = swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(GpuError::SwapchainCreationFailed)?;

        // From here on, drop releases whatever has been created
        let mut swapchain = Self {
            swapchain: handle,
            images: Vec::new(),
            image_views: Vec::new(),
            config,
            device: device.clone(),
            loader: swapchain_loader.clone(),
        };

        let images = swapchain_loader.get_swapchain_images(handle)?;
        swapchain.image_views.reserve(images.len());
        for &image in &images {
            let view = create_image_view(device, image, config.format)?;
            swapchain.image_views.push(view);
        }
        swapchain.images = images;

        Ok(swapchain)
    }

    /// Get the raw swapchain handle.
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Presentable images, in driver order.
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// One color view per image, matching [`Self::images`].
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// The parameters this swapchain was built from.
    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }

    pub fn format(&self) -> vk::Format {
        self.config.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Create a 2D color view of a swapchain image.
unsafe fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
) -> Result<vk::ImageView> {
    let view_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping::default())
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1),
        );

    Ok(device.create_image_view(&view_info, None)?)
}

/// Select the best surface format.
///
/// Returns `None` only when the list is empty.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    // Prefer SRGB
    available
        .iter()
        .find(|format| {
            format.format == vk::Format::B8G8R8A8_SRGB
                && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.first())
        .copied()
}

/// Select the present mode.
///
/// Without vsync, mailbox is preferred when offered. FIFO is the fallback
/// in every case since every implementation supports it.
pub fn select_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if !vsync && available.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Calculate swapchain extent.
///
/// The surface's current extent is used verbatim unless it is undefined, in
/// which case the desired size is clamped into the supported range.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != UNDEFINED_EXTENT {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: desired.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One more image than the minimum, capped at the maximum when there is one.
pub fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        image_count
    }
}
