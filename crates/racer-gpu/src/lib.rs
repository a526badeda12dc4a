//! Vulkan device and swapchain negotiation for the Racer renderer.
//!
//! This crate provides:
//! - Vulkan instance creation with an optional validation toggle
//! - Queue family resolution for graphics and presentation
//! - Physical device selection against a suitability predicate
//! - Logical device and queue creation
//! - Swapchain negotiation, creation and recreation
//!
//! [`RenderSystemBuilder`] runs the whole sequence for a window and hands
//! back a [`RenderSystem`] that owns every object and tears them down in
//! reverse order.

pub mod capabilities;
pub mod command;
pub mod context;
pub mod device;
pub mod error;
pub mod instance;
pub mod physical_device;
pub mod queue_family;
pub mod surface;
pub mod swapchain;

pub use capabilities::{DeviceInfo, GpuVendor};
pub use command::CommandPool;
pub use context::{required_device_extensions, RenderSystem, RenderSystemBuilder};
pub use device::LogicalDevice;
pub use error::{GpuError, Result};
pub use instance::Instance;
pub use physical_device::{collect_candidates, select_device, DeviceCandidate};
pub use queue_family::{resolve_queue_families, QueueFamilyIndices};
pub use surface::{Surface, SurfaceSupport};
pub use swapchain::{ImageSharing, Swapchain, SwapchainConfig};
