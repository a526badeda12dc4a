//! GPU error types.

use ash::vk;
use thiserror::Error;

/// GPU bring-up errors.
///
/// Every variant is fatal during initialization. The message names the stage
/// that failed so the caller can report it before exiting.
#[derive(Error, Debug)]
pub enum GpuError {
    /// The Vulkan loader could not be found or loaded.
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// The driver rejected instance creation.
    #[error("Instance creation failed: {0}")]
    InstanceCreation(vk::Result),

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// No enumerated device passed the suitability checks.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Graphics or present queue family is missing.
    #[error("Queue families incomplete: need both graphics and present support")]
    QueueFamiliesIncomplete,

    /// Required device extension not supported.
    #[error("Required extension not supported: {0}")]
    MissingRequiredExtension(String),

    /// Surface exposes no formats or no present modes.
    #[error("Swapchain support inadequate: surface reports no formats or no present modes")]
    SwapchainInadequate,

    /// Required device feature not supported.
    #[error("Required device feature not supported: {0}")]
    FeatureNotSupported(&'static str),

    /// The driver rejected logical device creation.
    #[error("Logical device creation failed: {0}")]
    DeviceCreationFailed(vk::Result),

    /// The driver rejected swapchain creation.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreationFailed(vk::Result),

    /// Any other Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
