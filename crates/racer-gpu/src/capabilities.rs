//! Physical device identification.

use ash::vk;
use std::collections::HashSet;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Identity of a physical device, kept for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device name as reported by the driver.
    pub name: String,
    /// GPU vendor.
    pub vendor: GpuVendor,
    /// Discrete, integrated, virtual, CPU or other.
    pub device_type: vk::PhysicalDeviceType,
    /// Highest Vulkan version the device supports.
    pub api_version: u32,
    /// Driver version (vendor-specific encoding).
    pub driver_version: u32,
}

impl DeviceInfo {
    /// Query identification from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);
        Self::from_properties(&properties)
    }

    /// Build from already-fetched device properties.
    pub fn from_properties(properties: &vk::PhysicalDeviceProperties) -> Self {
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed device>"));

        Self {
            name,
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
        }
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}, {:?}) - Vulkan {}.{}.{}",
            self.name,
            self.vendor,
            self.device_type,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

/// Names of the device extensions a physical device exposes.
///
/// # Safety
/// The instance and physical device must be valid.
pub unsafe fn available_extensions(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> crate::Result<HashSet<String>> {
    let extensions = instance.enumerate_device_extension_properties(physical_device)?;
    Ok(extension_names(&extensions))
}

/// Extension names as owned strings. Names that are not valid UTF-8 or lack
/// a terminator are skipped.
pub fn extension_names(extensions: &[vk::ExtensionProperties]) -> HashSet<String> {
    extensions
        .iter()
        .filter_map(|ext| {
            ext.extension_name_as_c_str()
                .ok()
                .and_then(|name| name.to_str().ok())
                .map(String::from)
        })
        .collect()
}
