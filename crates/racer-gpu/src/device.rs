//! Logical device creation.

use std::ffi::{c_char, CStr};

use ash::vk;

use crate::error::{GpuError, Result};
use crate::queue_family::QueueFamilyIndices;

/// One queue-create entry per distinct family, each with a single queue.
///
/// The returned infos borrow `priority`.
pub fn queue_create_infos<'a>(
    queue_families: &QueueFamilyIndices,
    priority: &'a [f32; 1],
) -> Vec<vk::DeviceQueueCreateInfo<'a>> {
    queue_families
        .unique()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(priority)
        })
        .collect()
}

/// Logical device with its graphics and present queues.
///
/// Destroyed on drop. Everything created from the device must be dropped
/// first.
pub struct LogicalDevice {
    device: ash::Device,
    graphics_queue_family: u32,
    present_queue_family: u32,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl LogicalDevice {
    /// Create the logical device and retrieve its queues.
    ///
    /// # Safety
    /// The instance and physical device must be valid, and the queue
    /// families must have been resolved for this physical device.
    pub unsafe fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        queue_families: &QueueFamilyIndices,
        required_extensions: &[&CStr],
    ) -> Result<Self> {
        let (graphics_family, present_family) = queue_families.graphics_and_present()?;

        let queue_priority = [1.0_f32];
        let queue_create_infos = queue_create_infos(queue_families, &queue_priority);

        let extension_names: Vec<*const c_char> =
            required_extensions.iter().map(|ext| ext.as_ptr()).collect();

        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(GpuError::DeviceCreationFailed)?;

        // Fetched separately even when the families coincide
        let graphics_queue = device.get_device_queue(graphics_family, 0);
        let present_queue = device.get_device_queue(present_family, 0);

        Ok(Self {
            device,
            graphics_queue_family: graphics_family,
            present_queue_family: present_family,
            graphics_queue,
            present_queue,
        })
    }

    /// Get the Vulkan device handle.
    pub fn raw(&self) -> &ash::Device {
        &self.device
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Get the present queue.
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Get the graphics queue family index.
    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Get the present queue family index.
    pub fn present_queue_family(&self) -> u32 {
        self.present_queue_family
    }

    /// Wait for device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_family_gets_one_entry() {
        let families = QueueFamilyIndices {
            graphics: Some(0),
            present: Some(0),
        };
        let priority = [1.0];
        let infos = queue_create_infos(&families, &priority);

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].queue_family_index, 0);
        assert_eq!(infos[0].queue_count, 1);
    }

    #[test]
    fn split_families_get_one_entry_each() {
        let families = QueueFamilyIndices {
            graphics: Some(1),
            present: Some(2),
        };
        let priority = [1.0];
        let infos = queue_create_infos(&families, &priority);

        let indices: Vec<u32> = infos.iter().map(|info| info.queue_family_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(infos.iter().all(|info| info.queue_count == 1));
        assert!(infos
            .iter()
            .all(|info| unsafe { *info.p_queue_priorities } == 1.0));
    }
}
