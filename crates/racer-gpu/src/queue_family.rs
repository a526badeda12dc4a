//! Queue family resolution.

use crate::error::{GpuError, Result};
use ash::vk;

/// Queue family indices for graphics submission and presentation.
///
/// Either index may be unset; a device is only usable once both are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// First family with graphics support.
    pub graphics: Option<u32>,
    /// First family that can present to the surface.
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Both graphics and present families are known.
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Distinct family indices, graphics first.
    ///
    /// A family serving both roles appears once, so callers never create
    /// duplicate queue-create entries for it.
    pub fn unique(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);
        for index in [self.graphics, self.present].into_iter().flatten() {
            if !families.contains(&index) {
                families.push(index);
            }
        }
        families
    }

    /// Both indices as `(graphics, present)`.
    pub fn graphics_and_present(&self) -> Result<(u32, u32)> {
        match (self.graphics, self.present) {
            (Some(graphics), Some(present)) => Ok((graphics, present)),
            _ => Err(GpuError::QueueFamiliesIncomplete),
        }
    }
}

/// Resolve graphics and present families from a device's family list.
///
/// Families are scanned once in ascending order and the first match for each
/// role wins. The scan ends when both roles are filled or the list runs out;
/// an incomplete result is returned as-is.
pub fn resolve_queue_families<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<QueueFamilyIndices>
where
    F: FnMut(u32) -> Result<bool>,
{
    let mut indices = QueueFamilyIndices::default();

    for (i, family) in families.iter().enumerate() {
        let i = i as u32;

        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(i);
        }

        if indices.present.is_none() && supports_present(i)? {
            indices.present = Some(i);
        }

        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

/// Find the graphics and present queue families of a physical device.
///
/// # Safety
/// The instance, surface and physical device must be valid.
pub unsafe fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<QueueFamilyIndices> {
    let families = instance.get_physical_device_queue_family_properties(physical_device);

    resolve_queue_families(&families, |index| {
        let supported = surface_loader.get_physical_device_surface_support(
            physical_device,
            index,
            surface,
        )?;
        Ok(supported)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn combined_family_resolves_both() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let indices = resolve_queue_families(&families, |_| Ok(true)).unwrap();

        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, Some(0));
        assert!(indices.is_complete());
    }

    #[test]
    fn split_families_resolve_separately() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
        ];
        let indices = resolve_queue_families(&families, |i| Ok(i == 2)).unwrap();

        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(2));
        assert!(indices.is_complete());
    }

    #[test]
    fn first_match_wins_over_later_combined_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let indices = resolve_queue_families(&families, |i| Ok(i >= 1)).unwrap();

        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn no_present_support_leaves_present_unset() {
        let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::COMPUTE)];
        let indices = resolve_queue_families(&families, |_| Ok(false)).unwrap();

        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, None);
        assert!(!indices.is_complete());
        assert!(matches!(
            indices.graphics_and_present(),
            Err(GpuError::QueueFamiliesIncomplete)
        ));
    }

    #[test]
    fn scan_is_bounded_by_family_count() {
        let families = [family(vk::QueueFlags::TRANSFER)];
        let mut queried = Vec::new();
        let indices = resolve_queue_families(&families, |i| {
            queried.push(i);
            Ok(false)
        })
        .unwrap();

        assert_eq!(queried, vec![0]);
        assert_eq!(indices, QueueFamilyIndices::default());
    }

    #[test]
    fn scan_stops_once_complete() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let mut queried = 0;
        resolve_queue_families(&families, |_| {
            queried += 1;
            Ok(true)
        })
        .unwrap();

        assert_eq!(queried, 1);
    }

    #[test]
    fn support_query_error_propagates() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let result = resolve_queue_families(&families, |_| {
            Err(GpuError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR))
        });

        assert!(matches!(
            result,
            Err(GpuError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR))
        ));
    }

    #[test]
    fn unique_collapses_shared_family() {
        let indices = QueueFamilyIndices {
            graphics: Some(3),
            present: Some(3),
        };
        assert_eq!(indices.unique(), vec![3]);
    }

    #[test]
    fn unique_keeps_graphics_first() {
        let indices = QueueFamilyIndices {
            graphics: Some(2),
            present: Some(0),
        };
        assert_eq!(indices.unique(), vec![2, 0]);
        assert_eq!(indices.graphics_and_present().unwrap(), (2, 0));
    }
}
