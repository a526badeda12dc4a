//! Physical device enumeration and selection.
//!
//! Selection takes the first device, in driver order, that passes every
//! suitability check. Devices are not ranked: on a machine with both a
//! discrete and an integrated GPU, whichever the driver lists first wins.
//! A scored variant would rank the passing candidates by
//! [`DeviceInfo::device_type`] instead of returning the first.

use std::collections::HashSet;
use std::ffi::CStr;

use ash::vk;
use tracing::debug;

use crate::capabilities::{available_extensions, DeviceInfo};
use crate::error::{GpuError, Result};
use crate::queue_family::{find_queue_families, QueueFamilyIndices};
use crate::surface::{Surface, SurfaceSupport};

/// Everything the suitability check needs to know about one device.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub physical_device: vk::PhysicalDevice,
    pub info: DeviceInfo,
    pub queue_families: QueueFamilyIndices,
    /// Extension names the device reports.
    pub extensions: HashSet<String>,
    /// Surface support; only queried when the required extensions are present.
    pub surface_support: Option<SurfaceSupport>,
    /// Anisotropic sampler filtering feature.
    pub sampler_anisotropy: bool,
}

impl DeviceCandidate {
    /// Required extensions this device does not expose, in request order.
    pub fn missing_extensions(&self, required: &[&CStr]) -> Vec<String> {
        required
            .iter()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|name| !self.extensions.contains(name))
            .collect()
    }

    /// Check the suitability predicate, reporting the first failing part.
    pub fn check(&self, required: &[&CStr]) -> Result<()> {
        if !self.queue_families.is_complete() {
            return Err(GpuError::QueueFamiliesIncomplete);
        }

        if let Some(missing) = self.missing_extensions(required).into_iter().next() {
            return Err(GpuError::MissingRequiredExtension(missing));
        }

        if !self.surface_support.as_ref().is_some_and(SurfaceSupport::is_adequate) {
            return Err(GpuError::SwapchainInadequate);
        }

        if !self.sampler_anisotropy {
            return Err(GpuError::FeatureNotSupported("samplerAnisotropy"));
        }

        Ok(())
    }
}

/// Gather a candidate for every physical device, in driver order.
///
/// A device whose driver queries fail is left out rather than failing the
/// whole enumeration; only enumerating the devices themselves can fail here.
///
/// # Safety
/// The instance and surface must be valid, and the surface must belong to
/// the instance.
pub unsafe fn probe_devices(
    instance: &ash::Instance,
    surface: &Surface,
    required_extensions: &[&CStr],
) -> Result<Vec<DeviceCandidate>> {
    let devices = instance.enumerate_physical_devices()?;

    Ok(collect_candidates(devices, |device| {
        probe_device(instance, surface, device, required_extensions)
    }))
}

/// Probe each device in order, skipping the ones whose probe fails.
pub fn collect_candidates<I, F>(devices: I, mut probe: F) -> Vec<DeviceCandidate>
where
    I: IntoIterator<Item = vk::PhysicalDevice>,
    F: FnMut(vk::PhysicalDevice) -> Result<DeviceCandidate>,
{
    devices
        .into_iter()
        .filter_map(|device| match probe(device) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                debug!("Skipping GPU {device:?}: query failed: {e}");
                None
            }
        })
        .collect()
}

/// Gather suitability data for one physical device.
///
/// # Safety
/// All handles must be valid.
pub unsafe fn probe_device(
    instance: &ash::Instance,
    surface: &Surface,
    physical_device: vk::PhysicalDevice,
    required_extensions: &[&CStr],
) -> Result<DeviceCandidate> {
    let info = DeviceInfo::query(instance, physical_device);
    let queue_families =
        find_queue_families(instance, surface.loader(), surface.handle(), physical_device)?;
    let extensions = available_extensions(instance, physical_device)?;

    let mut candidate = DeviceCandidate {
        physical_device,
        info,
        queue_families,
        extensions,
        surface_support: None,
        sampler_anisotropy: false,
    };

    // Surface queries need the swapchain extension to mean anything
    if candidate.missing_extensions(required_extensions).is_empty() {
        candidate.surface_support = Some(surface.query_support(physical_device)?);
    }

    let features = instance.get_physical_device_features(physical_device);
    candidate.sampler_anisotropy = features.sampler_anisotropy == vk::TRUE;

    Ok(candidate)
}

/// Pick the first suitable candidate.
pub fn select_device<I>(candidates: I, required_extensions: &[&CStr]) -> Result<DeviceCandidate>
where
    I: IntoIterator<Item = DeviceCandidate>,
{
    for candidate in candidates {
        match candidate.check(required_extensions) {
            Ok(()) => return Ok(candidate),
            Err(reason) => debug!("Rejected GPU {}: {reason}", candidate.info.name),
        }
    }

    Err(GpuError::NoSuitableDevice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::GpuVendor;
    use ash::vk::Handle;

    const REQUIRED: &[&CStr] = &[ash::khr::swapchain::NAME];

    fn candidate(id: u64) -> DeviceCandidate {
        DeviceCandidate {
            physical_device: vk::PhysicalDevice::from_raw(id),
            info: DeviceInfo {
                name: format!("GPU {id}"),
                vendor: GpuVendor::Other(0),
                device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
                api_version: vk::API_VERSION_1_0,
                driver_version: 0,
            },
            queue_families: QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0),
            },
            extensions: HashSet::from([String::from("VK_KHR_swapchain")]),
            surface_support: Some(SurfaceSupport {
                capabilities: vk::SurfaceCapabilitiesKHR::default(),
                formats: vec![vk::SurfaceFormatKHR::default()],
                present_modes: vec![vk::PresentModeKHR::FIFO],
            }),
            sampler_anisotropy: true,
        }
    }

    #[test]
    fn complete_candidate_is_suitable() {
        assert!(candidate(1).check(REQUIRED).is_ok());
    }

    #[test]
    fn missing_extension_is_reported_by_name() {
        let mut c = candidate(1);
        c.extensions.clear();
        c.surface_support = None;

        assert_eq!(c.missing_extensions(REQUIRED), vec!["VK_KHR_swapchain"]);
        match c.check(REQUIRED) {
            Err(GpuError::MissingRequiredExtension(name)) => assert_eq!(name, "VK_KHR_swapchain"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn each_predicate_rejects() {
        let mut incomplete = candidate(1);
        incomplete.queue_families.present = None;
        assert!(matches!(
            incomplete.check(REQUIRED),
            Err(GpuError::QueueFamiliesIncomplete)
        ));

        let mut inadequate = candidate(2);
        inadequate.surface_support.as_mut().unwrap().present_modes.clear();
        assert!(matches!(
            inadequate.check(REQUIRED),
            Err(GpuError::SwapchainInadequate)
        ));

        let mut no_aniso = candidate(3);
        no_aniso.sampler_anisotropy = false;
        assert!(matches!(
            no_aniso.check(REQUIRED),
            Err(GpuError::FeatureNotSupported("samplerAnisotropy"))
        ));
    }

    #[test]
    fn selects_first_fully_suitable_candidate() {
        let mut no_extensions = candidate(10);
        no_extensions.extensions.clear();
        no_extensions.surface_support = None;

        let mut inadequate = candidate(11);
        inadequate.surface_support.as_mut().unwrap().formats.clear();

        let passing = candidate(12);
        let also_passing = candidate(13);

        let selected =
            select_device([no_extensions, inadequate, passing, also_passing], REQUIRED).unwrap();
        assert_eq!(selected.physical_device.as_raw(), 12);
    }

    #[test]
    fn failed_probe_skips_only_that_device() {
        let devices = [1, 2, 3].map(vk::PhysicalDevice::from_raw);
        let candidates = collect_candidates(devices, |device| match device.as_raw() {
            1 => Err(GpuError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR)),
            raw => Ok(candidate(raw)),
        });

        let raws: Vec<u64> = candidates.iter().map(|c| c.physical_device.as_raw()).collect();
        assert_eq!(raws, vec![2, 3]);

        let selected = select_device(candidates, REQUIRED).unwrap();
        assert_eq!(selected.physical_device.as_raw(), 2);
    }

    #[test]
    fn every_probe_failing_has_no_suitable_device() {
        let devices = [1, 2].map(vk::PhysicalDevice::from_raw);
        let candidates = collect_candidates(devices, |_| {
            Err(GpuError::Vulkan(vk::Result::ERROR_INITIALIZATION_FAILED))
        });

        assert!(candidates.is_empty());
        assert!(matches!(
            select_device(candidates, REQUIRED),
            Err(GpuError::NoSuitableDevice)
        ));
    }

    #[test]
    fn empty_list_has_no_suitable_device() {
        let result = select_device(Vec::new(), REQUIRED);
        assert!(matches!(result, Err(GpuError::NoSuitableDevice)));
    }

    #[test]
    fn all_rejected_has_no_suitable_device() {
        let mut a = candidate(1);
        a.sampler_anisotropy = false;
        let mut b = candidate(2);
        b.queue_families.graphics = None;

        let result = select_device([a, b], REQUIRED);
        assert!(matches!(result, Err(GpuError::NoSuitableDevice)));
    }
}
