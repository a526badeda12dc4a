//! Vulkan instance creation.

use crate::error::{GpuError, Result};
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};
use tracing::{debug, warn};

/// Validation layers to enable when diagnostics are requested.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Instance extensions required to present to a display.
///
/// Debug utils is appended when validation is enabled; it is the point where
/// a debug messenger can later be attached.
pub fn required_instance_extensions(
    display: RawDisplayHandle,
    enable_validation: bool,
) -> Result<Vec<*const c_char>> {
    let mut extensions = ash_window::enumerate_required_extensions(display)?.to_vec();

    if enable_validation {
        extensions.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    #[cfg(target_os = "macos")]
    {
        extensions.push(ash::khr::portability_enumeration::NAME.as_ptr());
        extensions.push(ash::khr::get_physical_device_properties2::NAME.as_ptr());
    }

    Ok(extensions)
}

/// Keep only the requested layers the loader actually provides.
pub fn filter_available_layers<'a>(
    requested: &[&'a CStr],
    available: &[vk::LayerProperties],
) -> Vec<&'a CStr> {
    requested
        .iter()
        .copied()
        .filter(|layer| {
            let found = available
                .iter()
                .any(|props| props.layer_name_as_c_str().is_ok_and(|name| name == *layer));
            if !found {
                warn!("Validation layer {} not available", layer.to_string_lossy());
            }
            found
        })
        .collect()
}

/// Owned Vulkan instance.
///
/// Holds the loaded entry point for as long as the instance lives. Destroyed
/// on drop, which must happen after every object created from it.
pub struct Instance {
    entry: ash::Entry,
    instance: ash::Instance,
    validation: bool,
}

impl Instance {
    /// Load Vulkan and create an instance able to present to `display`.
    pub fn new(display: RawDisplayHandle, app_name: &str, enable_validation: bool) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        let app_name = CString::new(app_name).unwrap_or_default();
        let engine_name = c"Racer";

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let extension_names = required_instance_extensions(display, enable_validation)?;

        let layers = if enable_validation {
            let available = unsafe { entry.enumerate_instance_layer_properties()? };
            filter_available_layers(&validation_layers(), &available)
        } else {
            vec![]
        };
        let layer_names: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

        debug!(
            "Creating instance with {} extensions and {} layers",
            extension_names.len(),
            layer_names.len()
        );

        // Required for MoltenVK on macOS
        #[cfg(target_os = "macos")]
        let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        #[cfg(not(target_os = "macos"))]
        let create_flags = vk::InstanceCreateFlags::empty();

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names)
            .flags(create_flags);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(GpuError::InstanceCreation)?;

        Ok(Self {
            entry,
            instance,
            validation: enable_validation,
        })
    }

    /// Get the Vulkan entry point.
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Get the Vulkan instance handle.
    pub fn raw(&self) -> &ash::Instance {
        &self.instance
    }

    /// Whether debug utils and validation layers were requested.
    pub fn validation_enabled(&self) -> bool {
        self.validation
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &CStr) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        for (dst, src) in props.layer_name.iter_mut().zip(name.to_bytes_with_nul()) {
            *dst = *src as c_char;
        }
        props
    }

    #[test]
    fn available_layers_are_kept() {
        let available = [layer(c"VK_LAYER_KHRONOS_validation")];
        let kept = filter_available_layers(&validation_layers(), &available);
        assert_eq!(kept, vec![c"VK_LAYER_KHRONOS_validation"]);
    }

    #[test]
    fn missing_layers_are_skipped() {
        let available = [layer(c"VK_LAYER_MESA_device_select")];
        let kept = filter_available_layers(&validation_layers(), &available);
        assert!(kept.is_empty());
    }
}
