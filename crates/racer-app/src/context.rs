//! Application context.

use std::sync::Arc;

use anyhow::Context as _;
use ash::vk;
use racer_gpu::{RenderSystem, RenderSystemBuilder};
use racer_platform::{framebuffer_size, SurfaceEvent, SurfaceEvents};
use winit::window::Window;

use crate::runner::AppConfig;

/// Application context shared across all app methods.
///
/// Passed explicitly to every app callback; there is no global access to
/// the window or the render system.
pub struct AppContext {
    /// Device, queues and swapchain. Declared before the window so it is
    /// dropped while the window still exists.
    pub render: RenderSystem,
    /// The window handle.
    pub window: Arc<Window>,
    /// Pending surface changes reported by the window.
    pub(crate) surface_events: SurfaceEvents,
    /// Number of swapchain recreations so far.
    pub recreate_count: u64,
}

impl AppContext {
    /// Create a new application context.
    ///
    /// # Safety
    /// The window must have valid handles.
    pub(crate) unsafe fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let (width, height) = framebuffer_size(&window);
        let desired = vk::Extent2D {
            width: width.max(1),
            height: height.max(1),
        };

        // SAFETY: the context keeps the window alive longer than the render system
        let render = unsafe {
            RenderSystemBuilder::new()
                .app_name(&config.title)
                .validation(config.validation)
                .vsync(config.vsync)
                .build(window.as_ref(), desired)
                .context("Failed to initialize render system")?
        };

        Ok(Self {
            render,
            window,
            surface_events: SurfaceEvents::new(),
            recreate_count: 0,
        })
    }

    /// Get the current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.render.swapchain().extent()
    }

    /// Get the swapchain width.
    pub fn width(&self) -> u32 {
        self.extent().width
    }

    /// Get the swapchain height.
    pub fn height(&self) -> u32 {
        self.extent().height
    }

    /// Record a framebuffer resize reported by the window.
    pub(crate) fn notify_resized(&mut self, width: u32, height: u32) {
        self.surface_events
            .push(SurfaceEvent::Resized { width, height });
    }

    /// Consume pending surface events and recreate the swapchain if needed.
    ///
    /// Returns whether the swapchain was replaced. A zero-sized framebuffer
    /// (minimized window) is skipped; the next non-zero resize recreates.
    pub(crate) fn process_surface_events(&mut self) -> anyhow::Result<bool> {
        let Some(extent) = resize_extent(self.surface_events.take_resize()) else {
            return Ok(false);
        };

        self.render
            .recreate_swapchain(extent)
            .context("Failed to recreate swapchain")?;
        self.recreate_count += 1;

        Ok(true)
    }
}

/// Extent to recreate the swapchain at for a pending resize, if any.
///
/// A zero width or height means the window is minimized; nothing is
/// recreated until a later resize reports a usable size.
pub(crate) fn resize_extent(resize: Option<(u32, u32)>) -> Option<vk::Extent2D> {
    match resize? {
        (0, _) | (_, 0) => None,
        (width, height) => Some(vk::Extent2D { width, height }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pending_resize() {
        assert_eq!(resize_extent(None), None);
    }

    #[test]
    fn minimized_window_is_skipped() {
        assert_eq!(resize_extent(Some((0, 720))), None);
        assert_eq!(resize_extent(Some((1280, 0))), None);
        assert_eq!(resize_extent(Some((0, 0))), None);
    }

    #[test]
    fn restored_window_recreates_at_new_size() {
        let mut events = SurfaceEvents::new();
        events.push(SurfaceEvent::Resized {
            width: 0,
            height: 0,
        });
        assert_eq!(resize_extent(events.take_resize()), None);

        events.push(SurfaceEvent::Resized {
            width: 1280,
            height: 720,
        });
        assert_eq!(
            resize_extent(events.take_resize()),
            Some(vk::Extent2D {
                width: 1280,
                height: 720
            })
        );
    }
}
