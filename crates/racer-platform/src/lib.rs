//! Platform abstraction for the Racer renderer.
//!
//! Provides window configuration, framebuffer size lookup and the resize
//! message queue the render loop consumes.

use std::collections::VecDeque;

use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowAttributes};

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// Platform configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Racer".to_string(),
            width: 1600,
            height: 900,
            resizable: true,
        }
    }
}

impl PlatformConfig {
    /// Window attributes for this configuration.
    pub fn window_attributes(&self) -> WindowAttributes {
        Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(PhysicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
    }
}

/// Framebuffer size of a window in physical pixels.
pub fn framebuffer_size(window: &Window) -> (u32, u32) {
    let size = window.inner_size();
    (size.width, size.height)
}

/// A change to the presentation surface reported by the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The framebuffer now has this size in physical pixels.
    Resized { width: u32, height: u32 },
}

/// Queue of surface events between the window and the render loop.
///
/// The window handler pushes events as they arrive; the render loop takes
/// them once per iteration, which clears the queue.
#[derive(Debug, Default)]
pub struct SurfaceEvents {
    pending: VecDeque<SurfaceEvent>,
}

impl SurfaceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn push(&mut self, event: SurfaceEvent) {
        tracing::trace!("Surface event: {event:?}");
        self.pending.push_back(event);
    }

    /// Take the most recent resize and clear the queue.
    ///
    /// Intermediate sizes are dropped since only the final size matters for
    /// the next swapchain.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.pending
            .drain(..)
            .map(|event| match event {
                SurfaceEvent::Resized { width, height } => (width, height),
            })
            .last()
    }

    /// Whether any event is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_has_no_resize() {
        let mut events = SurfaceEvents::new();
        assert!(events.is_empty());
        assert_eq!(events.take_resize(), None);
    }

    #[test]
    fn latest_resize_wins() {
        let mut events = SurfaceEvents::new();
        events.push(SurfaceEvent::Resized {
            width: 800,
            height: 600,
        });
        events.push(SurfaceEvent::Resized {
            width: 1024,
            height: 768,
        });
        assert!(!events.is_empty());

        assert_eq!(events.take_resize(), Some((1024, 768)));
    }

    #[test]
    fn take_clears_the_queue() {
        let mut events = SurfaceEvents::new();
        events.push(SurfaceEvent::Resized {
            width: 640,
            height: 480,
        });

        assert_eq!(events.take_resize(), Some((640, 480)));
        assert!(events.is_empty());
        assert_eq!(events.take_resize(), None);
    }

    #[test]
    fn default_config() {
        let config = PlatformConfig::default();
        assert_eq!((config.width, config.height), (1600, 900));
        assert!(config.resizable);
    }
}
