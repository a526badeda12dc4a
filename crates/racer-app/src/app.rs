//! `RenderApp` trait definition.

use crate::context::AppContext;
use winit::event::WindowEvent;

/// Trait for applications built on the render system.
///
/// The framework creates the window and the render system, recreates the
/// swapchain when the window is resized, and tears everything down on exit.
pub trait RenderApp: Sized {
    /// Initialize the application.
    ///
    /// Called once, after the device, queues and first swapchain exist.
    fn init(ctx: &mut AppContext) -> anyhow::Result<Self>;

    /// Handle a new swapchain.
    ///
    /// Called after the framework replaced the swapchain. Anything built
    /// from the old swapchain's images, format or extent must be rebuilt
    /// here.
    ///
    /// Default implementation does nothing.
    #[allow(unused_variables)]
    fn on_swapchain_recreated(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle window events.
    ///
    /// Return `true` if the event was handled and should not be processed
    /// further.
    #[allow(unused_variables)]
    fn on_event(&mut self, event: &WindowEvent) -> bool {
        false
    }

    /// Cleanup resources before shutdown.
    ///
    /// The GPU is idle when this is called.
    #[allow(unused_variables)]
    fn cleanup(&mut self, ctx: &mut AppContext) {}
}
