//! Application runner and event loop.

use std::sync::Arc;

use anyhow::Context as _;
use racer_platform::{PlatformConfig, PlatformError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::app::RenderApp;
use crate::context::AppContext;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title, also used as the Vulkan application name.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Allow the window to be resized.
    pub resizable: bool,
    /// Force FIFO presentation.
    pub vsync: bool,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Racer".to_string(),
            width: 1600,
            height: 900,
            resizable: true,
            vsync: false,
            validation: cfg!(debug_assertions),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Allow or forbid window resizing.
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Enable or disable vsync.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Enable or disable validation layers.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Window settings for the platform layer.
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            resizable: self.resizable,
        }
    }
}

/// Run a `RenderApp` with the given configuration.
///
/// Initializes logging, creates the window and render system, and runs the
/// event loop until the window closes. Any initialization or recreation
/// failure stops the loop and is returned.
pub fn run_app<A: RenderApp + 'static>(config: AppConfig) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("{} starting...", config.title);

    let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut runner = AppRunner::<A> {
        config,
        state: None,
        failure: None,
    };

    event_loop
        .run_app(&mut runner)
        .map_err(|e| PlatformError::EventLoop(e.to_string()))?;

    match runner.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Internal application runner that implements winit's ApplicationHandler.
struct AppRunner<A: RenderApp> {
    config: AppConfig,
    state: Option<AppState<A>>,
    failure: Option<anyhow::Error>,
}

/// Internal application state.
struct AppState<A: RenderApp> {
    ctx: AppContext,
    app: A,
}

impl<A: RenderApp + 'static> ApplicationHandler for AppRunner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        info!("Creating application state...");

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Application ready!");
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        // Let the app handle the event first
        if let Some(state) = &mut self.state {
            if state.app.on_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                if let Some(mut state) = self.state.take() {
                    state.cleanup();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.ctx.notify_resized(size.width, size.height);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        if let Err(e) = state.handle_surface_events() {
            self.fail(event_loop, e);
        }
    }
}

impl<A: RenderApp + 'static> AppRunner<A> {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState<A>> {
        // Create window
        let window_attrs = self.config.platform_config().window_attributes();
        let window = event_loop
            .create_window(window_attrs)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        let window = Arc::new(window);

        // Create app context
        // SAFETY: the window was just created and is owned by the context
        let mut ctx = unsafe { AppContext::new(window, &self.config)? };

        info!("GPU: {}", ctx.render.device_info().summary());

        // Initialize the application
        let app = A::init(&mut ctx).context("Application initialization failed")?;

        Ok(AppState { ctx, app })
    }

    /// Record a fatal error, release everything and stop the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{e:#}");
        if let Some(mut state) = self.state.take() {
            state.cleanup();
        }
        self.failure = Some(e);
        event_loop.exit();
    }
}

impl<A: RenderApp> AppState<A> {
    fn handle_surface_events(&mut self) -> anyhow::Result<()> {
        if self.ctx.process_surface_events()? {
            self.app.on_swapchain_recreated(&mut self.ctx)?;

            info!("Resized to {}x{}", self.ctx.width(), self.ctx.height());
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        info!("Starting cleanup...");

        if let Err(e) = self.ctx.render.wait_idle() {
            error!("Failed to wait idle: {e}");
        }

        // Let the app cleanup first; the render system is released on drop
        self.app.cleanup(&mut self.ctx);

        info!(
            "Cleanup complete ({} swapchain recreations)",
            self.ctx.recreate_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = AppConfig::new("Test")
            .with_size(800, 600)
            .with_resizable(false)
            .with_vsync(true)
            .with_validation(false);

        assert_eq!(config.title, "Test");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.resizable);
        assert!(config.vsync);
        assert!(!config.validation);
    }

    #[test]
    fn platform_config_mirrors_window_settings() {
        let platform = AppConfig::new("Racer").with_size(1024, 768).platform_config();
        assert_eq!(platform.title, "Racer");
        assert_eq!((platform.width, platform.height), (1024, 768));
        assert!(platform.resizable);
    }

    #[test]
    fn validation_defaults_to_debug_builds() {
        assert_eq!(AppConfig::default().validation, cfg!(debug_assertions));
    }
}
