//! Application framework for the Racer renderer.
//!
//! This crate handles the boilerplate around the render system:
//! - Logging setup
//! - Window creation
//! - Render system initialization and teardown
//! - Swapchain recreation on resize
//! - Event loop handling
//!
//! # Example
//!
//! ```no_run
//! use racer_app::{run_app, AppConfig, AppContext, RenderApp};
//!
//! struct MyApp;
//!
//! impl RenderApp for MyApp {
//!     fn init(ctx: &mut AppContext) -> anyhow::Result<Self> {
//!         println!("{}x{}", ctx.width(), ctx.height());
//!         Ok(MyApp)
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     run_app::<MyApp>(AppConfig::default())
//! }
//! ```

mod app;
mod context;
mod runner;

pub use app::RenderApp;
pub use context::AppContext;
pub use runner::{run_app, AppConfig};

// Re-export commonly used types for convenience
pub use racer_gpu::{RenderSystem, RenderSystemBuilder, SwapchainConfig};
pub use winit::event::WindowEvent;
