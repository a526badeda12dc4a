//! Viewer application: reports what was negotiated.

use ash::vk;
use racer_app::{AppContext, RenderApp, SwapchainConfig};
use tracing::info;

/// Logs the negotiated device and swapchain, and each replacement.
pub struct Viewer {
    last_config: SwapchainConfig,
}

impl RenderApp for Viewer {
    fn init(ctx: &mut AppContext) -> anyhow::Result<Self> {
        let render = &ctx.render;

        info!(
            "Queues: graphics family {}, present family {}",
            render.graphics_queue_family(),
            render.present_queue_family()
        );
        if render.validation_enabled() {
            info!("Validation enabled; debug utils available for a messenger");
        }

        let config = *render.swapchain_config();
        log_config("Initial swapchain", &config, render.swapchain().images().len());

        Ok(Self {
            last_config: config,
        })
    }

    fn on_swapchain_recreated(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        let config = *ctx.render.swapchain_config();

        if config == self.last_config {
            info!("Swapchain recreated with unchanged parameters");
        } else {
            log_config(
                "Swapchain changed",
                &config,
                ctx.render.swapchain().images().len(),
            );
        }

        self.last_config = config;
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut AppContext) {
        info!(
            "Shutting down after {} swapchain recreations",
            ctx.recreate_count
        );
    }
}

fn log_config(label: &str, config: &SwapchainConfig, images: usize) {
    let vk::Extent2D { width, height } = config.extent;
    info!(
        "{label}: {width}x{height}, {:?}/{:?}, {:?}, {images} images (requested {}), {:?}",
        config.format, config.color_space, config.present_mode, config.image_count, config.sharing,
    );
}
