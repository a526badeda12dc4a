//! Racer viewer
//!
//! Opens a window, negotiates a GPU device and swapchain for it, and keeps
//! the swapchain in step with the window size until it is closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p racer-viewer -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--size <WxH>`: Initial window size (default: 1600x900)
//! - `--vsync`: Force FIFO presentation
//! - `--validation`: Enable validation layers
//! - `--no-validation`: Disable validation layers
//! - `--fixed-size`: Make the window non-resizable
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod app;

use anyhow::bail;
use racer_app::{run_app, AppConfig};

use crate::app::Viewer;

const TITLE: &str = "Arcade Racer - Vulkan";

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Check for help flag before starting the app
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    let config = parse_args(AppConfig::new(TITLE), &args)?;
    run_app::<Viewer>(config)
}

/// Apply command line flags on top of a base configuration.
fn parse_args(mut config: AppConfig, args: &[String]) -> anyhow::Result<AppConfig> {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--vsync" => config = config.with_vsync(true),
            "--validation" => config = config.with_validation(true),
            "--no-validation" => config = config.with_validation(false),
            "--fixed-size" => config = config.with_resizable(false),
            "--size" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--size needs a value like 1600x900");
                };
                let (width, height) = parse_size(value)?;
                config = config.with_size(width, height);
                i += 1;
            }
            other => bail!("Unknown option: {other} (see --help)"),
        }
        i += 1;
    }
    Ok(config)
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(value: &str) -> anyhow::Result<(u32, u32)> {
    let Some((width, height)) = value.split_once('x') else {
        bail!("Invalid size '{value}', expected WIDTHxHEIGHT");
    };
    let width: u32 = width.trim().parse()?;
    let height: u32 = height.trim().parse()?;
    if width == 0 || height == 0 {
        bail!("Window size must be non-zero, got {value}");
    }
    Ok((width, height))
}

fn print_help() {
    eprintln!(
        "Racer viewer

Opens a window and negotiates a Vulkan device and swapchain for it.

USAGE:
    racer-viewer [OPTIONS]

OPTIONS:
    --size <WxH>       Initial window size (default: 1600x900)
    --vsync            Force FIFO presentation
    --validation       Enable validation layers
    --no-validation    Disable validation layers
    --fixed-size       Make the window non-resizable
    -h, --help         Print this help message

ENVIRONMENT:
    RUST_LOG           Log level filter (default: info)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        let config = parse_args(
            AppConfig::new(TITLE),
            &args(&["--vsync", "--no-validation", "--size", "1280x720", "--fixed-size"]),
        )
        .unwrap();

        assert!(config.vsync);
        assert!(!config.validation);
        assert!(!config.resizable);
        assert_eq!((config.width, config.height), (1280, 720));
    }

    #[test]
    fn no_flags_keeps_defaults() {
        let config = parse_args(AppConfig::new(TITLE), &[]).unwrap();
        assert_eq!((config.width, config.height), (1600, 900));
        assert!(!config.vsync);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("wide x tall").is_err());
        assert_eq!(parse_size("800x600").unwrap(), (800, 600));
    }

    #[test]
    fn rejects_unknown_and_incomplete_options() {
        assert!(parse_args(AppConfig::new(TITLE), &args(&["--fast"])).is_err());
        assert!(parse_args(AppConfig::new(TITLE), &args(&["--size"])).is_err());
    }
}
