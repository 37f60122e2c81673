//! CLI Module
//!
//! Command-line interface for the style-transfer bridge. Images are read and
//! written as raw interleaved RGBA bytes; decoding image formats is left to
//! the caller.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BridgeConfig;
use crate::error::Result;

/// Stylize - neural style transfer through cached per-style sessions
#[derive(Parser, Debug)]
#[command(name = "stylize")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Style manifest (replaces the built-in styles)
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory holding the built-in style models
    #[arg(long, global = true, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Register every .onnx file under the models directory as a style
    #[arg(long, global = true)]
    pub scan_models_dir: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered styles
    #[command(name = "styles")]
    Styles,

    /// Stylize a raw RGBA image
    #[command(name = "run")]
    Run {
        /// Raw RGBA input file (width x height x 4 bytes)
        #[arg(short, long)]
        input: PathBuf,

        /// Image width in pixels
        #[arg(long)]
        width: u32,

        /// Image height in pixels
        #[arg(long)]
        height: u32,

        /// Style id
        #[arg(short, long)]
        style: String,

        /// Blend strength, 0.0 (original) to 1.0 (fully stylized)
        #[arg(long, default_value = "1.0")]
        strength: f32,

        /// Raw RGBA output file
        #[arg(short, long)]
        output: PathBuf,

        /// Use the mock backend instead of a real model
        #[arg(long)]
        mock: bool,
    },

    /// Create a style's session and show its tensor names
    #[command(name = "inspect")]
    Inspect {
        /// Style id
        #[arg(short, long)]
        style: String,

        /// Use the mock backend instead of a real model
        #[arg(long)]
        mock: bool,
    },
}

impl Cli {
    /// Resolve the effective configuration: defaults, then `--config`, then
    /// `STYLIZE_*` environment variables, then command-line flags.
    pub fn resolve_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        config.apply_env()?;
        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut BridgeConfig) {
        if let Some(dir) = &self.models_dir {
            config.models_dir = dir.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.manifest = Some(manifest.clone());
        }
        if self.scan_models_dir {
            config.scan_models_dir = true;
        }
    }
}
