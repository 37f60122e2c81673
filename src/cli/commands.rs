//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use crate::config::BridgeConfig;
use crate::marshal::PixelBuffer;
use crate::neural::{file_sha256, InferenceBackend, MockBackend};
use crate::pipeline::StyleRequest;
use crate::runtime::{default_backend, StyleRuntime};

/// Backend for a command: the mock when requested, otherwise whatever the
/// build provides.
pub fn select_backend(config: &BridgeConfig, mock: bool) -> Arc<dyn InferenceBackend> {
    if mock {
        Arc::new(MockBackend::new().with_max_value(config.normalization.max_value()))
    } else {
        default_backend(config)
    }
}

/// List registered styles.
pub fn list_styles(config: &BridgeConfig) -> anyhow::Result<()> {
    let registry = config.registry().context("failed to build style registry")?;

    println!("{} style(s):", registry.len());
    for entry in registry.entries() {
        let status = if entry.model_path.is_file() {
            "ok"
        } else {
            "missing"
        };
        println!(
            "  {:<16} {:>5}px  [{}] {}",
            entry.id,
            entry.recommended_pixels,
            status,
            entry.model_path.display()
        );
    }

    Ok(())
}

/// Stylize a raw RGBA file and write the result.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: BridgeConfig,
    input: &Path,
    width: u32,
    height: u32,
    style: &str,
    strength: f32,
    output: &Path,
    mock: bool,
) -> anyhow::Result<()> {
    info!("Stylizing {} with '{}' (strength {})", input.display(), style, strength);

    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let pixels = PixelBuffer::new(data, width, height);
    pixels
        .validate()
        .with_context(|| format!("{} is not a {}x{} RGBA image", input.display(), width, height))?;

    let backend = select_backend(&config, mock);
    let runtime = StyleRuntime::from_config(config, backend).context("failed to start runtime")?;

    let request = StyleRequest::new(style, strength);
    let stylized = match runtime.stylize(&pixels, &request).await {
        Ok(stylized) => stylized,
        Err(err) => {
            for suggestion in err.recovery_suggestions() {
                warn!("{}", suggestion);
            }
            return Err(anyhow::Error::new(err).context(format!("[{}] stylize failed", style)));
        }
    };

    fs::write(output, &stylized.data)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Stylized {}x{} image with '{}' -> {}",
        stylized.width,
        stylized.height,
        style,
        output.display()
    );

    runtime.shutdown().await;
    Ok(())
}

/// Create the session for a style and print what was discovered.
pub async fn inspect(config: BridgeConfig, style: &str, mock: bool) -> anyhow::Result<()> {
    info!("Inspecting style '{}'", style);

    let backend = select_backend(&config, mock);
    let runtime = StyleRuntime::from_config(config, backend).context("failed to start runtime")?;

    let entry = runtime.registry().lookup(style)?;
    let session = runtime
        .cache()
        .acquire(style)
        .await
        .with_context(|| format!("failed to create session for '{}'", style))?;

    println!("Style:       {}", entry.id);
    println!("Model:       {}", entry.model_path.display());
    println!("Backend:     {}", session.backend());
    println!("Input:       {}", session.tensor_names().input);
    println!("Output:      {}", session.tensor_names().output);
    println!("Loaded in:   {} ms", session.load_time_ms());
    println!("Loaded at:   {}", session.loaded_at().to_rfc3339());

    match file_sha256(&entry.model_path) {
        Ok(digest) => println!("SHA-256:     {}", digest),
        Err(err) => {
            warn!("Cannot checksum {}: {}", entry.model_path.display(), err);
            println!("SHA-256:     (unavailable)");
        }
    }

    runtime.shutdown().await;
    Ok(())
}
