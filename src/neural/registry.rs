//! Style model registry
//!
//! Maps style ids to model artifacts and tensor I/O metadata. The registry
//! is fixed after construction; the only later write is the one-time
//! discovery of tensor names when a style's first session is created.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Result, StyleError};

/// Default directory holding model artifacts
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Default recommended edge length in pixels
pub const DEFAULT_RECOMMENDED_PIXELS: u32 = 512;

/// Extension of model artifacts picked up by [`StyleRegistry::scan_dir`]
pub const MODEL_EXTENSION: &str = "onnx";

/// Built-in styles: (id, artifact file name, recommended edge length)
pub const BUILTIN_STYLES: &[(&str, &str, u32)] = &[
    ("candy", "candy-9.onnx", 512),
    ("mosaic", "mosaic-9.onnx", 512),
    ("udnie", "udnie-9.onnx", 512),
    ("rain_princess", "rain-princess-9.onnx", 512),
];

/// Input and output tensor names of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorNames {
    pub input: String,
    pub output: String,
}

/// A registered style.
///
/// `id`, `model_path`, `recommended_pixels` and `sha256` are fixed at
/// construction. Tensor names are either pinned up front or discovered from
/// the model on first session creation; discovered names are written once
/// and never change afterwards.
#[derive(Debug)]
pub struct StyleEntry {
    pub id: String,
    pub model_path: PathBuf,
    pub recommended_pixels: u32,
    pub sha256: Option<String>,
    pinned_input: Option<String>,
    pinned_output: Option<String>,
    discovered: OnceLock<TensorNames>,
}

impl StyleEntry {
    pub fn new(id: impl Into<String>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            model_path: model_path.into(),
            recommended_pixels: DEFAULT_RECOMMENDED_PIXELS,
            sha256: None,
            pinned_input: None,
            pinned_output: None,
            discovered: OnceLock::new(),
        }
    }

    pub fn with_recommended_pixels(mut self, pixels: u32) -> Self {
        self.recommended_pixels = pixels;
        self
    }

    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into().to_lowercase());
        self
    }

    /// Pin tensor names instead of discovering them from the model
    pub fn with_tensor_names(mut self, input: Option<String>, output: Option<String>) -> Self {
        self.pinned_input = input;
        self.pinned_output = output;
        self
    }

    pub fn input_tensor_name(&self) -> Option<&str> {
        self.pinned_input
            .as_deref()
            .or_else(|| self.discovered.get().map(|n| n.input.as_str()))
    }

    pub fn output_tensor_name(&self) -> Option<&str> {
        self.pinned_output
            .as_deref()
            .or_else(|| self.discovered.get().map(|n| n.output.as_str()))
    }

    /// Effective tensor names, if both are known
    pub fn tensor_names(&self) -> Option<TensorNames> {
        Some(TensorNames {
            input: self.input_tensor_name()?.to_string(),
            output: self.output_tensor_name()?.to_string(),
        })
    }

    /// Record the names a freshly loaded model declares.
    ///
    /// Only the first call has any effect. Returns the effective names.
    pub fn discover(&self, declared: TensorNames) -> TensorNames {
        let stored = self.discovered.get_or_init(|| declared);
        TensorNames {
            input: self
                .pinned_input
                .clone()
                .unwrap_or_else(|| stored.input.clone()),
            output: self
                .pinned_output
                .clone()
                .unwrap_or_else(|| stored.output.clone()),
        }
    }

    /// Whether tensor names have been discovered from a model
    pub fn is_discovered(&self) -> bool {
        self.discovered.get().is_some()
    }

    /// Check the artifact against the pinned SHA-256, if any.
    ///
    /// An unreadable artifact or a mismatch fails session creation.
    pub fn verify_checksum(&self) -> Result<()> {
        let Some(expected) = &self.sha256 else {
            return Ok(());
        };
        let actual = file_sha256(&self.model_path).map_err(|e| StyleError::SessionCreation {
            style_id: self.id.clone(),
            reason: format!("cannot read model artifact {}: {}", self.model_path.display(), e),
        })?;
        if &actual != expected {
            return Err(StyleError::SessionCreation {
                style_id: self.id.clone(),
                reason: format!(
                    "checksum mismatch for {}: expected {}, got {}",
                    self.model_path.display(),
                    expected,
                    actual
                ),
            });
        }
        Ok(())
    }

    /// Whether an image is larger than this style's recommended resolution
    pub fn exceeds_recommended(&self, width: u32, height: u32) -> bool {
        width.max(height) > self.recommended_pixels
    }
}

/// Hex-encoded SHA-256 of a file
pub fn file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// One style in a JSON manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStyle {
    pub id: String,
    /// Artifact path, relative to the manifest's directory unless absolute
    pub model: PathBuf,
    #[serde(default = "default_recommended_pixels")]
    pub recommended_pixels: u32,
    #[serde(default)]
    pub input_name: Option<String>,
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

fn default_recommended_pixels() -> u32 {
    DEFAULT_RECOMMENDED_PIXELS
}

/// JSON manifest listing the available styles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleManifest {
    pub styles: Vec<ManifestStyle>,
}

/// Registry of available styles
#[derive(Debug, Default)]
pub struct StyleRegistry {
    entries: HashMap<String, Arc<StyleEntry>>,
}

impl StyleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create registry with the built-in styles under [`DEFAULT_MODELS_DIR`]
    pub fn with_defaults() -> Self {
        Self::with_models_dir(DEFAULT_MODELS_DIR)
    }

    /// Create registry with the built-in styles under `models_dir`
    pub fn with_models_dir(models_dir: impl AsRef<Path>) -> Self {
        let models_dir = models_dir.as_ref();
        let mut registry = Self::new();
        for (id, file, pixels) in BUILTIN_STYLES {
            registry.register(StyleEntry::new(*id, models_dir.join(file)).with_recommended_pixels(*pixels));
        }
        registry
    }

    /// Load styles from a JSON manifest file
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let manifest: StyleManifest = serde_json::from_str(&json)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest_data(manifest, base)
    }

    /// Build a registry from an already parsed manifest
    pub fn from_manifest_data(manifest: StyleManifest, base_dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for style in manifest.styles {
            if registry.has_style(&style.id) {
                return Err(StyleError::Config {
                    reason: format!("style '{}' is listed twice in the manifest", style.id),
                });
            }
            let model_path = if style.model.is_absolute() {
                style.model
            } else {
                base_dir.join(style.model)
            };
            let mut entry = StyleEntry::new(style.id, model_path)
                .with_recommended_pixels(style.recommended_pixels)
                .with_tensor_names(style.input_name, style.output_name);
            if let Some(digest) = style.sha256 {
                entry = entry.with_sha256(digest);
            }
            registry.register(entry);
        }
        Ok(registry)
    }

    /// Register every model artifact found under `dir`, keyed by file stem
    pub fn scan_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(StyleError::Config {
                reason: format!("models directory not found: {}", dir.display()),
            });
        }

        let mut registry = Self::new();
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                registry.register(StyleEntry::new(stem, path));
            }
        }
        Ok(registry)
    }

    /// Register a style, replacing any previous entry with the same id
    pub fn register(&mut self, entry: StyleEntry) {
        self.entries.insert(entry.id.clone(), Arc::new(entry));
    }

    /// Get a style by id
    pub fn lookup(&self, style_id: &str) -> Result<Arc<StyleEntry>> {
        self.entries
            .get(style_id)
            .cloned()
            .ok_or_else(|| StyleError::UnknownStyle {
                style_id: style_id.to_string(),
            })
    }

    /// Check if a style is registered
    pub fn has_style(&self, style_id: &str) -> bool {
        self.entries.contains_key(style_id)
    }

    /// List all registered style ids, sorted
    pub fn list_styles(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// All entries, sorted by id
    pub fn entries(&self) -> Vec<Arc<StyleEntry>> {
        let mut entries: Vec<_> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
