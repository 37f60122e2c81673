//! Bridge configuration
//!
//! Settings are layered: defaults, then an optional JSON file, then
//! `STYLIZE_*` environment variables, then whatever the caller sets
//! explicitly (the CLI applies its flags last).

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StyleError};
use crate::marshal::Normalization;
use crate::neural::{StyleRegistry, DEFAULT_MODELS_DIR};

pub const ENV_MODELS_DIR: &str = "STYLIZE_MODELS_DIR";
pub const ENV_MANIFEST: &str = "STYLIZE_MANIFEST";
pub const ENV_NORMALIZATION: &str = "STYLIZE_NORMALIZATION";
pub const ENV_EXECUTION_PROVIDER: &str = "STYLIZE_EXECUTION_PROVIDER";
pub const ENV_INTRA_THREADS: &str = "STYLIZE_INTRA_THREADS";
pub const ENV_SCAN_MODELS_DIR: &str = "STYLIZE_SCAN_MODELS_DIR";

/// Default capacity of the host request queue
pub const DEFAULT_HOST_QUEUE_DEPTH: usize = 64;

/// Hardware the ONNX backend runs models on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionProvider::Cpu => write!(f, "cpu"),
            ExecutionProvider::Cuda => write!(f, "cuda"),
        }
    }
}

impl FromStr for ExecutionProvider {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda),
            other => Err(StyleError::Config {
                reason: format!("unknown execution provider '{}' (expected cpu or cuda)", other),
            }),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory holding the built-in style artifacts
    pub models_dir: PathBuf,
    /// Style manifest; replaces the built-in styles when set
    pub manifest: Option<PathBuf>,
    /// Register every model file under `models_dir` instead of the
    /// built-in styles. Ignored when `manifest` is set.
    pub scan_models_dir: bool,
    /// Pixel normalization shared by encode and decode
    pub normalization: Normalization,
    pub execution_provider: ExecutionProvider,
    /// ONNX Runtime intra-op threads (0 = runtime default)
    pub intra_threads: usize,
    /// Capacity of the host request queue
    pub host_queue_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            manifest: None,
            scan_models_dir: false,
            normalization: Normalization::default(),
            execution_provider: ExecutionProvider::default(),
            intra_threads: 0,
            host_queue_depth: DEFAULT_HOST_QUEUE_DEPTH,
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StyleError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: BridgeConfig = serde_json::from_str(&content).map_err(|e| StyleError::Config {
            reason: format!("invalid config {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `STYLIZE_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `STYLIZE_*` names
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_MODELS_DIR) {
            self.models_dir = PathBuf::from(dir);
        }
        if let Some(manifest) = lookup(ENV_MANIFEST) {
            self.manifest = Some(PathBuf::from(manifest));
        }
        if let Some(scan) = lookup(ENV_SCAN_MODELS_DIR) {
            self.scan_models_dir = parse_flag(ENV_SCAN_MODELS_DIR, &scan)?;
        }
        if let Some(normalization) = lookup(ENV_NORMALIZATION) {
            self.normalization = normalization.parse()?;
        }
        if let Some(provider) = lookup(ENV_EXECUTION_PROVIDER) {
            self.execution_provider = provider.parse()?;
        }
        if let Some(threads) = lookup(ENV_INTRA_THREADS) {
            self.intra_threads = threads.trim().parse().map_err(|_| StyleError::Config {
                reason: format!("{} must be a non-negative integer, got '{}'", ENV_INTRA_THREADS, threads),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.host_queue_depth == 0 {
            return Err(StyleError::Config {
                reason: "host_queue_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Build the style registry this config describes: the manifest if one
    /// is set, else a scan of `models_dir` if enabled, else the built-ins
    pub fn registry(&self) -> Result<StyleRegistry> {
        match &self.manifest {
            Some(manifest) => StyleRegistry::from_manifest(manifest),
            None if self.scan_models_dir => StyleRegistry::scan_dir(&self.models_dir),
            None => Ok(StyleRegistry::with_models_dir(&self.models_dir)),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(StyleError::Config {
            reason: format!("{} must be true or false, got '{}'", key, other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(config.normalization, Normalization::Unit);
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert_eq!(config.host_queue_depth, DEFAULT_HOST_QUEUE_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stylize.json");
        fs::write(&path, r#"{ "normalization": "byte", "intra_threads": 2 }"#).unwrap();

        let config = BridgeConfig::load(&path).unwrap();

        assert_eq!(config.normalization, Normalization::Byte);
        assert_eq!(config.intra_threads, 2);
        assert_eq!(config.models_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stylize.json");
        let config = BridgeConfig {
            execution_provider: ExecutionProvider::Cuda,
            manifest: Some(PathBuf::from("styles.json")),
            ..BridgeConfig::default()
        };

        config.save(&path).unwrap();

        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stylize.json");

        fs::write(&path, r#"{ "normalization": "percent" }"#).unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(StyleError::Config { .. })));

        fs::write(&path, r#"{ "host_queue_depth": 0 }"#).unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(StyleError::Config { .. })));

        assert!(matches!(
            BridgeConfig::load(&dir.path().join("missing.json")),
            Err(StyleError::Config { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = BridgeConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_MODELS_DIR, "/opt/styles"),
                (ENV_NORMALIZATION, "0-255"),
                (ENV_EXECUTION_PROVIDER, "CUDA"),
                (ENV_INTRA_THREADS, "4"),
            ]))
            .unwrap();

        assert_eq!(config.models_dir, PathBuf::from("/opt/styles"));
        assert_eq!(config.normalization, Normalization::Byte);
        assert_eq!(config.execution_provider, ExecutionProvider::Cuda);
        assert_eq!(config.intra_threads, 4);
        assert_eq!(config.manifest, None);
    }

    #[test]
    fn test_invalid_override() {
        let mut config = BridgeConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_INTRA_THREADS, "many")]))
            .unwrap_err();
        assert!(matches!(err, StyleError::Config { .. }));

        let err = config
            .apply_overrides(lookup(&[(ENV_SCAN_MODELS_DIR, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, StyleError::Config { .. }));
    }

    #[test]
    fn test_registry_from_scanned_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("extra")).unwrap();
        fs::write(dir.path().join("sketch.onnx"), b"model").unwrap();
        fs::write(dir.path().join("extra").join("pastel.onnx"), b"model").unwrap();
        fs::write(dir.path().join("README.txt"), b"notes").unwrap();

        let mut config = BridgeConfig {
            models_dir: dir.path().to_path_buf(),
            ..BridgeConfig::default()
        };
        config
            .apply_overrides(lookup(&[(ENV_SCAN_MODELS_DIR, "true")]))
            .unwrap();

        let registry = config.registry().unwrap();

        assert!(config.scan_models_dir);
        assert_eq!(registry.list_styles(), vec!["pastel", "sketch"]);
        assert_eq!(
            registry.lookup("sketch").unwrap().model_path,
            dir.path().join("sketch.onnx")
        );
    }

    #[test]
    fn test_scan_of_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let config = BridgeConfig {
            models_dir: dir.path().join("absent"),
            scan_models_dir: true,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.registry(), Err(StyleError::Config { .. })));
    }

    #[test]
    fn test_registry_from_models_dir() {
        let config = BridgeConfig {
            models_dir: PathBuf::from("/srv/models"),
            ..BridgeConfig::default()
        };

        let registry = config.registry().unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.lookup("candy").unwrap().model_path,
            PathBuf::from("/srv/models/candy-9.onnx")
        );
    }
}
