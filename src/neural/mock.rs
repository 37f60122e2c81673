//! Mock inference backend
//!
//! Runs without any model files or native runtime. Each style maps to a
//! simple deterministic transform so pipeline output is verifiable, and
//! load/run delays and failures can be injected to exercise the cache and
//! the bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::backend::{InferenceBackend, ModelSession};
use super::registry::StyleEntry;
use crate::error::{Result, StyleError};
use crate::marshal::Tensor;

/// Tensor names declared by mock models, matching the fast-neural-style
/// ONNX exports
pub const MOCK_INPUT_NAME: &str = "input1";
pub const MOCK_OUTPUT_NAME: &str = "output1";

/// Per-style transform applied by a mock session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockTransform {
    /// Output equals input
    Identity,
    /// `max - value` for every element
    Invert,
    /// Every element replaced by the constant
    Constant(f32),
}

impl MockTransform {
    fn apply(&self, value: f32, max_value: f32) -> f32 {
        match self {
            MockTransform::Identity => value,
            MockTransform::Invert => max_value - value,
            MockTransform::Constant(c) => *c,
        }
    }
}

/// Mock backend with injectable behavior
#[derive(Debug)]
pub struct MockBackend {
    default_transform: MockTransform,
    transforms: HashMap<String, MockTransform>,
    failing_loads: HashMap<String, String>,
    failing_runs: HashMap<String, String>,
    load_delay: Duration,
    run_delays: HashMap<String, Duration>,
    max_value: f32,
    loads: AtomicUsize,
    runs: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            default_transform: MockTransform::Invert,
            transforms: HashMap::new(),
            failing_loads: HashMap::new(),
            failing_runs: HashMap::new(),
            load_delay: Duration::ZERO,
            run_delays: HashMap::new(),
            max_value: 1.0,
            loads: AtomicUsize::new(0),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Transform used for styles without an explicit one
    pub fn with_default_transform(mut self, transform: MockTransform) -> Self {
        self.default_transform = transform;
        self
    }

    pub fn with_transform(mut self, style_id: &str, transform: MockTransform) -> Self {
        self.transforms.insert(style_id.to_string(), transform);
        self
    }

    /// Make session creation for `style_id` fail with `reason`
    pub fn failing_load(mut self, style_id: &str, reason: &str) -> Self {
        self.failing_loads
            .insert(style_id.to_string(), reason.to_string());
        self
    }

    /// Make every forward pass for `style_id` fail with `reason`
    pub fn failing_run(mut self, style_id: &str, reason: &str) -> Self {
        self.failing_runs
            .insert(style_id.to_string(), reason.to_string());
        self
    }

    /// Simulated model loading time (blocks the loading thread)
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Simulated inference time for `style_id`
    pub fn with_run_delay(mut self, style_id: &str, delay: Duration) -> Self {
        self.run_delays.insert(style_id.to_string(), delay);
        self
    }

    /// Float value of a full-intensity channel, used by `Invert`
    pub fn with_max_value(mut self, max_value: f32) -> Self {
        self.max_value = max_value;
        self
    }

    /// Number of sessions created so far (including failed attempts)
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of forward passes run so far
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, entry: &StyleEntry) -> Result<Box<dyn ModelSession>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }

        if let Some(reason) = self.failing_loads.get(&entry.id) {
            return Err(StyleError::SessionCreation {
                style_id: entry.id.clone(),
                reason: reason.clone(),
            });
        }

        Ok(Box::new(MockSession {
            transform: self
                .transforms
                .get(&entry.id)
                .copied()
                .unwrap_or(self.default_transform),
            failure: self.failing_runs.get(&entry.id).cloned(),
            run_delay: self.run_delays.get(&entry.id).copied().unwrap_or_default(),
            max_value: self.max_value,
            runs: Arc::clone(&self.runs),
        }))
    }
}

/// Session created by [`MockBackend`]
#[derive(Debug)]
pub struct MockSession {
    transform: MockTransform,
    failure: Option<String>,
    run_delay: Duration,
    max_value: f32,
    runs: Arc<AtomicUsize>,
}

impl ModelSession for MockSession {
    fn input_names(&self) -> Vec<String> {
        vec![MOCK_INPUT_NAME.to_string()]
    }

    fn output_names(&self) -> Vec<String> {
        vec![MOCK_OUTPUT_NAME.to_string()]
    }

    fn run(
        &mut self,
        input_name: &str,
        input: Tensor,
        output_name: &str,
    ) -> std::result::Result<Tensor, String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if !self.run_delay.is_zero() {
            std::thread::sleep(self.run_delay);
        }

        if input_name != MOCK_INPUT_NAME {
            return Err(format!("model has no input named '{}'", input_name));
        }
        if output_name != MOCK_OUTPUT_NAME {
            return Err(format!("model has no output named '{}'", output_name));
        }
        if let Some(reason) = &self.failure {
            return Err(reason.clone());
        }

        let shape = input.shape();
        let data = input
            .into_data()
            .into_iter()
            .map(|v| self.transform.apply(v, self.max_value))
            .collect();
        Tensor::new(shape, data).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> StyleEntry {
        StyleEntry::new(id, format!("{}.onnx", id))
    }

    #[test]
    fn test_invert_by_default() {
        let backend = MockBackend::new();
        let mut session = backend.load(&entry("candy")).unwrap();

        let input = Tensor::new([1, 3, 1, 1], vec![0.0, 0.25, 1.0]).unwrap();
        let output = session
            .run(MOCK_INPUT_NAME, input, MOCK_OUTPUT_NAME)
            .unwrap();

        assert_eq!(output.data(), &[1.0, 0.75, 0.0]);
        assert_eq!(backend.loads(), 1);
        assert_eq!(backend.runs(), 1);
    }

    #[test]
    fn test_declared_names() {
        let backend = MockBackend::new();
        let session = backend.load(&entry("candy")).unwrap();
        let names = session.declared_names().unwrap();
        assert_eq!(names.input, MOCK_INPUT_NAME);
        assert_eq!(names.output, MOCK_OUTPUT_NAME);
    }

    #[test]
    fn test_injected_failures() {
        let backend = MockBackend::new()
            .failing_load("mosaic", "WebGPU adapter unavailable")
            .failing_run("udnie", "kernel fault");

        assert!(backend.load(&entry("mosaic")).is_err());

        let mut session = backend.load(&entry("udnie")).unwrap();
        let input = Tensor::new([1, 3, 1, 1], vec![0.0; 3]).unwrap();
        let err = session
            .run(MOCK_INPUT_NAME, input, MOCK_OUTPUT_NAME)
            .unwrap_err();
        assert_eq!(err, "kernel fault");
        assert_eq!(backend.loads(), 2);
    }

    #[test]
    fn test_wrong_input_name() {
        let backend = MockBackend::new().with_transform("candy", MockTransform::Identity);
        let mut session = backend.load(&entry("candy")).unwrap();
        let input = Tensor::new([1, 3, 1, 1], vec![0.0; 3]).unwrap();
        assert!(session.run("image", input, MOCK_OUTPUT_NAME).is_err());
    }
}
