//! Session cache
//!
//! Creates one inference session per style on first use and keeps it for
//! the rest of the process. Concurrent requests for a style that is still
//! loading join the in-flight creation instead of starting another one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::backend::{InferenceBackend, ModelSession};
use super::registry::{StyleEntry, StyleRegistry, TensorNames};
use crate::error::{Result, StyleError};
use crate::marshal::Tensor;

/// A loaded model bound to one style
pub struct StyleSession {
    style_id: String,
    backend: String,
    names: TensorNames,
    loaded_at: DateTime<Utc>,
    load_time_ms: u64,
    inner: Mutex<Box<dyn ModelSession>>,
}

impl StyleSession {
    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Tensor names this session was created with
    pub fn tensor_names(&self) -> &TensorNames {
        &self.names
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn load_time_ms(&self) -> u64 {
        self.load_time_ms
    }

    /// Run one forward pass. Blocks until the backend finishes.
    pub fn run_blocking(&self, input_name: &str, input: Tensor, output_name: &str) -> Result<Tensor> {
        let mut session = self
            .inner
            .lock()
            .map_err(|_| StyleError::InferenceRuntime {
                style_id: self.style_id.clone(),
                reason: "session poisoned by an earlier panic".to_string(),
            })?;

        session
            .run(input_name, input, output_name)
            .map_err(|reason| StyleError::InferenceRuntime {
                style_id: self.style_id.clone(),
                reason,
            })
    }
}

impl fmt::Debug for StyleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSession")
            .field("style_id", &self.style_id)
            .field("backend", &self.backend)
            .field("names", &self.names)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

type LoadOutcome = std::result::Result<Arc<StyleSession>, String>;

enum Slot {
    Ready(Arc<StyleSession>),
    Loading(watch::Receiver<Option<LoadOutcome>>),
}

/// Per-style session cache with at-most-one in-flight creation per style
pub struct SessionCache {
    registry: Arc<StyleRegistry>,
    backend: Arc<dyn InferenceBackend>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    creations: Arc<AtomicUsize>,
}

impl SessionCache {
    pub fn new(registry: Arc<StyleRegistry>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            registry,
            backend,
            slots: Arc::new(Mutex::new(HashMap::new())),
            creations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn registry(&self) -> &Arc<StyleRegistry> {
        &self.registry
    }

    /// Get the session for `style_id`, creating it on first use.
    ///
    /// # Errors
    /// - `UnknownStyle` if the style is not registered
    /// - `SessionCreation` if the model cannot be loaded; the failure is not
    ///   cached, so a later call starts a fresh attempt
    pub async fn acquire(&self, style_id: &str) -> Result<Arc<StyleSession>> {
        let mut rx = {
            let mut slots = self.lock_slots();
            match slots.get(style_id) {
                Some(Slot::Ready(session)) => {
                    debug!(style = style_id, "Session cache hit");
                    return Ok(Arc::clone(session));
                }
                Some(Slot::Loading(rx)) => {
                    debug!(style = style_id, "Joining in-flight session creation");
                    rx.clone()
                }
                None => {
                    let entry = self.registry.lookup(style_id)?;
                    let rx = self.start_creation(entry);
                    slots.insert(style_id.to_string(), Slot::Loading(rx.clone()));
                    rx
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };

        match outcome {
            Some(Ok(session)) => Ok(session),
            Some(Err(reason)) => Err(StyleError::SessionCreation {
                style_id: style_id.to_string(),
                reason,
            }),
            None => Err(StyleError::SessionCreation {
                style_id: style_id.to_string(),
                reason: "session creation was aborted".to_string(),
            }),
        }
    }

    /// Whether a ready session exists for `style_id`
    pub fn is_cached(&self, style_id: &str) -> bool {
        matches!(self.lock_slots().get(style_id), Some(Slot::Ready(_)))
    }

    /// Styles with a ready session, sorted
    pub fn cached_styles(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock_slots()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of session creation sequences started so far
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the creation task. The caller must hold the slot lock and
    /// insert the returned receiver before releasing it.
    fn start_creation(&self, entry: Arc<StyleEntry>) -> watch::Receiver<Option<LoadOutcome>> {
        let (tx, rx) = watch::channel(None);
        let backend = Arc::clone(&self.backend);
        let slots = Arc::clone(&self.slots);
        self.creations.fetch_add(1, Ordering::SeqCst);

        // Outcome reaches every waiter even if the initiating caller is dropped
        tokio::spawn(async move {
            let style_id = entry.id.clone();
            let loaded =
                tokio::task::spawn_blocking(move || create_session(backend.as_ref(), &entry)).await;

            let outcome: LoadOutcome = match loaded {
                Ok(Ok(session)) => Ok(Arc::new(session)),
                Ok(Err(err)) => Err(creation_reason(err)),
                Err(join_err) => Err(format!("session loader panicked: {}", join_err)),
            };

            {
                let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
                match &outcome {
                    Ok(session) => {
                        slots.insert(style_id.clone(), Slot::Ready(Arc::clone(session)));
                    }
                    Err(reason) => {
                        warn!(style = %style_id, %reason, "Session creation failed");
                        slots.remove(&style_id);
                    }
                }
            }

            let _ = tx.send(Some(outcome));
        });

        rx
    }
}

fn creation_reason(err: StyleError) -> String {
    match err {
        StyleError::SessionCreation { reason, .. } => reason,
        other => other.to_string(),
    }
}

fn create_session(backend: &dyn InferenceBackend, entry: &StyleEntry) -> Result<StyleSession> {
    entry.verify_checksum()?;

    let started = Instant::now();
    let session = backend.load(entry)?;
    let load_time_ms = started.elapsed().as_millis() as u64;

    let names = match session.declared_names() {
        Some(declared) => entry.discover(declared),
        None => entry
            .tensor_names()
            .ok_or_else(|| StyleError::SessionCreation {
                style_id: entry.id.clone(),
                reason: "model declares no inputs or outputs".to_string(),
            })?,
    };

    info!(
        style = %entry.id,
        backend = backend.name(),
        input = %names.input,
        output = %names.output,
        load_time_ms,
        "Session created"
    );

    Ok(StyleSession {
        style_id: entry.id.clone(),
        backend: backend.name().to_string(),
        names,
        loaded_at: Utc::now(),
        load_time_ms,
        inner: Mutex::new(session),
    })
}
