//! Test doubles for the rendering backend and sample source.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pollution_map_backend::{
    BackendError, BackendLoader, ContainerId, MapHandle, OverlayHandle, RenderBackend,
};
use pollution_map_data::SampleSource;
use pollution_map_map_models::{MapView, PointSample, RenderConfig};
use pollution_map_pollutant_models::Pollutant;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateMap(String),
    DestroyMap(u64),
    SetView(u64),
    InvalidateSize(u64),
    AddTileLayer(u64),
    AddHeatOverlay {
        map: u64,
        overlay: u64,
        samples: Vec<PointSample>,
    },
    RemoveOverlay {
        map: u64,
        overlay: u64,
    },
    SetOverlayConfig {
        overlay: u64,
        max_weight: f64,
    },
}

/// Backend double that records every call, issues sequential handles, and
/// tracks which overlays are currently attached.
pub struct RecordingBackend {
    next_id: AtomicU64,
    calls: Mutex<Vec<Call>>,
    attached: Mutex<BTreeMap<u64, Vec<PointSample>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            attached: Mutex::new(BTreeMap::new()),
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Snapshot of every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Currently attached overlays as `(overlay id, samples)` pairs.
    pub fn attached(&self) -> Vec<(u64, Vec<PointSample>)> {
        self.attached
            .lock()
            .unwrap()
            .iter()
            .map(|(id, samples)| (*id, samples.clone()))
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_map(&self, container: &ContainerId) -> Result<MapHandle, BackendError> {
        let id = self.next();
        self.record(Call::CreateMap(container.as_str().to_string()));
        Ok(MapHandle::new(id))
    }

    fn destroy_map(&self, map: MapHandle) -> Result<(), BackendError> {
        self.record(Call::DestroyMap(map.id()));
        Ok(())
    }

    fn set_view(&self, map: MapHandle, _view: &MapView) -> Result<(), BackendError> {
        self.record(Call::SetView(map.id()));
        Ok(())
    }

    fn invalidate_size(&self, map: MapHandle) -> Result<(), BackendError> {
        self.record(Call::InvalidateSize(map.id()));
        Ok(())
    }

    fn add_tile_layer(
        &self,
        map: MapHandle,
        _url_template: &str,
        _attribution: &str,
    ) -> Result<(), BackendError> {
        self.record(Call::AddTileLayer(map.id()));
        Ok(())
    }

    fn add_heat_overlay(
        &self,
        map: MapHandle,
        samples: &[PointSample],
        _config: &RenderConfig,
    ) -> Result<OverlayHandle, BackendError> {
        let id = self.next();
        self.record(Call::AddHeatOverlay {
            map: map.id(),
            overlay: id,
            samples: samples.to_vec(),
        });
        self.attached.lock().unwrap().insert(id, samples.to_vec());
        Ok(OverlayHandle::new(id))
    }

    fn remove_overlay(&self, map: MapHandle, overlay: OverlayHandle) -> Result<(), BackendError> {
        self.record(Call::RemoveOverlay {
            map: map.id(),
            overlay: overlay.id(),
        });
        self.attached.lock().unwrap().remove(&overlay.id());
        Ok(())
    }

    fn set_overlay_config(
        &self,
        overlay: OverlayHandle,
        config: &RenderConfig,
    ) -> Result<(), BackendError> {
        self.record(Call::SetOverlayConfig {
            overlay: overlay.id(),
            max_weight: config.max_weight,
        });
        Ok(())
    }
}

/// Loader that hands out an already-constructed backend.
pub struct StaticLoader {
    backend: Arc<dyn RenderBackend>,
}

impl StaticLoader {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BackendLoader for StaticLoader {
    async fn load(&self) -> Result<Arc<dyn RenderBackend>, BackendError> {
        Ok(self.backend.clone())
    }
}

/// Loader that always fails, for degraded-state tests.
pub struct FailingLoader;

#[async_trait]
impl BackendLoader for FailingLoader {
    async fn load(&self) -> Result<Arc<dyn RenderBackend>, BackendError> {
        Err(BackendError::Load {
            message: "script unavailable".to_string(),
        })
    }
}

/// Source that resolves immediately with fixed samples and counts calls.
pub struct InstantSource {
    pub calls: AtomicUsize,
    samples: Vec<PointSample>,
}

impl InstantSource {
    pub fn new(samples: Vec<PointSample>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            samples,
        }
    }
}

#[async_trait]
impl SampleSource for InstantSource {
    async fn fetch_samples(&self, _pollutant: Pollutant) -> Vec<PointSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.samples.clone()
    }
}

/// Source whose completions are released manually, for interleaving tests.
pub struct GatedSource {
    pub calls: AtomicUsize,
    pending: Mutex<Vec<(Pollutant, tokio::sync::oneshot::Sender<Vec<PointSample>>)>>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches currently blocked on release.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Completes the pending fetch for `pollutant` with `samples`.
    pub fn release(&self, pollutant: Pollutant, samples: Vec<PointSample>) {
        let mut pending = self.pending.lock().unwrap();
        let idx = pending
            .iter()
            .position(|(p, _)| *p == pollutant)
            .expect("no pending fetch for pollutant");
        let (_, tx) = pending.remove(idx);
        let _ = tx.send(samples);
    }
}

#[async_trait]
impl SampleSource for GatedSource {
    async fn fetch_samples(&self, pollutant: Pollutant) -> Vec<PointSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().unwrap().push((pollutant, tx));
        rx.await.unwrap_or_default()
    }
}

/// Polls `condition` between scheduler turns until it holds.
///
/// # Panics
///
/// Panics if the condition is not reached within a bounded number of
/// scheduler turns.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached after 1000 scheduler turns");
}
