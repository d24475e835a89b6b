//! View coordination: selection state, fetch sequencing, teardown.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use pollution_map_backend::{ContainerId, SharedBackend};
use pollution_map_data::SampleSource;
use pollution_map_map_models::{INTENSITY_MAX, INTENSITY_MIN, MapView, RenderConfig};
use pollution_map_pollutant_models::Pollutant;
use tokio::sync::watch;

use crate::ViewError;
use crate::lifecycle::MapLifecycle;
use crate::overlay::OverlayController;

/// Lifecycle phase of a mounted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No map instance exists.
    Unmounted,
    /// The rendering backend is loading.
    Loading,
    /// The map exists; no overlay has been attached yet.
    MapReady,
    /// Samples are loaded and the overlay attach is underway.
    DataReady,
    /// The heat overlay is attached.
    OverlayActive,
}

struct SessionState {
    lifecycle: MapLifecycle,
    overlay: OverlayController,
    pollutant: Pollutant,
    intensity: f64,
    phase: SessionPhase,
}

/// Coordinates one mounted map view.
///
/// Holds the user-selected pollutant and intensity and sequences the
/// asynchronous steps: backend load, map creation, layout attachment,
/// sample fetch, overlay attach. Category changes fetch and replace the
/// overlay; intensity changes restyle it in place without fetching.
///
/// Overlapping work is resolved with a generation counter: every fetch
/// takes a fresh generation, and teardown bumps it as well, so a
/// completion holding a stale generation discards itself instead of
/// overwriting newer state. The net effect is that the *last* category
/// selection always wins, and completions that land after teardown are
/// silent no-ops.
pub struct MapSession {
    backend: Arc<SharedBackend>,
    source: Arc<dyn SampleSource>,
    state: Mutex<SessionState>,
    /// Generation tag for in-flight work; see the type-level docs.
    generation: AtomicU64,
    /// Layout signal: overlay attachment waits behind this so that the
    /// size-invalidation pass always precedes the first paint.
    attached: watch::Sender<bool>,
}

impl MapSession {
    /// Creates a session over the shared backend holder and sample source.
    #[must_use]
    pub fn new(backend: Arc<SharedBackend>, source: Arc<dyn SampleSource>) -> Self {
        let (attached, _) = watch::channel(false);
        Self {
            backend,
            source,
            state: Mutex::new(SessionState {
                lifecycle: MapLifecycle::new(),
                overlay: OverlayController::new(),
                pollutant: Pollutant::default(),
                intensity: 1.0,
                phase: SessionPhase::Unmounted,
            }),
            generation: AtomicU64::new(0),
            attached,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state mutex poisoned")
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    /// Currently selected pollutant.
    #[must_use]
    pub fn pollutant(&self) -> Pollutant {
        self.lock().pollutant
    }

    /// Current intensity scalar.
    #[must_use]
    pub fn intensity(&self) -> f64 {
        self.lock().intensity
    }

    /// Mounts the view: ensures the backend is loaded (shared, load-once)
    /// and creates the map instance. Idempotent per container.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the backend cannot be loaded or map
    /// construction fails. The view stays unmounted; the caller renders
    /// without a map rather than crashing.
    pub async fn mount(&self, container: &ContainerId, view: &MapView) -> Result<(), ViewError> {
        {
            let mut state = self.lock();
            if state.lifecycle.handle().is_none() {
                state.phase = SessionPhase::Loading;
            }
        }
        let generation = self.generation.load(Ordering::SeqCst);

        let backend = match self.backend.ensure_ready().await {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("Rendering backend unavailable: {e}");
                let mut state = self.lock();
                if state.phase == SessionPhase::Loading {
                    state.phase = SessionPhase::Unmounted;
                }
                return Err(e.into());
            }
        };

        // Torn down while the backend was loading; expected race.
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(());
        }

        let mut state = self.lock();
        let was_live = state.lifecycle.handle().is_some();
        if let Err(e) = state.lifecycle.create(backend.as_ref(), container, view) {
            state.phase = SessionPhase::Unmounted;
            return Err(e);
        }
        if !was_live {
            state.phase = SessionPhase::MapReady;
        }
        // The shell may have reported layout before the map existed.
        if *self.attached.borrow() {
            state.lifecycle.invalidate_size(backend.as_ref())?;
        }
        Ok(())
    }

    /// Signals that the container has been laid out in the visible tree.
    ///
    /// Runs the size-invalidation pass (idempotent) and unblocks any
    /// pending overlay attachment. Safe to call repeatedly and at any
    /// point relative to [`mount`](Self::mount).
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the size-invalidation call fails.
    pub fn container_attached(&self) -> Result<(), ViewError> {
        {
            let state = self.lock();
            if let Some(backend) = self.backend.get() {
                state.lifecycle.invalidate_size(backend.as_ref())?;
            }
        }
        self.attached.send_replace(true);
        Ok(())
    }

    /// Selects the pollutant category: fetches its samples and swaps the
    /// overlay.
    ///
    /// If a newer selection or a teardown supersedes this call while its
    /// fetch is in flight, the completion is discarded (last writer wins).
    /// Data-layer failures surface as an empty sample set, which attaches
    /// an empty overlay rather than erroring.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if an overlay backend call fails.
    pub async fn set_category(&self, pollutant: Pollutant) -> Result<(), ViewError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().pollutant = pollutant;

        let samples = self.source.fetch_samples(pollutant).await;

        // Overlay attachment waits for the layout signal so the causal
        // order dependency-ready -> attached -> size-invalidated ->
        // overlay-attached holds without wall-clock delays.
        self.wait_attached(generation).await;

        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("Discarding stale samples for {pollutant}");
            return Ok(());
        }
        let Some(map) = state.lifecycle.handle() else {
            // Unmounted mid-fetch; expected race, not an error.
            return Ok(());
        };
        let Some(backend) = self.backend.get() else {
            return Ok(());
        };

        state.phase = SessionPhase::DataReady;
        let config = RenderConfig::for_intensity(state.intensity);
        state.overlay.replace(backend.as_ref(), map, &samples, &config)?;
        state.phase = SessionPhase::OverlayActive;
        Ok(())
    }

    /// Adjusts the heat intensity: restyles the attached overlay in place.
    ///
    /// Never triggers a data fetch; sample data is untouched. The scalar
    /// is clamped to the supported range.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the restyle backend call fails.
    pub fn set_intensity(&self, intensity: f64) -> Result<(), ViewError> {
        let mut state = self.lock();
        state.intensity = intensity.clamp(INTENSITY_MIN, INTENSITY_MAX);

        let Some(backend) = self.backend.get() else {
            return Ok(());
        };
        let config = RenderConfig::for_intensity(state.intensity);
        state.overlay.restyle(backend.as_ref(), &config)?;
        Ok(())
    }

    /// Tears the view down: abandons in-flight work, detaches the overlay,
    /// and destroys the map instance.
    ///
    /// Safe to call when nothing is mounted and while fetches are in
    /// flight; abandoned completions become no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if a backend teardown call fails.
    pub fn teardown(&self) -> Result<(), ViewError> {
        // Invalidate in-flight completions, then wake attachment waiters.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.attached.send_replace(false);

        let mut state = self.lock();
        state.phase = SessionPhase::Unmounted;
        if let Some(backend) = self.backend.get() {
            if let Some(map) = state.lifecycle.handle() {
                state.overlay.detach(backend.as_ref(), map)?;
            }
            state.lifecycle.destroy(backend.as_ref())?;
        }
        Ok(())
    }

    /// Waits until the container-attached signal is set, the session is
    /// torn down, or this caller's generation is superseded.
    async fn wait_attached(&self, generation: u64) {
        let mut rx = self.attached.subscribe();
        loop {
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
