#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Rendering backend capability surface and dependency loader.
//!
//! The base-map provider is an external collaborator. This crate pins down
//! the capability surface the rest of the system is allowed to use
//! ([`RenderBackend`]) and owns the one piece of process-scoped state in the
//! system: the lazily-loaded, load-once backend instance ([`SharedBackend`]).

use std::sync::Arc;

use async_trait::async_trait;
use pollution_map_map_models::{MapView, PointSample, RenderConfig};
use tokio::sync::OnceCell;

/// Errors from loading or driving the rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend or its heat-overlay capability could not be loaded.
    #[error("backend load failed: {message}")]
    Load {
        /// Description of what went wrong.
        message: String,
    },

    /// A backend call failed against a live map instance.
    #[error("backend render call failed: {message}")]
    Render {
        /// Description of what went wrong.
        message: String,
    },
}

/// Identifier of the screen region a map instance binds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque handle to a live map instance, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(u64);

impl MapHandle {
    /// Creates a handle from a backend-issued identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the backend-issued identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Opaque handle to an attached heat overlay, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(u64);

impl OverlayHandle {
    /// Creates a handle from a backend-issued identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the backend-issued identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The capability surface of the base-map rendering backend.
///
/// Implementations wrap whatever mapping library is actually present. All
/// calls are synchronous once the backend is loaded; the asynchronous part
/// of the story (script/network loading) lives in [`BackendLoader`].
pub trait RenderBackend: Send + Sync {
    /// Creates a map instance bound to the given screen region.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the container cannot host a map.
    fn create_map(&self, container: &ContainerId) -> Result<MapHandle, BackendError>;

    /// Destroys a map instance and everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the handle is not live.
    fn destroy_map(&self, map: MapHandle) -> Result<(), BackendError>;

    /// Sets the map's center and zoom.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the handle is not live.
    fn set_view(&self, map: MapHandle, view: &MapView) -> Result<(), BackendError>;

    /// Recomputes the map's pixel dimensions after a layout change.
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the handle is not live.
    fn invalidate_size(&self, map: MapHandle) -> Result<(), BackendError>;

    /// Registers the base tile layer.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the handle is not live.
    fn add_tile_layer(
        &self,
        map: MapHandle,
        url_template: &str,
        attribution: &str,
    ) -> Result<(), BackendError>;

    /// Attaches a heat-density overlay built from the given samples.
    /// An empty sample set is valid and renders nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the handle is not live.
    fn add_heat_overlay(
        &self,
        map: MapHandle,
        samples: &[PointSample],
        config: &RenderConfig,
    ) -> Result<OverlayHandle, BackendError>;

    /// Detaches an overlay from its map.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if either handle is not live.
    fn remove_overlay(&self, map: MapHandle, overlay: OverlayHandle) -> Result<(), BackendError>;

    /// Updates an attached overlay's rendering configuration in place.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the overlay handle is not live.
    fn set_overlay_config(
        &self,
        overlay: OverlayHandle,
        config: &RenderConfig,
    ) -> Result<(), BackendError>;
}

/// Loads the rendering backend and its heat-overlay capability.
///
/// Loading may involve network or script fetches and can fail; the loader
/// must report that failure rather than hang.
#[async_trait]
pub trait BackendLoader: Send + Sync {
    /// Performs the load.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Load`] if the backend cannot be made
    /// available.
    async fn load(&self) -> Result<Arc<dyn RenderBackend>, BackendError>;
}

/// Init-once holder for the loaded rendering backend.
///
/// One `SharedBackend` is created per process and handed to every view by
/// `Arc`. Concurrent [`ensure_ready`](Self::ensure_ready) callers share a
/// single in-flight load; once loaded, the backend lives for the rest of the
/// process. A failed load is reported to every waiting caller and is not
/// cached, so a later call starts a fresh attempt.
pub struct SharedBackend {
    loader: Arc<dyn BackendLoader>,
    cell: OnceCell<Arc<dyn RenderBackend>>,
}

impl SharedBackend {
    /// Creates an unloaded holder around the given loader.
    #[must_use]
    pub fn new(loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    /// Resolves once the backend is available, loading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Load`] if the load fails. Callers are
    /// expected to degrade (render no map) rather than crash.
    pub async fn ensure_ready(&self) -> Result<Arc<dyn RenderBackend>, BackendError> {
        self.cell
            .get_or_try_init(|| async {
                log::debug!("Loading rendering backend...");
                let backend = self.loader.load().await?;
                log::debug!("Rendering backend ready");
                Ok(backend)
            })
            .await
            .cloned()
    }

    /// Returns the backend if it has already been loaded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<dyn RenderBackend>> {
        self.cell.get().cloned()
    }

    /// Returns `true` once a load has completed successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}
