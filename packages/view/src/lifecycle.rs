//! Map instance lifecycle: creation, size correction, destruction.

use pollution_map_backend::{ContainerId, MapHandle, RenderBackend};
use pollution_map_map_models::MapView;

use crate::ViewError;

/// OpenStreetMap tile URL template for the base layer.
const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Attribution string for the base tile layer.
const TILE_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";

/// Owns the single map instance of a mounted view.
///
/// At most one [`MapHandle`] is live at a time; `create` is idempotent per
/// container and `destroy` is a no-op when nothing is live, so both can be
/// called from racy mount/unmount paths without bookkeeping at the call
/// site.
#[derive(Default)]
pub struct MapLifecycle {
    map: Option<MapHandle>,
    container: Option<ContainerId>,
}

impl MapLifecycle {
    /// Creates an empty lifecycle with no live instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: None,
            container: None,
        }
    }

    /// Returns the live handle, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<MapHandle> {
        self.map
    }

    /// Creates the map instance bound to `container`, sets the initial
    /// view, and registers the base tile layer.
    ///
    /// Idempotent: if an instance is already live, the existing handle is
    /// returned unchanged and the backend is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if a backend call fails.
    pub fn create(
        &mut self,
        backend: &dyn RenderBackend,
        container: &ContainerId,
        view: &MapView,
    ) -> Result<MapHandle, ViewError> {
        if let Some(existing) = self.map {
            if self.container.as_ref() != Some(container) {
                // One lifecycle drives one view; keep the live instance.
                log::warn!(
                    "Map already bound to container {:?}; ignoring create for {:?}",
                    self.container.as_ref().map(ContainerId::as_str),
                    container.as_str()
                );
            }
            return Ok(existing);
        }

        let map = backend.create_map(container)?;
        backend.set_view(map, view)?;
        backend.add_tile_layer(map, TILE_URL_TEMPLATE, TILE_ATTRIBUTION)?;

        self.map = Some(map);
        self.container = Some(container.clone());
        log::debug!("Created map {map:?} in container {}", container.as_str());
        Ok(map)
    }

    /// Runs the size-invalidation pass against the live instance.
    ///
    /// Safe to run repeatedly; a no-op when nothing is live.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the backend call fails.
    pub fn invalidate_size(&self, backend: &dyn RenderBackend) -> Result<(), ViewError> {
        if let Some(map) = self.map {
            backend.invalidate_size(map)?;
        }
        Ok(())
    }

    /// Tears down the live instance and clears the stored handle, so a
    /// later `create` is not mistaken for an existing live map.
    ///
    /// A no-op when nothing is live.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the backend call fails.
    pub fn destroy(&mut self, backend: &dyn RenderBackend) -> Result<(), ViewError> {
        self.container = None;
        if let Some(map) = self.map.take() {
            backend.destroy_map(map)?;
            log::debug!("Destroyed map {map:?}");
        }
        Ok(())
    }
}
