//! Heat overlay ownership: replacement and in-place restyle.

use pollution_map_backend::{MapHandle, OverlayHandle, RenderBackend};
use pollution_map_map_models::{PointSample, RenderConfig};

use crate::ViewError;

/// Owns the single active heat overlay of a map instance.
///
/// The split between [`replace`](Self::replace) (new sample set) and
/// [`restyle`](Self::restyle) (new configuration only) is what keeps
/// intensity-slider interactions free of data fetches.
#[derive(Default)]
pub struct OverlayController {
    overlay: Option<OverlayHandle>,
}

impl OverlayController {
    /// Creates a controller with no attached overlay.
    #[must_use]
    pub const fn new() -> Self {
        Self { overlay: None }
    }

    /// Returns the attached overlay, if any.
    #[must_use]
    pub const fn active(&self) -> Option<OverlayHandle> {
        self.overlay
    }

    /// Swaps in an overlay built from a fresh sample set.
    ///
    /// The previous overlay (if any) is detached first, so exactly one
    /// overlay is attached once this returns. An empty sample set is valid
    /// and renders nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if a backend call fails.
    pub fn replace(
        &mut self,
        backend: &dyn RenderBackend,
        map: MapHandle,
        samples: &[PointSample],
        config: &RenderConfig,
    ) -> Result<OverlayHandle, ViewError> {
        if let Some(previous) = self.overlay.take() {
            backend.remove_overlay(map, previous)?;
        }

        let overlay = backend.add_heat_overlay(map, samples, config)?;
        self.overlay = Some(overlay);
        log::debug!("Attached overlay {overlay:?} with {} samples", samples.len());
        Ok(overlay)
    }

    /// Updates the attached overlay's rendering configuration in place.
    ///
    /// Never touches sample data; a no-op when no overlay is attached.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the backend call fails.
    pub fn restyle(
        &self,
        backend: &dyn RenderBackend,
        config: &RenderConfig,
    ) -> Result<(), ViewError> {
        if let Some(overlay) = self.overlay {
            backend.set_overlay_config(overlay, config)?;
        }
        Ok(())
    }

    /// Detaches the overlay ahead of map teardown. A no-op when none is
    /// attached.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the backend call fails.
    pub fn detach(
        &mut self,
        backend: &dyn RenderBackend,
        map: MapHandle,
    ) -> Result<(), ViewError> {
        if let Some(overlay) = self.overlay.take() {
            backend.remove_overlay(map, overlay)?;
        }
        Ok(())
    }
}
