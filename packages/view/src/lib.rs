#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Map lifecycle, heat overlay ownership, and view coordination.
//!
//! One [`MapSession`] drives one mounted map view: it loads the rendering
//! backend (shared, load-once), creates the map instance, sequences sample
//! fetches against layout attachment, and swaps or restyles the heat
//! overlay as the user changes category and intensity. Overlapping fetches
//! are resolved last-writer-wins via a generation counter; teardown
//! abandons in-flight work without leaving a dangling overlay.

pub mod lifecycle;
pub mod overlay;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use lifecycle::MapLifecycle;
pub use overlay::OverlayController;
pub use session::{MapSession, SessionPhase};

use pollution_map_backend::BackendError;

/// Errors from driving the map view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The rendering backend failed to load or to execute a call.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
