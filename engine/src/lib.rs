//! Fog of war visibility for a 2D ground plane.
//!
//! A [`VisibilityCoordinator`] owns a [`VisionGrid`] and periodically
//! rebuilds it from the registered [`VisionProvider`]s of one owner. Cells
//! seen before but no longer in view stay explored. With an [`ObstacleMap`]
//! installed, sight is computed with recursive shadowcasting, otherwise
//! sources reveal plain circles.

/// Fade level of explored cells when not configured otherwise.
pub const DEFAULT_EXPLORED_ALPHA: f32 = 0.5;

/// Cells whose fade is advanced per call when not configured otherwise.
pub const DEFAULT_FADE_BUDGET: usize = 4096;

mod config;
pub use config::FogConfig;

mod coordinator;
pub use coordinator::{Events, VisibilityCoordinator, VisionEvent};

mod grid;
pub use grid::{Census, VisionGrid, VisionState};

mod obstacle;
pub use obstacle::{ObstacleMap, Occupancy};

pub mod prelude;

mod shadowcast;
pub use shadowcast::shadowcast;

mod source;
pub use source::{OwnerId, SourceHandle, VisionProvider, VisionSource};
