pub use crate::{
    FogConfig, ObstacleMap, OwnerId, VisibilityCoordinator, VisionEvent,
    VisionGrid, VisionProvider, VisionSource, VisionState,
};
pub use glam::{ivec2, vec2, IVec2, Vec2};
pub use util::{HashMap, HashSet};
