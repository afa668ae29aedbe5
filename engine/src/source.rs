//! Things that see.

use std::{cell::RefCell, fmt, rc::Rc, str::FromStr};

use anyhow::bail;
use glam::{vec2, Vec2};
use serde::{Deserialize, Serialize};

/// Team or player a vision source reports to.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(pub u32);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interface the visibility coordinator polls on every tick.
///
/// Implemented by whatever simulation object carries vision. The
/// coordinator only keeps weak handles to providers, their owners decide
/// when they go away.
pub trait VisionProvider {
    /// World space position of the eye.
    fn position(&self) -> Vec2;

    /// Sight radius in world units.
    fn radius(&self) -> f32;

    fn owner(&self) -> OwnerId;

    /// Inactive providers stay registered but reveal nothing.
    fn is_active(&self) -> bool {
        true
    }
}

/// Shared handle to a vision provider.
pub type SourceHandle = Rc<RefCell<dyn VisionProvider>>;

/// Plain data vision source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VisionSource {
    pub position: Vec2,
    pub radius: f32,
    pub owner: OwnerId,
    pub active: bool,
}

impl Default for VisionSource {
    fn default() -> Self {
        VisionSource {
            position: Vec2::ZERO,
            radius: 0.0,
            owner: OwnerId::default(),
            active: true,
        }
    }
}

impl VisionSource {
    pub fn new(position: Vec2, radius: f32, owner: OwnerId) -> Self {
        VisionSource {
            position,
            radius,
            owner,
            active: true,
        }
    }

    /// Wrap the source in a shared handle that can be registered with a
    /// coordinator.
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }
}

impl VisionProvider for VisionSource {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Parse `x,y,radius` or `x,y,radius,owner`.
impl FromStr for VisionSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Ok(((position, radius, owner), rest)) = fields(s) else {
            bail!("bad vision source {s:?}, expected x,y,radius[,owner]");
        };
        if !rest.trim().is_empty() {
            bail!("bad vision source {s:?}, trailing {rest:?}");
        }
        if !position.is_finite() || !(radius.is_finite() && radius >= 0.0) {
            bail!("bad vision source {s:?}");
        }
        Ok(VisionSource::new(position, radius, owner))
    }
}

fn fields(s: &str) -> util::parse::Result<'_, (Vec2, f32, OwnerId)> {
    use util::parse::value;

    let (x, s) = value::<f32>(s, ',')?;
    let (y, s) = value::<f32>(s, ',')?;
    let (radius, s) = value::<f32>(s, ',')?;
    let (owner, s) = if s.trim().is_empty() {
        (0, s)
    } else {
        value::<u32>(s, ',')?
    };
    Ok(((vec2(x, y), radius, OwnerId(owner)), s))
}
