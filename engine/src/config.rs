use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{OwnerId, DEFAULT_EXPLORED_ALPHA, DEFAULT_FADE_BUDGET};

/// Fog of war settings, fixed for the lifetime of a coordinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FogConfig {
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    /// World units per cell side.
    pub cell_size: f32,
    /// World position of the corner of cell (0, 0).
    pub origin: Vec2,
    /// Seconds between vision updates.
    pub update_interval: f32,
    /// Fade units per second, a full fade is 1.0.
    pub fade_speed: f32,
    /// Maximum number of cells whose fade is advanced per call.
    pub fade_budget: usize,
    /// Fade level of explored cells that are not currently visible.
    pub explored_alpha: f32,
    /// Only sources belonging to this owner reveal cells.
    pub local_owner: OwnerId,
}

impl Default for FogConfig {
    fn default() -> Self {
        FogConfig {
            width: 64,
            height: 64,
            cell_size: 1.0,
            origin: Vec2::ZERO,
            update_interval: 0.1,
            fade_speed: 4.0,
            fade_budget: DEFAULT_FADE_BUDGET,
            explored_alpha: DEFAULT_EXPLORED_ALPHA,
            local_owner: OwnerId::default(),
        }
    }
}

impl FogConfig {
    /// Parse and validate an IDM config.
    pub fn from_idm(text: &str) -> Result<Self> {
        let config: FogConfig = idm::from_str(text)
            .map_err(|e| anyhow!("FogConfig: parse error: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate an IDM config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("FogConfig: can't read {}", path.display()))?;
        let config = FogConfig::from_idm(&text)
            .with_context(|| format!("FogConfig: bad config {}", path.display()))?;
        log::info!("FogConfig: loaded {}", path.display());
        Ok(config)
    }

    /// Check for settings that would leave the grid unusable.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            bail!("FogConfig: bad dimensions {}x{}", self.width, self.height);
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            bail!("FogConfig: bad cell size {}", self.cell_size);
        }
        if !self.origin.is_finite() {
            bail!("FogConfig: bad origin {}", self.origin);
        }
        if !(self.update_interval.is_finite() && self.update_interval >= 0.0) {
            bail!("FogConfig: bad update interval {}", self.update_interval);
        }
        if !(self.fade_speed.is_finite() && self.fade_speed >= 0.0) {
            bail!("FogConfig: bad fade speed {}", self.fade_speed);
        }
        if self.fade_budget == 0 {
            bail!("FogConfig: fade budget must be positive");
        }
        if !(0.0..=1.0).contains(&self.explored_alpha) {
            bail!("FogConfig: bad explored alpha {}", self.explored_alpha);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::vec2;

    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(FogConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = [
            FogConfig {
                width: 0,
                ..Default::default()
            },
            FogConfig {
                height: -3,
                ..Default::default()
            },
            FogConfig {
                cell_size: 0.0,
                ..Default::default()
            },
            FogConfig {
                cell_size: f32::NAN,
                ..Default::default()
            },
            FogConfig {
                origin: vec2(0.0, f32::NEG_INFINITY),
                ..Default::default()
            },
            FogConfig {
                update_interval: -1.0,
                ..Default::default()
            },
            FogConfig {
                fade_budget: 0,
                ..Default::default()
            },
            FogConfig {
                explored_alpha: 1.5,
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(config.validate().is_err(), "accepted {config:?}");
        }
    }

    #[test]
    fn idm_config() {
        let config = FogConfig {
            width: 32,
            height: 16,
            cell_size: 2.5,
            origin: vec2(-40.0, 8.0),
            local_owner: OwnerId(3),
            ..Default::default()
        };

        let text = idm::to_string(&config).unwrap();
        assert_eq!(FogConfig::from_idm(&text).unwrap(), config);

        let broken = idm::to_string(&FogConfig {
            width: 0,
            ..config
        })
        .unwrap();
        assert!(FogConfig::from_idm(&broken).is_err());
    }
}
