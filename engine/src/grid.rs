//! Per-cell visibility state of the ground plane.

use anyhow::{bail, Result};
use glam::{ivec2, IVec2, Vec2};
use serde::{Deserialize, Serialize};
use util::HashSet;

use crate::{FogConfig, DEFAULT_EXPLORED_ALPHA, DEFAULT_FADE_BUDGET};

/// What the observer knows about a cell.
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
#[serde(rename_all = "kebab-case")]
pub enum VisionState {
    /// Never seen.
    #[default]
    Unexplored,
    /// Seen before, not currently in view.
    Explored,
    /// In view of at least one vision source right now.
    Visible,
}

impl VisionState {
    pub fn is_visible(self) -> bool {
        self == VisionState::Visible
    }

    /// Cell has been seen at some point, including right now.
    pub fn is_explored(self) -> bool {
        self != VisionState::Unexplored
    }

    /// Glyph for debug maps.
    pub fn to_char(self) -> char {
        match self {
            VisionState::Unexplored => '.',
            VisionState::Explored => '-',
            VisionState::Visible => '*',
        }
    }
}

/// Number of cells in each state.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct Census {
    pub unexplored: usize,
    pub explored: usize,
    pub visible: usize,
}

/// Fog of war state for a rectangular grid of cells on the ground plane.
///
/// Cells are stored row-major, cell (0, 0) starts at `origin` in world space
/// and cells extend towards positive x and y. Dimensions are fixed at
/// construction.
#[derive(Clone, Debug)]
pub struct VisionGrid {
    width: i32,
    height: i32,
    cell_size: f32,
    origin: Vec2,

    cells: Vec<VisionState>,

    /// Render-side reveal amount, 1.0 is fully revealed.
    fade: Vec<f32>,
    explored_alpha: f32,
    fade_budget: usize,
    /// Next cell index `advance_fade` looks at.
    fade_cursor: usize,

    /// Cells whose state changed since the last drain.
    dirty: HashSet<IVec2>,
}

impl VisionGrid {
    /// Create an unexplored grid.
    ///
    /// Fails if the grid would have no addressable cells or the cell size is
    /// not a positive finite number.
    pub fn new(
        width: i32,
        height: i32,
        cell_size: f32,
        origin: Vec2,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            bail!("VisionGrid: bad dimensions {width}x{height}");
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            bail!("VisionGrid: bad cell size {cell_size}");
        }
        if !origin.is_finite() {
            bail!("VisionGrid: bad origin {origin}");
        }
        let Some(len) = (width as usize).checked_mul(height as usize) else {
            bail!("VisionGrid: {width}x{height} is too large");
        };

        log::info!(
            "VisionGrid: {width}x{height} cells of size {cell_size} at {origin}"
        );

        Ok(VisionGrid {
            width,
            height,
            cell_size,
            origin,
            cells: vec![VisionState::Unexplored; len],
            fade: vec![0.0; len],
            explored_alpha: DEFAULT_EXPLORED_ALPHA,
            fade_budget: DEFAULT_FADE_BUDGET,
            fade_cursor: 0,
            dirty: Default::default(),
        })
    }

    /// Create a grid with the layout and fade settings of a config.
    pub fn from_config(config: &FogConfig) -> Result<Self> {
        config.validate()?;
        let mut ret = VisionGrid::new(
            config.width,
            config.height,
            config.cell_size,
            config.origin,
        )?;
        ret.explored_alpha = config.explored_alpha;
        ret.fade_budget = config.fade_budget;
        Ok(ret)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn dim(&self) -> IVec2 {
        ivec2(self.width, self.height)
    }

    /// World units per cell side.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World space position of the corner of cell (0, 0).
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_valid_cell(&self, cell: IVec2) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    fn idx(&self, cell: IVec2) -> Option<usize> {
        self.is_valid_cell(cell)
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    fn cell_at(&self, i: usize) -> IVec2 {
        let w = self.width as usize;
        ivec2((i % w) as i32, (i / w) as i32)
    }

    /// Cell containing a world position. The result is not clamped to the
    /// grid.
    pub fn world_to_grid(&self, pos: Vec2) -> IVec2 {
        ((pos - self.origin) / self.cell_size).floor().as_ivec2()
    }

    /// World position of the center of a cell.
    pub fn grid_to_world(&self, cell: IVec2) -> Vec2 {
        self.origin + (cell.as_vec2() + Vec2::splat(0.5)) * self.cell_size
    }

    /// State of a cell, cells outside the grid are unexplored.
    pub fn state(&self, cell: IVec2) -> VisionState {
        self.idx(cell)
            .map(|i| self.cells[i])
            .unwrap_or(VisionState::Unexplored)
    }

    /// State at a world position, non-finite positions are outside the
    /// grid.
    pub fn query(&self, pos: Vec2) -> VisionState {
        if !pos.is_finite() {
            return VisionState::Unexplored;
        }
        self.state(self.world_to_grid(pos))
    }

    /// Set a cell's state, marking it dirty if it changed.
    ///
    /// Does nothing for cells outside the grid.
    pub fn set_state(&mut self, cell: IVec2, state: VisionState) {
        let Some(i) = self.idx(cell) else {
            return;
        };
        if self.cells[i] == state {
            return;
        }

        self.cells[i] = state;
        if state == VisionState::Visible {
            self.fade[i] = 1.0;
        }
        self.dirty.insert(cell);
    }

    /// Mark a cell as currently visible.
    pub fn reveal(&mut self, cell: IVec2) {
        self.set_state(cell, VisionState::Visible);
    }

    /// Downgrade every visible cell to explored.
    pub fn clear_visible_cells(&mut self) {
        for i in 0..self.cells.len() {
            if self.cells[i] == VisionState::Visible {
                self.cells[i] = VisionState::Explored;
                let cell = self.cell_at(i);
                self.dirty.insert(cell);
            }
        }
    }

    /// Set every cell in the grid to the same state.
    pub fn set_all(&mut self, state: VisionState) {
        for i in 0..self.cells.len() {
            let cell = self.cell_at(i);
            self.set_state(cell, state);
        }
    }

    /// Reveal cells whose centers are within `radius` world units of
    /// `center`.
    ///
    /// The cell containing `center` is always revealed. A negative radius
    /// reveals nothing.
    pub fn reveal_circle(&mut self, center: Vec2, radius: f32) {
        if !center.is_finite() || !(radius >= 0.0) {
            return;
        }

        self.reveal(self.world_to_grid(center));

        let r = Vec2::splat(radius);
        let min = self.world_to_grid(center - r).max(IVec2::ZERO);
        let max = self.world_to_grid(center + r).min(self.dim() - IVec2::ONE);
        let r2 = radius * radius;

        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let cell = ivec2(x, y);
                if self.grid_to_world(cell).distance_squared(center) <= r2 {
                    self.reveal(cell);
                }
            }
        }
    }

    /// Return the cells changed since the previous drain and start a new
    /// changeset.
    pub fn drain_dirty_cells(&mut self) -> HashSet<IVec2> {
        std::mem::take(&mut self.dirty)
    }

    /// Number of cells changed since the previous drain.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Render reveal amount of a cell, 0.0 outside the grid.
    pub fn fade_alpha(&self, cell: IVec2) -> f32 {
        self.idx(cell).map(|i| self.fade[i]).unwrap_or(0.0)
    }

    fn fade_target(&self, state: VisionState) -> f32 {
        match state {
            VisionState::Unexplored => 0.0,
            VisionState::Explored => self.explored_alpha,
            VisionState::Visible => 1.0,
        }
    }

    /// Move fade values towards the targets of their cells' states.
    ///
    /// At most the configured fade budget of cells is processed per call,
    /// continuing from where the previous call left off. The step is scaled
    /// up by how many calls a full sweep of the grid takes so that the rate
    /// of fading does not depend on the budget. Returns whether any fade
    /// value changed.
    pub fn advance_fade(&mut self, dt: f32, fade_speed: f32) -> bool {
        let n = self.cells.len();
        let budget = self.fade_budget.min(n);
        if budget == 0 || !(dt > 0.0) || !(fade_speed > 0.0) {
            return false;
        }

        let step = dt * fade_speed * (n as f32 / budget as f32);
        let mut changed = false;

        for _ in 0..budget {
            let i = self.fade_cursor;
            self.fade_cursor = (i + 1) % n;

            let target = self.fade_target(self.cells[i]);
            let alpha = self.fade[i];
            if alpha < target {
                self.fade[i] = (alpha + step).min(target);
                changed = true;
            } else if alpha > target {
                self.fade[i] = (alpha - step).max(target);
                changed = true;
            }
        }

        changed
    }

    /// Iterate all cells with their states in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, VisionState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &s)| (self.cell_at(i), s))
    }

    pub fn census(&self) -> Census {
        let mut ret = Census::default();
        for s in &self.cells {
            match s {
                VisionState::Unexplored => ret.unexplored += 1,
                VisionState::Explored => ret.explored += 1,
                VisionState::Visible => ret.visible += 1,
            }
        }
        ret
    }

    /// Draw the grid as text, one line per row starting from y = 0.
    pub fn to_ascii(&self) -> String {
        let mut ret = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.cells.chunks(self.width as usize) {
            ret.extend(row.iter().map(|s| s.to_char()));
            ret.push('\n');
        }
        ret
    }
}
