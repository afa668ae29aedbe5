//! Static terrain that stops sight.

use anyhow::{bail, Result};
use glam::{ivec2, IVec2};
use util::{AsciiMap, IndexMap};

/// Whether light can pass through a cell.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
pub enum Occupancy {
    #[default]
    Empty,
    Obstacle,
}

impl Occupancy {
    pub fn to_char(self) -> char {
        match self {
            Occupancy::Empty => '.',
            Occupancy::Obstacle => '#',
        }
    }
}

/// Per-cell occupancy matching a vision grid cell for cell.
///
/// Built once from a terrain scan and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleMap {
    width: i32,
    height: i32,
    cells: Vec<Occupancy>,
}

impl ObstacleMap {
    /// Build a map by asking `scan` about every cell.
    pub fn from_fn(
        width: i32,
        height: i32,
        mut scan: impl FnMut(IVec2) -> Occupancy,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            bail!("ObstacleMap: bad dimensions {width}x{height}");
        }
        let Some(len) = (width as usize).checked_mul(height as usize) else {
            bail!("ObstacleMap: {width}x{height} is too large");
        };

        let mut cells = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                cells.push(scan(ivec2(x, y)));
            }
        }

        Ok(ObstacleMap {
            width,
            height,
            cells,
        })
    }

    /// Build a map with obstacles at the given cells.
    pub fn from_cells(
        width: i32,
        height: i32,
        obstacles: impl IntoIterator<Item = IVec2>,
    ) -> Result<Self> {
        let mut ret = ObstacleMap::from_fn(width, height, |_| Occupancy::Empty)?;
        for cell in obstacles {
            let Some(i) = ret.idx(cell) else {
                bail!("ObstacleMap: obstacle {cell} outside {width}x{height}");
            };
            ret.cells[i] = Occupancy::Obstacle;
        }
        Ok(ret)
    }

    /// Parse a map drawn with `#` for obstacles and `.` for empty cells.
    ///
    /// Ragged lines are padded with empty cells.
    pub fn from_ascii(map: &str) -> Result<Self> {
        let legend: IndexMap<char, Occupancy> = [
            (Occupancy::Empty.to_char(), Occupancy::Empty),
            (Occupancy::Obstacle.to_char(), Occupancy::Obstacle),
        ]
        .into_iter()
        .collect();
        let map = AsciiMap::new(map, legend);

        let mut obstacles = Vec::new();
        for (p, c, occupancy) in map.iter() {
            match occupancy {
                Some(Occupancy::Obstacle) => obstacles.push(p),
                Some(Occupancy::Empty) => {}
                None => bail!("ObstacleMap: unknown glyph {c:?} at {p}"),
            }
        }

        let dim = map.dim();
        ObstacleMap::from_cells(dim.x, dim.y, obstacles)
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

    fn idx(&self, cell: IVec2) -> Option<usize> {
        ((0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y))
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Occupancy of a cell, cells outside the map are empty.
    pub fn get(&self, cell: IVec2) -> Occupancy {
        self.idx(cell)
            .map(|i| self.cells[i])
            .unwrap_or(Occupancy::Empty)
    }

    pub fn is_obstacle(&self, cell: IVec2) -> bool {
        self.get(cell) == Occupancy::Obstacle
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == Occupancy::Obstacle)
            .count()
    }
}
