//! Recursive shadowcasting.
//!
//! The field around the origin is split into eight octants. Light is cast
//! into a single canonical octant where rows are at `dy = -distance` and the
//! scan runs from the diagonal (`dx = -distance`) to the axis (`dx = 0`).
//! Each [`Octant`] maps canonical offsets into its own part of the plane.
//!
//! ```notrust
//!   \ 0 | 3 /
//!  1 \  |  / 2
//! ----- @ -----
//!  6 /  |  \ 5
//!   / 7 | 4 \
//! ```

/// Linear transform from the canonical octant into one of the eight octants
/// around the origin.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Octant {
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

impl Octant {
    /// Map an offset in the canonical octant into this octant.
    pub const fn transform(&self, dx: i32, dy: i32) -> [i32; 2] {
        [dx * self.xx + dy * self.xy, dx * self.yx + dy * self.yy]
    }
}

/// The eight octant transforms, every cell around the origin falls in at
/// least one of them.
#[rustfmt::skip]
pub const OCTANTS: [Octant; 8] = [
    Octant { xx:  1, xy:  0, yx:  0, yy:  1 },
    Octant { xx:  0, xy:  1, yx:  1, yy:  0 },
    Octant { xx:  0, xy: -1, yx:  1, yy:  0 },
    Octant { xx: -1, xy:  0, yx:  0, yy:  1 },
    Octant { xx: -1, xy:  0, yx:  0, yy: -1 },
    Octant { xx:  0, xy: -1, yx: -1, yy:  0 },
    Octant { xx:  0, xy:  1, yx: -1, yy:  0 },
    Octant { xx:  1, xy:  0, yx:  0, yy: -1 },
];

/// Compute the field of view from `origin` out to `radius` cells.
///
/// Cells whose squared distance from the origin is at most `radius²` are
/// passed to `reveal` unless an opaque cell shadows them. Opaque cells are
/// revealed themselves, light stops behind them. The origin is always
/// revealed and is never tested for opacity. A negative radius reveals
/// nothing.
///
/// `is_opaque` is queried for every scanned cell, including ones the caller
/// might consider out of bounds. Answer `false` for those to let the scan
/// carry on past the edge of the map.
///
/// Cells on the seams between octants may be passed to `reveal` more than
/// once, so `reveal` should be idempotent.
pub fn cast<V>(
    origin: V,
    radius: i32,
    mut is_opaque: impl FnMut(V) -> bool,
    mut reveal: impl FnMut(V),
) where
    V: From<[i32; 2]> + Into<[i32; 2]> + Copy,
{
    if radius < 0 {
        return;
    }

    reveal(origin);

    let mut opaque = |p: [i32; 2]| is_opaque(V::from(p));
    let mut lit = |p: [i32; 2]| reveal(V::from(p));

    let mut caster = Caster {
        origin: origin.into(),
        radius,
        is_opaque: &mut opaque,
        reveal: &mut lit,
    };

    for octant in &OCTANTS {
        caster.cast_light(octant, 1, 1.0, 0.0);
    }
}

struct Caster<'a> {
    origin: [i32; 2],
    radius: i32,
    is_opaque: &'a mut dyn FnMut([i32; 2]) -> bool,
    reveal: &'a mut dyn FnMut([i32; 2]),
}

impl Caster<'_> {
    /// Scan rows starting from `row` within the slope window from `start`
    /// down to `end`.
    fn cast_light(&mut self, octant: &Octant, row: i32, mut start: f32, end: f32) {
        if start < end {
            return;
        }

        let radius_2 = self.radius as i64 * self.radius as i64;
        let mut new_start = 0.0;

        for distance in row..=self.radius {
            let dy = -distance;
            let mut blocked = false;

            for dx in -distance..=0 {
                // Slopes of the cell's far corners as seen from the origin.
                let left = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let right = (dx as f32 + 0.5) / (dy as f32 - 0.5);

                if start < right {
                    continue;
                }
                if end > left {
                    break;
                }

                let [tx, ty] = octant.transform(dx, dy);
                let cell = [self.origin[0] + tx, self.origin[1] + ty];

                if (dx as i64).pow(2) + (dy as i64).pow(2) <= radius_2 {
                    (self.reveal)(cell);
                }

                let opaque = (self.is_opaque)(cell);
                if blocked {
                    if opaque {
                        new_start = right;
                    } else {
                        blocked = false;
                        start = new_start;
                    }
                } else if opaque && distance < self.radius {
                    // Light continues past the blocker on the far side of
                    // the gap, run it in its own narrower window.
                    blocked = true;
                    self.cast_light(octant, distance + 1, start, left);
                    new_start = right;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    /// Parse a map where `#` is a wall and `@` is the origin, cast from the
    /// origin and draw the result with `*` for lit floor.
    fn lit_map(map: &str, radius: i32) -> String {
        let mut walls = BTreeSet::new();
        let mut origin = [0, 0];
        let (mut w, mut h) = (0, 0);

        for (y, line) in map.lines().enumerate() {
            for (x, c) in line.chars().enumerate() {
                let p = [x as i32, y as i32];
                match c {
                    '#' => {
                        walls.insert(p);
                    }
                    '@' => origin = p,
                    _ => {}
                }
                w = w.max(x as i32 + 1);
            }
            h = y as i32 + 1;
        }

        let mut lit = BTreeSet::new();
        cast(
            origin,
            radius,
            |p: [i32; 2]| walls.contains(&p),
            |p: [i32; 2]| {
                if (0..w).contains(&p[0]) && (0..h).contains(&p[1]) {
                    lit.insert(p);
                }
            },
        );

        let mut ret = String::new();
        for y in 0..h {
            for x in 0..w {
                let p = [x, y];
                ret.push(if p == origin {
                    '@'
                } else if walls.contains(&p) {
                    '#'
                } else if lit.contains(&p) {
                    '*'
                } else {
                    '.'
                });
            }
            ret.push('\n');
        }
        ret
    }

    fn collect(origin: [i32; 2], radius: i32) -> BTreeSet<[i32; 2]> {
        let mut ret = BTreeSet::new();
        cast(origin, radius, |_: [i32; 2]| false, |p: [i32; 2]| {
            ret.insert(p);
        });
        ret
    }

    #[test]
    fn octants_cover_the_plane() {
        let mut seen = BTreeSet::new();
        for octant in &OCTANTS {
            for d in 1..=3 {
                for dx in -d..=0 {
                    seen.insert(octant.transform(dx, -d));
                }
            }
        }

        for y in -3..=3 {
            for x in -3..=3 {
                if [x, y] != [0, 0] {
                    assert!(seen.contains(&[x, y]), "missed {x}, {y}");
                }
            }
        }
    }

    #[test]
    fn open_field_is_a_disk() {
        assert_eq!(
            lit_map(
                "\
.........
.........
.........
....@....
.........
.........
.........",
                3
            ),
            "\
....*....
..*****..
..*****..
.***@***.
..*****..
..*****..
....*....
"
        );

        let disk = collect([0, 0], 5);
        for y in -6..=6 {
            for x in -6..=6 {
                assert_eq!(disk.contains(&[x, y]), x * x + y * y <= 25);
            }
        }
    }

    #[test]
    fn wall_casts_shadow() {
        assert_eq!(
            lit_map(
                "\
.........
.........
....#....
....@....
.........
.........
.........",
                3
            ),
            "\
.........
..**.**..
..**#**..
.***@***.
..*****..
..*****..
....*....
"
        );
    }

    #[test]
    fn pillar_shadow_widens() {
        assert_eq!(
            lit_map(
                "\
...........
...........
...........
.....#.....
...........
.....@.....
...........",
                5
            ),
            "\
...........
..***.***..
.****.****.
.****#****.
.*********.
*****@*****
.*********.
"
        );
    }

    #[test]
    fn light_passes_through_gap() {
        assert_eq!(
            lit_map(
                "\
...........
...###.#...
...........
.....@.....",
                4
            ),
            "\
......**...
..*###*#*..
..*******..
.****@****.
"
        );
    }

    #[test]
    fn degenerate_radius() {
        assert!(collect([3, 4], -1).is_empty());
        assert_eq!(collect([3, 4], 0), BTreeSet::from([[3, 4]]));
        assert_eq!(collect([3, 4], 1).len(), 5);
    }

    #[test]
    fn origin_is_never_tested() {
        let mut lit = BTreeSet::new();
        cast(
            [0, 0],
            2,
            |p: [i32; 2]| {
                assert_ne!(p, [0, 0]);
                true
            },
            |p: [i32; 2]| {
                lit.insert(p);
            },
        );
        // Walled in on every side, only the immediate ring is lit.
        assert_eq!(lit.len(), 9);
    }
}
