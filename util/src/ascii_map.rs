use glam::{ivec2, IVec2};

use crate::IndexMap;

/// Character grid with a legend that maps glyphs to values.
///
/// Leading blank lines and the common indentation of the non-blank lines are
/// stripped, so maps can be written inline in indented source code.
#[derive(Clone, Default, Debug)]
pub struct AsciiMap<T> {
    map: String,
    legend: IndexMap<char, T>,
}

impl<T> AsciiMap<T> {
    pub fn new(map: impl AsRef<str>, legend: IndexMap<char, T>) -> Self {
        let map = map.as_ref().trim_end();

        let mut y_skip = 0;
        let mut x_skip = usize::MAX;
        let mut seen_content = false;

        for line in map.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                if !seen_content {
                    y_skip += 1;
                }
                continue;
            }
            seen_content = true;

            x_skip = x_skip
                .min(line.chars().take_while(|c| c.is_whitespace()).count());
        }

        if !seen_content {
            return AsciiMap {
                map: String::new(),
                legend,
            };
        }

        let mut trimmed_map = String::new();
        for line in map.lines().skip(y_skip) {
            for c in line.trim_end().chars().skip(x_skip) {
                trimmed_map.push(c);
            }
            trimmed_map.push('\n');
        }

        AsciiMap {
            map: trimmed_map,
            legend,
        }
    }

    /// Iterate the points, glyphs and legend entries (if present) on the
    /// map.
    ///
    /// Whitespace cells are skipped, the topmost row is at y = 0.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, char, Option<&T>)> + '_ {
        self.map.lines().enumerate().flat_map(move |(y, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, c)| !c.is_whitespace())
                .map(move |(x, c)| {
                    (ivec2(x as i32, y as i32), c, self.legend.get(&c))
                })
        })
    }

    /// Width of the longest line and number of lines.
    pub fn dim(&self) -> IVec2 {
        let w = self
            .map
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        ivec2(w as i32, self.map.lines().count() as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_indentation() {
        let legend: IndexMap<char, bool> =
            [('#', true), ('.', false)].into_iter().collect();
        let map = AsciiMap::new(
            "

              ##.
              .#.
              ...",
            legend,
        );

        assert_eq!(map.dim(), ivec2(3, 3));

        let walls: Vec<IVec2> = map
            .iter()
            .filter_map(|(p, _, v)| (v == Some(&true)).then_some(p))
            .collect();
        assert_eq!(walls, vec![ivec2(0, 0), ivec2(1, 0), ivec2(1, 1)]);
    }

    #[test]
    fn unknown_glyphs() {
        let map: AsciiMap<()> = AsciiMap::new("a b", Default::default());
        let cells: Vec<_> = map.iter().collect();
        assert_eq!(cells, vec![(ivec2(0, 0), 'a', None), (ivec2(2, 0), 'b', None)]);
        assert_eq!(map.dim(), ivec2(3, 1));
    }

    #[test]
    fn blank() {
        let map: AsciiMap<()> = AsciiMap::new("  \n\n ", Default::default());
        assert!(map.is_empty());
        assert_eq!(map.dim(), ivec2(0, 0));
    }
}
