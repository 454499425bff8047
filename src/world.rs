use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{RaycastError, Result};
use crate::math::Vec2;

/// Unit square of the world grid. Cell (x, y) covers `[x, x+1) × [y, y+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a world-space point. Saturates at the `i32` range.
    #[inline]
    pub fn containing(p: Vec2) -> Self {
        Self {
            x: p.x.floor() as i32,
            y: p.y.floor() as i32,
        }
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u16);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What occupies a solid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WallDescriptor {
    pub texture: TextureId,
    /// Opaque per-wall tag carried through to hits; the core does not interpret it.
    pub variant: u8,
}

impl WallDescriptor {
    #[inline]
    pub const fn new(texture: u16) -> Self {
        Self {
            texture: TextureId(texture),
            variant: 0,
        }
    }
}

/// Sparse, unbounded grid. Cells without an entry are empty space.
#[derive(Debug, Clone, Default)]
pub struct WorldGrid {
    cells: HashMap<Cell, WallDescriptor>,
}

impl WorldGrid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&WallDescriptor> {
        self.cells.get(&cell)
    }

    #[inline]
    pub fn is_solid(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn insert(&mut self, cell: Cell, wall: WallDescriptor) -> Option<WallDescriptor> {
        self.cells.insert(cell, wall)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &WallDescriptor)> {
        self.cells.iter().map(|(c, w)| (*c, w))
    }
}

impl FromIterator<(Cell, WallDescriptor)> for WorldGrid {
    fn from_iter<I: IntoIterator<Item = (Cell, WallDescriptor)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Cell, WallDescriptor)> for WorldGrid {
    fn extend<I: IntoIterator<Item = (Cell, WallDescriptor)>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

/// A parsed map: the grid plus an optional spawn cell.
#[derive(Debug, Clone)]
pub struct MapDefinition {
    pub grid: WorldGrid,
    pub spawn: Option<Cell>,
}

/// Layout used by the viewer when no map file is configured.
pub const DEMO_MAP: &str = "\
11111111111111111111
1..................1
1..111111222222.2221
1.....1.....2......1
1.....1.....2......1
1...111.....2222...1
1.....1222..2......1
1......222..2.1.2.11
1.........s........1
11111111111111111111
";

impl MapDefinition {
    /// Parses an ASCII map.
    ///
    /// The first line is the northernmost row, so the last line becomes
    /// row `y = 0`. `.` and space are empty, `1`..`9` are walls with that
    /// texture id, `s` marks the spawn cell. Trailing blank lines are ignored.
    pub fn parse_ascii(text: &str) -> Result<Self> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let rows = lines.len();
        let mut grid = WorldGrid::new();
        let mut spawn = None;

        for (line_idx, line) in lines.iter().enumerate() {
            let y = (rows - 1 - line_idx) as i32;
            for (col_idx, ch) in line.chars().enumerate() {
                let cell = Cell::new(col_idx as i32, y);
                match ch {
                    '.' | ' ' => {}
                    's' => spawn = Some(cell),
                    '1'..='9' => {
                        let id = ch as u16 - '0' as u16;
                        grid.insert(cell, WallDescriptor::new(id));
                    }
                    found => {
                        return Err(RaycastError::MapParse {
                            line: line_idx + 1,
                            column: col_idx + 1,
                            found,
                        });
                    }
                }
            }
        }

        log::debug!(
            "parsed map: {} rows, {} wall cells, spawn {:?}",
            rows,
            grid.len(),
            spawn
        );
        Ok(Self { grid, spawn })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RaycastError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse_ascii(&text)?;
        log::info!(
            "loaded map {} ({} wall cells)",
            path.display(),
            map.grid.len()
        );
        Ok(map)
    }

    pub fn demo() -> Result<Self> {
        Self::parse_ascii(DEMO_MAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn absent_cells_are_empty() {
        let grid: WorldGrid = [(Cell::new(5, 0), WallDescriptor::new(1))]
            .into_iter()
            .collect();
        assert_eq!(grid.get(Cell::new(5, 0)), Some(&WallDescriptor::new(1)));
        assert!(grid.get(Cell::new(4, 0)).is_none());
        assert!(grid.get(Cell::new(i32::MIN, i32::MAX)).is_none());
        assert!(!grid.is_solid(Cell::new(-1_000_000, 7)));
    }

    #[test]
    fn negative_coordinates() {
        let mut grid = WorldGrid::new();
        grid.insert(Cell::new(-3, -7), WallDescriptor::new(2));
        assert!(grid.is_solid(Cell::containing(Vec2::new(-2.5, -6.01))));
        assert!(!grid.is_solid(Cell::containing(Vec2::new(-2.5, -5.99))));
    }

    #[test]
    fn containing_floors_toward_negative_infinity() {
        assert_eq!(Cell::containing(Vec2::new(-0.1, 0.9)), Cell::new(-1, 0));
        assert_eq!(Cell::containing(Vec2::new(3.0, -2.0)), Cell::new(3, -2));
    }

    #[test]
    fn parse_flips_rows() {
        let map = MapDefinition::parse_ascii("12\n.s\n").unwrap();
        // last text line is y = 0
        assert_eq!(map.spawn, Some(Cell::new(1, 0)));
        assert_eq!(map.grid.get(Cell::new(0, 1)).map(|w| w.texture), Some(TextureId(1)));
        assert_eq!(map.grid.get(Cell::new(1, 1)).map(|w| w.texture), Some(TextureId(2)));
        assert!(!map.grid.is_solid(Cell::new(0, 0)));
        assert_eq!(map.grid.len(), 2);
    }

    #[test]
    fn parse_rejects_unknown_char() {
        let err = MapDefinition::parse_ascii("111\n1x1\n111").unwrap_err();
        match err {
            RaycastError::MapParse {
                line,
                column,
                found,
            } => {
                assert_eq!((line, column, found), (2, 2, 'x'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn demo_map_has_spawn() {
        let map = MapDefinition::demo().unwrap();
        let spawn = map.spawn.unwrap();
        assert!(!map.grid.is_solid(spawn));
        assert_eq!(spawn, Cell::new(10, 1));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "111\n1s1\n111").unwrap();
        let map = MapDefinition::load(file.path()).unwrap();
        assert_eq!(map.spawn, Some(Cell::new(1, 1)));
        assert_eq!(map.grid.len(), 8);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = MapDefinition::load(Path::new("/definitely/not/here.map")).unwrap_err();
        assert!(matches!(err, RaycastError::Io { .. }));
    }
}
