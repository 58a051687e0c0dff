//! Display Cell Grid
//!
//! The uniform output of every aircraft decoder: a 14 row by 24 column buffer
//! of optional glyphs, indexed `row * COLUMNS + col`.
//!
//! An empty cell means "leave the peripheral cell blank". A populated cell
//! carries the character, a single-letter colour code and a size flag, which
//! is exactly what the display wire format expects (see
//! [`crate::transport::frame`]).

use std::fmt;

use serde::ser::{SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};

/// Number of character rows on the display
pub const ROWS: usize = 14;

/// Number of character columns on the display
pub const COLUMNS: usize = 24;

/// Total number of cells in a grid
pub const CELL_COUNT: usize = ROWS * COLUMNS;

/// Colour codes understood by the display peripheral
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellColor {
    /// `a`
    Amber,
    /// `c`
    Cyan,
    /// `e`
    Grey,
    /// `g`
    Green,
    /// `m`
    Magenta,
    /// `r`
    Red,
    /// `w`
    White,
    /// `y`
    Yellow,
}

impl CellColor {
    /// Wire code for this colour
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Amber => 'a',
            Self::Cyan => 'c',
            Self::Grey => 'e',
            Self::Green => 'g',
            Self::Magenta => 'm',
            Self::Red => 'r',
            Self::White => 'w',
            Self::Yellow => 'y',
        }
    }

    /// Parse a wire code
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'a' => Some(Self::Amber),
            'c' => Some(Self::Cyan),
            'e' => Some(Self::Grey),
            'g' => Some(Self::Green),
            'm' => Some(Self::Magenta),
            'r' => Some(Self::Red),
            'w' => Some(Self::White),
            'y' => Some(Self::Yellow),
            _ => None,
        }
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Glyph size flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSize {
    /// Flag `0`
    #[default]
    Normal,
    /// Flag `1`
    Large,
}

impl FontSize {
    /// Wire flag for this size
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Large => 1,
        }
    }
}

/// A populated display cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Glyph {
    /// Character shown in the cell
    pub ch: char,
    /// Colour of the character
    pub color: CellColor,
    /// Size of the character
    pub size: FontSize,
}

impl Glyph {
    /// Create a glyph
    #[must_use]
    pub fn new(ch: char, color: CellColor, size: FontSize) -> Self {
        Self { ch, color, size }
    }
}

impl Serialize for Glyph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.ch)?;
        tuple.serialize_element(&self.color.code())?;
        tuple.serialize_element(&self.size.flag())?;
        tuple.end()
    }
}

/// One grid cell; `None` is blank
pub type Cell = Option<Glyph>;

/// The 14x24 display buffer
///
/// Always holds exactly [`CELL_COUNT`] cells. Writes outside the grid are
/// rejected rather than wrapped.
#[derive(Clone, PartialEq, Eq)]
pub struct CellGrid {
    cells: Vec<Cell>,
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl CellGrid {
    /// Create a blank grid
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![None; CELL_COUNT],
        }
    }

    /// Flat index for a row/column pair, if it lies on the grid
    #[must_use]
    pub fn index(row: usize, col: usize) -> Option<usize> {
        (row < ROWS && col < COLUMNS).then(|| row * COLUMNS + col)
    }

    /// Read a cell
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&Glyph> {
        Self::index(row, col).and_then(|i| self.cells[i].as_ref())
    }

    /// Write a cell, returning `false` if the position is off the grid
    pub fn set(&mut self, row: usize, col: usize, glyph: Glyph) -> bool {
        match Self::index(row, col) {
            Some(i) => {
                self.cells[i] = Some(glyph);
                true
            }
            None => false,
        }
    }

    /// All cells in row-major order
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cells of a single row
    ///
    /// # Panics
    ///
    /// Panics if `row >= ROWS`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * COLUMNS..(row + 1) * COLUMNS]
    }

    /// Number of populated cells
    #[must_use]
    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Whether no cell is populated
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Characters of a row as text, blanks rendered as spaces
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        self.row(row)
            .iter()
            .map(|c| c.map_or(' ', |g| g.ch))
            .collect()
    }
}

impl fmt::Debug for CellGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CellGrid [")?;
        for row in 0..ROWS {
            writeln!(f, "  {:2} |{}|", row, self.row_text(row))?;
        }
        write!(f, "]")
    }
}

impl Serialize for CellGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(CELL_COUNT))?;
        for cell in &self.cells {
            match cell {
                Some(glyph) => seq.serialize_element(glyph)?,
                None => seq.serialize_element(&[] as &[u8; 0])?,
            }
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_blank() {
        let grid = CellGrid::new();
        assert_eq!(grid.cells().len(), CELL_COUNT);
        assert!(grid.is_blank());
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = CellGrid::new();
        let glyph = Glyph::new('A', CellColor::Green, FontSize::Large);
        assert!(grid.set(13, 23, glyph));
        assert_eq!(grid.get(13, 23), Some(&glyph));
        assert_eq!(grid.cells()[CELL_COUNT - 1], Some(glyph));
        assert_eq!(grid.populated(), 1);
    }

    #[test]
    fn test_set_off_grid_is_rejected() {
        let mut grid = CellGrid::new();
        let glyph = Glyph::new('A', CellColor::White, FontSize::Normal);
        assert!(!grid.set(14, 0, glyph));
        assert!(!grid.set(0, 24, glyph));
        assert!(grid.is_blank());
    }

    #[test]
    fn test_color_codes_round_trip() {
        for color in [
            CellColor::Amber,
            CellColor::Cyan,
            CellColor::Grey,
            CellColor::Green,
            CellColor::Magenta,
            CellColor::Red,
            CellColor::White,
            CellColor::Yellow,
        ] {
            assert_eq!(CellColor::from_code(color.code()), Some(color));
        }
        assert_eq!(CellColor::from_code('b'), None);
    }

    #[test]
    fn test_serialize_cells() {
        let mut grid = CellGrid::new();
        grid.set(0, 1, Glyph::new('\u{00B0}', CellColor::Cyan, FontSize::Large));

        let json = serde_json::to_value(&grid).unwrap();
        let cells = json.as_array().unwrap();
        assert_eq!(cells.len(), CELL_COUNT);
        assert_eq!(cells[0], serde_json::json!([]));
        assert_eq!(cells[1], serde_json::json!(["\u{00B0}", "c", 1]));
    }

    #[test]
    fn test_row_text() {
        let mut grid = CellGrid::new();
        grid.set(2, 0, Glyph::new('O', CellColor::White, FontSize::Normal));
        grid.set(2, 1, Glyph::new('K', CellColor::White, FontSize::Normal));
        assert_eq!(grid.row_text(2).trim_end(), "OK");
    }
}
