//! The 3×9 ticket grid and its layout rules.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::TicketError;

/// Rows on a ticket.
pub const ROWS: usize = 3;
/// Columns on a ticket.
pub const COLUMNS: usize = 9;
/// Filled cells in every row.
pub const NUMBERS_PER_ROW: usize = 5;
/// Filled cells on a whole ticket.
pub const NUMBERS_PER_GRID: usize = ROWS * NUMBERS_PER_ROW;
/// A column can't hold more numbers than there are rows.
pub const MAX_PER_COLUMN: usize = ROWS;
/// Largest callable number. The universe is `1..=MAX_NUMBER`.
pub const MAX_NUMBER: u8 = 90;

type Cells = [[Option<u8>; COLUMNS]; ROWS];

/// The numbers column `col` may hold.
///
/// Column 0 takes 1–9, the last column takes 80–90 (eleven values), and
/// every column in between takes its own decade.
///
/// # Panics
/// Panics if `col >= COLUMNS`.
pub fn column_range(col: usize) -> RangeInclusive<u8> {
    assert!(col < COLUMNS, "column {col} out of range");
    match col {
        0 => 1..=9,
        8 => 80..=MAX_NUMBER,
        c => {
            let start = (c * 10) as u8;
            start..=start + 9
        }
    }
}

/// A rule-valid ticket layout.
///
/// Construct with [`Grid::new`], which enforces:
/// - exactly [`NUMBERS_PER_ROW`] filled cells per row,
/// - every value inside its [`column_range`],
/// - no value repeated.
///
/// Once built a grid never changes. On the wire it is the bare 3×9 array,
/// with `null` for empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Cells", into = "Cells")]
pub struct Grid {
    cells: Cells,
}

impl Grid {
    /// Validates `cells` and wraps them.
    ///
    /// # Errors
    /// [`TicketError::InvalidGrid`] describing the first broken rule.
    pub fn new(cells: Cells) -> Result<Self, TicketError> {
        let mut seen = HashSet::with_capacity(NUMBERS_PER_GRID);
        for (r, row) in cells.iter().enumerate() {
            let filled = row.iter().flatten().count();
            if filled != NUMBERS_PER_ROW {
                return Err(TicketError::InvalidGrid(format!(
                    "row {r} has {filled} numbers, expected {NUMBERS_PER_ROW}"
                )));
            }
            for (c, cell) in row.iter().enumerate() {
                let Some(value) = *cell else { continue };
                if !column_range(c).contains(&value) {
                    return Err(TicketError::InvalidGrid(format!(
                        "{value} does not belong in column {c}"
                    )));
                }
                if !seen.insert(value) {
                    return Err(TicketError::InvalidGrid(format!("{value} appears twice")));
                }
            }
        }
        Ok(Self { cells })
    }

    /// Wraps cells without checking them. Only for exercising the
    /// integrity guards in claim validation.
    #[cfg(test)]
    pub(crate) fn from_cells_unchecked(cells: Cells) -> Self {
        Self { cells }
    }

    /// The raw cell layout, row-major.
    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    /// The value at `(row, col)`, if that cell is filled.
    pub fn cell(&self, row: usize, col: usize) -> Option<u8> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// The filled values of one row, left to right.
    pub fn row_numbers(&self, row: usize) -> impl Iterator<Item = u8> + '_ {
        self.cells[row].iter().flatten().copied()
    }

    /// Every filled value, row-major.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().flat_map(|row| row.iter().flatten().copied())
    }

    /// Count of filled cells. Always [`NUMBERS_PER_GRID`] for a grid built
    /// through [`Grid::new`].
    pub fn filled_count(&self) -> usize {
        self.numbers().count()
    }
}

impl TryFrom<Cells> for Grid {
    type Error = TicketError;

    fn try_from(cells: Cells) -> Result<Self, Self::Error> {
        Self::new(cells)
    }
}

impl From<Grid> for Cells {
    fn from(grid: Grid) -> Self {
        grid.cells
    }
}
