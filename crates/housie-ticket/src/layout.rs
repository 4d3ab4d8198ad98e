//! Random ticket layout generation.
//!
//! A layout is built in three passes:
//!
//! 1. **Pick** 15 distinct numbers so every column gets 1–3 of them. A
//!    shuffled first pass gives each column one number; a second pass tops
//!    up random columns (never past three) until there are 15.
//! 2. **Place** each column's numbers onto rows, fullest columns first,
//!    preferring rows with the most room left and never more than one
//!    number per row per column.
//! 3. **Balance** any row left short by moving a cell down or up from an
//!    over-full row within the same column.
//!
//! The result still has to pass [`Grid::new`]; a layout that doesn't is
//! discarded and the generator tries again, up to its attempt budget.

use std::cmp::Reverse;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::grid::{COLUMNS, MAX_PER_COLUMN, NUMBERS_PER_GRID, NUMBERS_PER_ROW, ROWS, column_range};
use crate::{Grid, TicketError};

type Cells = [[Option<u8>; COLUMNS]; ROWS];

/// Builds random, rule-valid grids.
#[derive(Debug, Clone)]
pub struct LayoutGenerator {
    max_attempts: u32,
}

impl Default for LayoutGenerator {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl LayoutGenerator {
    /// Attempts per grid before giving up.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// A generator with a custom attempt budget.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Generates one grid.
    ///
    /// # Errors
    /// [`TicketError::Generation`] if no attempt produced a valid layout.
    /// An imperfect layout is never returned.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Grid, TicketError> {
        for attempt in 1..=self.max_attempts {
            let columns = pick_numbers(rng);
            let mut cells = place(&columns, rng);
            rebalance(&mut cells);
            sort_columns(&mut cells);

            match Grid::new(cells) {
                Ok(grid) => return Ok(grid),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "discarding layout");
                }
            }
        }
        tracing::warn!(attempts = self.max_attempts, "layout generation failed");
        Err(TicketError::Generation {
            attempts: self.max_attempts,
        })
    }
}

/// Pass 1: choose the numbers, grouped by column and sorted ascending.
fn pick_numbers<R: Rng + ?Sized>(rng: &mut R) -> [Vec<u8>; COLUMNS] {
    let mut columns: [Vec<u8>; COLUMNS] = Default::default();

    let mut order: Vec<usize> = (0..COLUMNS).collect();
    order.shuffle(rng);
    for col in order {
        add_number(&mut columns[col], col, rng);
    }

    let mut total = COLUMNS;
    while total < NUMBERS_PER_GRID {
        let open: Vec<usize> = (0..COLUMNS)
            .filter(|&c| columns[c].len() < MAX_PER_COLUMN)
            .collect();
        let col = open[rng.random_range(0..open.len())];
        add_number(&mut columns[col], col, rng);
        total += 1;
    }

    for column in &mut columns {
        column.sort_unstable();
    }
    columns
}

/// Adds one value from `col`'s range that the column doesn't hold yet.
fn add_number<R: Rng + ?Sized>(column: &mut Vec<u8>, col: usize, rng: &mut R) {
    let candidates: Vec<u8> = column_range(col)
        .filter(|n| !column.contains(n))
        .collect();
    column.push(candidates[rng.random_range(0..candidates.len())]);
}

/// Pass 2: place every column's numbers onto distinct rows.
fn place<R: Rng + ?Sized>(columns: &[Vec<u8>; COLUMNS], rng: &mut R) -> Cells {
    let mut cells: Cells = [[None; COLUMNS]; ROWS];
    let mut row_fill = [0usize; ROWS];

    // Shuffle first so the stable sort breaks ties randomly.
    let mut col_order: Vec<usize> = (0..COLUMNS).collect();
    col_order.shuffle(rng);
    col_order.sort_by_key(|&c| Reverse(columns[c].len()));

    for col in col_order {
        let mut rows: Vec<usize> = (0..ROWS).collect();
        rows.shuffle(rng);
        rows.sort_by_key(|&r| row_fill[r]);

        let mut chosen: Vec<usize> = Vec::with_capacity(MAX_PER_COLUMN);
        for _ in 0..columns[col].len() {
            let pick = rows
                .iter()
                .copied()
                .find(|r| !chosen.contains(r) && row_fill[*r] < NUMBERS_PER_ROW)
                .or_else(|| rows.iter().copied().find(|r| !chosen.contains(r)));
            if let Some(row) = pick {
                chosen.push(row);
                row_fill[row] += 1;
            }
        }

        chosen.sort_unstable();
        for (row, value) in chosen.into_iter().zip(columns[col].iter().copied()) {
            cells[row][col] = Some(value);
        }
    }
    cells
}

/// Pass 3: move cells from over-full rows into short rows, same column.
fn rebalance(cells: &mut Cells) {
    loop {
        let fill: Vec<usize> = cells.iter().map(|row| row.iter().flatten().count()).collect();
        let Some(short) = (0..ROWS).find(|&r| fill[r] < NUMBERS_PER_ROW) else {
            return;
        };
        let donor = (0..ROWS).filter(|&r| fill[r] > NUMBERS_PER_ROW).find_map(|r| {
            (0..COLUMNS)
                .find(|&c| cells[r][c].is_some() && cells[short][c].is_none())
                .map(|c| (r, c))
        });
        let Some((over, col)) = donor else {
            return;
        };
        cells[short][col] = cells[over][col].take();
    }
}

/// Re-orders each column so values ascend top to bottom.
fn sort_columns(cells: &mut Cells) {
    for col in 0..COLUMNS {
        let rows: Vec<usize> = (0..ROWS).filter(|&r| cells[r][col].is_some()).collect();
        let mut values: Vec<u8> = rows.iter().filter_map(|&r| cells[r][col]).collect();
        values.sort_unstable();
        for (row, value) in rows.into_iter().zip(values) {
            cells[row][col] = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn assert_valid(grid: &Grid) {
        assert_eq!(grid.filled_count(), NUMBERS_PER_GRID);
        for r in 0..ROWS {
            assert_eq!(grid.row_numbers(r).count(), NUMBERS_PER_ROW, "row {r}");
        }
        let unique: HashSet<u8> = grid.numbers().collect();
        assert_eq!(unique.len(), NUMBERS_PER_GRID);
        for c in 0..COLUMNS {
            let column: Vec<u8> = (0..ROWS).filter_map(|r| grid.cell(r, c)).collect();
            assert!(!column.is_empty(), "column {c} is empty");
            assert!(column.len() <= MAX_PER_COLUMN);
            assert!(column.iter().all(|n| column_range(c).contains(n)));
            assert!(column.windows(2).all(|w| w[0] < w[1]), "column {c} not ascending");
        }
    }

    #[test]
    fn test_generate_many_grids_all_valid() {
        let generator = LayoutGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let grid = generator.generate(&mut rng).expect("generation succeeds");
            assert_valid(&grid);
        }
    }

    #[test]
    fn test_generate_is_reproducible_with_seed() {
        let generator = LayoutGenerator::new();
        let a = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        let b = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_varies_between_calls() {
        let generator = LayoutGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let grids: HashSet<Vec<u8>> = (0..50)
            .map(|_| generator.generate(&mut rng).unwrap().numbers().collect())
            .collect();
        assert!(grids.len() > 45, "layouts should rarely repeat");
    }

    #[test]
    fn test_zero_attempt_budget_fails_instead_of_returning_garbage() {
        let generator = LayoutGenerator::with_max_attempts(0);
        let err = generator.generate(&mut StdRng::seed_from_u64(3)).unwrap_err();
        assert_eq!(err, TicketError::Generation { attempts: 0 });
    }

    #[test]
    fn test_pick_numbers_respects_column_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let columns = pick_numbers(&mut rng);
            let total: usize = columns.iter().map(Vec::len).sum();
            assert_eq!(total, NUMBERS_PER_GRID);
            assert!(columns.iter().all(|c| (1..=MAX_PER_COLUMN).contains(&c.len())));
        }
    }

    #[test]
    fn test_rebalance_moves_cell_into_short_row() {
        let mut cells: Cells = [[None; COLUMNS]; ROWS];
        // Row 0 holds six, row 1 holds four, row 2 holds five.
        for c in 0..6 {
            cells[0][c] = Some(*column_range(c).start());
        }
        for c in 5..9 {
            cells[1][c] = Some(*column_range(c).end());
        }
        for c in 0..5 {
            cells[2][c] = Some(*column_range(c).end());
        }

        rebalance(&mut cells);

        for (r, row) in cells.iter().enumerate() {
            assert_eq!(row.iter().flatten().count(), NUMBERS_PER_ROW, "row {r}");
        }
    }
}
