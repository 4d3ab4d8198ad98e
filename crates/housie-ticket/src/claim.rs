//! Win conditions and claim validation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::{NUMBERS_PER_GRID, ROWS};
use crate::{Grid, Ticket, TicketError, TicketId};

/// Count of called numbers that wins Early Five.
const EARLY_FIVE: usize = 5;

/// A named pattern a grid can satisfy against the called numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinCondition {
    TopLine,
    MiddleLine,
    BottomLine,
    FourCorners,
    EarlyFive,
    FullHouse,
}

impl WinCondition {
    /// Every condition, in prize-table order.
    pub const ALL: [WinCondition; 6] = [
        Self::EarlyFive,
        Self::TopLine,
        Self::MiddleLine,
        Self::BottomLine,
        Self::FourCorners,
        Self::FullHouse,
    ];

    /// The wire name, e.g. `"full-house"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLine => "top-line",
            Self::MiddleLine => "middle-line",
            Self::BottomLine => "bottom-line",
            Self::FourCorners => "four-corners",
            Self::EarlyFive => "early-five",
            Self::FullHouse => "full-house",
        }
    }

    /// The numbers on `grid` that prove this condition, or `None`.
    pub fn proof(self, grid: &Grid, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
        match self {
            Self::TopLine => line(grid, 0, called),
            Self::MiddleLine => line(grid, 1, called),
            Self::BottomLine => line(grid, 2, called),
            Self::FourCorners => four_corners(grid, called),
            Self::EarlyFive => early_five(grid, called),
            Self::FullHouse => full_house(grid, called),
        }
    }
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses wire names leniently: case, `_` and spaces are normalised, so
/// `"full-house"`, `"FULL_HOUSE"` and `"Full House"` all parse.
impl FromStr for WinCondition {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalised)
            .ok_or_else(|| TicketError::UnknownClaimType(s.to_string()))
    }
}

/// Which ticket proved a claim and with which numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub ticket_id: TicketId,
    pub numbers: Vec<u8>,
}

/// The result of validating a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Valid(Evidence),
    Invalid { reason: String },
}

impl ClaimOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Checks `tickets` in assignment order and returns the first that
/// satisfies `condition` against `called`.
///
/// Holding several tickets never hurts: any single qualifying ticket wins.
pub fn validate(tickets: &[Ticket], condition: WinCondition, called: &BTreeSet<u8>) -> ClaimOutcome {
    if tickets.is_empty() {
        return ClaimOutcome::Invalid {
            reason: "no tickets assigned".into(),
        };
    }
    tickets
        .iter()
        .find_map(|ticket| {
            condition.proof(&ticket.grid, called).map(|numbers| Evidence {
                ticket_id: ticket.id.clone(),
                numbers,
            })
        })
        .map_or_else(
            || ClaimOutcome::Invalid {
                reason: format!("no ticket satisfies {condition} yet"),
            },
            ClaimOutcome::Valid,
        )
}

fn all_called(numbers: Vec<u8>, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
    numbers.iter().all(|n| called.contains(n)).then_some(numbers)
}

fn line(grid: &Grid, row: usize, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
    let numbers: Vec<u8> = grid.row_numbers(row).collect();
    if numbers.is_empty() {
        return None;
    }
    all_called(numbers, called)
}

fn four_corners(grid: &Grid, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
    let mut corners = Vec::with_capacity(4);
    for row in [0, ROWS - 1] {
        let numbers: Vec<u8> = grid.row_numbers(row).collect();
        corners.push(*numbers.first()?);
        corners.push(*numbers.last()?);
    }
    let distinct: BTreeSet<u8> = corners.iter().copied().collect();
    if distinct.len() != corners.len() {
        return None;
    }
    all_called(corners, called)
}

fn early_five(grid: &Grid, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
    let hits: Vec<u8> = grid
        .numbers()
        .filter(|n| called.contains(n))
        .take(EARLY_FIVE)
        .collect();
    (hits.len() == EARLY_FIVE).then_some(hits)
}

fn full_house(grid: &Grid, called: &BTreeSet<u8>) -> Option<Vec<u8>> {
    let numbers: Vec<u8> = grid.numbers().collect();
    if numbers.len() != NUMBERS_PER_GRID {
        tracing::warn!(
            filled = numbers.len(),
            "grid with wrong cell count can't win full house"
        );
        return None;
    }
    all_called(numbers, called)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::{sample_cells, sample_grid};

    fn ticket(id: &str, grid: Grid) -> Ticket {
        Ticket {
            id: TicketId(id.into()),
            grid,
        }
    }

    fn called(numbers: &[u8]) -> BTreeSet<u8> {
        numbers.iter().copied().collect()
    }

    /// The exact set that satisfies `condition` on the sample grid.
    fn winning_set(condition: WinCondition) -> Vec<u8> {
        let grid = sample_grid();
        match condition {
            WinCondition::TopLine => grid.row_numbers(0).collect(),
            WinCondition::MiddleLine => grid.row_numbers(1).collect(),
            WinCondition::BottomLine => grid.row_numbers(2).collect(),
            WinCondition::FourCorners => vec![4, 85, 7, 79],
            WinCondition::EarlyFive => vec![12, 21, 57, 85, 88],
            WinCondition::FullHouse => grid.numbers().collect(),
        }
    }

    #[test]
    fn test_parse_wire_names() {
        for c in WinCondition::ALL {
            assert_eq!(c.as_str().parse::<WinCondition>().unwrap(), c);
        }
        assert_eq!("Full House".parse::<WinCondition>().unwrap(), WinCondition::FullHouse);
        assert_eq!("TOP_LINE".parse::<WinCondition>().unwrap(), WinCondition::TopLine);
    }

    #[test]
    fn test_parse_unknown_claim_type() {
        let err = "pyramid".parse::<WinCondition>().unwrap_err();
        assert_eq!(err, TicketError::UnknownClaimType("pyramid".into()));
    }

    #[test]
    fn test_serde_name_matches_display() {
        let json = serde_json::to_string(&WinCondition::FourCorners).unwrap();
        assert_eq!(json, "\"four-corners\"");
        assert_eq!(WinCondition::FourCorners.to_string(), "four-corners");
    }

    #[test]
    fn test_each_condition_wins_on_exact_set() {
        let tickets = [ticket("t1", sample_grid())];
        for c in WinCondition::ALL {
            let outcome = validate(&tickets, c, &called(&winning_set(c)));
            assert!(outcome.is_valid(), "{c} should win on its exact set");
        }
    }

    #[test]
    fn test_each_condition_fails_when_one_number_missing() {
        let tickets = [ticket("t1", sample_grid())];
        for c in WinCondition::ALL {
            let set = winning_set(c);
            for skip in 0..set.len() {
                let mut partial = set.clone();
                partial.remove(skip);
                let outcome = validate(&tickets, c, &called(&partial));
                assert!(!outcome.is_valid(), "{c} must not win without {}", set[skip]);
            }
        }
    }

    #[test]
    fn test_line_evidence_is_the_row() {
        let tickets = [ticket("t1", sample_grid())];
        let outcome = validate(&tickets, WinCondition::MiddleLine, &called(&[12, 33, 51, 74, 88, 1, 2]));
        assert_eq!(
            outcome,
            ClaimOutcome::Valid(Evidence {
                ticket_id: TicketId("t1".into()),
                numbers: vec![12, 33, 51, 74, 88],
            })
        );
    }

    #[test]
    fn test_early_five_evidence_is_first_five_row_major() {
        let tickets = [ticket("t1", sample_grid())];
        let outcome = validate(
            &tickets,
            WinCondition::EarlyFive,
            &called(&[4, 21, 42, 63, 85, 12, 7]),
        );
        match outcome {
            ClaimOutcome::Valid(e) => assert_eq!(e.numbers, vec![4, 21, 42, 63, 85]),
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn test_second_ticket_can_win() {
        let mut other = sample_cells();
        // Swap rows so the second ticket's top line is the sample's bottom line.
        other.swap(0, 2);
        let tickets = [
            ticket("t1", sample_grid()),
            ticket("t2", Grid::new(other).unwrap()),
        ];
        let outcome = validate(&tickets, WinCondition::TopLine, &called(&[7, 18, 39, 57, 79]));
        match outcome {
            ClaimOutcome::Valid(e) => assert_eq!(e.ticket_id, TicketId("t2".into())),
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn test_no_tickets_is_invalid() {
        let outcome = validate(&[], WinCondition::FullHouse, &called(&[1, 2, 3]));
        assert!(matches!(outcome, ClaimOutcome::Invalid { .. }));
    }

    #[test]
    fn test_full_house_rejects_malformed_grid() {
        let mut cells = sample_cells();
        cells[0][0] = None;
        let broken = Grid::from_cells_unchecked(cells);
        let everything: BTreeSet<u8> = (1..=90).collect();
        assert_eq!(WinCondition::FullHouse.proof(&broken, &everything), None);
    }

    #[test]
    fn test_four_corners_needs_distinct_corners() {
        // A malformed single-cell top row makes both top corners the same cell.
        let mut cells = sample_cells();
        cells[0] = [Some(4), None, None, None, None, None, None, None, None];
        let broken = Grid::from_cells_unchecked(cells);
        let everything: BTreeSet<u8> = (1..=90).collect();
        assert_eq!(WinCondition::FourCorners.proof(&broken, &everything), None);
    }
}
