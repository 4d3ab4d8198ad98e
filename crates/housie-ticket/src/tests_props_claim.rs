// Property tests for claim validation over generated grids.

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::grid::ROWS;
use crate::{ClaimOutcome, Grid, WinCondition, test_gens, validate};

/// Whether `condition` holds on `grid`, read straight off the rules.
fn holds(grid: &Grid, condition: WinCondition, called: &BTreeSet<u8>) -> bool {
    let on = |n: &u8| called.contains(n);
    let row = |r: usize| grid.row_numbers(r).collect::<Vec<u8>>();
    match condition {
        WinCondition::TopLine => row(0).iter().all(on),
        WinCondition::MiddleLine => row(1).iter().all(on),
        WinCondition::BottomLine => row(ROWS - 1).iter().all(on),
        WinCondition::FourCorners => [row(0), row(ROWS - 1)]
            .iter()
            .all(|r| on(&r[0]) && on(&r[r.len() - 1])),
        WinCondition::EarlyFive => grid.numbers().filter(on).count() >= 5,
        WinCondition::FullHouse => grid.numbers().all(|n| on(&n)),
    }
}

/// A smallest called set that wins `condition` on `grid`. Early Five
/// uses the numbers at `five`.
fn winning_set(grid: &Grid, condition: WinCondition, five: &[usize]) -> Vec<u8> {
    let numbers: Vec<u8> = grid.numbers().collect();
    let row = |r: usize| grid.row_numbers(r).collect::<Vec<u8>>();
    match condition {
        WinCondition::TopLine => row(0),
        WinCondition::MiddleLine => row(1),
        WinCondition::BottomLine => row(ROWS - 1),
        WinCondition::FourCorners => [row(0), row(ROWS - 1)]
            .iter()
            .flat_map(|r| [r[0], r[r.len() - 1]])
            .collect(),
        WinCondition::EarlyFive => five.iter().map(|&i| numbers[i]).collect(),
        WinCondition::FullHouse => numbers,
    }
}

proptest! {
    #![proptest_config(test_gens::proptest_config())]

    /// Property: validate agrees with the rules
    /// For any grid and any called set, a claim is valid exactly when the
    /// condition holds, and the evidence is called numbers on that grid.
    #[test]
    fn prop_validate_matches_rules(
        ticket in test_gens::ticket(),
        condition in test_gens::condition(),
        mask in test_gens::mask(),
        noise in test_gens::noise(20),
    ) {
        let mut called: BTreeSet<u8> = ticket
            .grid
            .numbers()
            .zip(&mask)
            .filter(|(_, hit)| **hit)
            .map(|(n, _)| n)
            .collect();
        called.extend(noise);

        let outcome = validate(std::slice::from_ref(&ticket), condition, &called);
        prop_assert_eq!(outcome.is_valid(), holds(&ticket.grid, condition, &called),
            "{} on {:?} with {:?}", condition, ticket.grid, called);

        if let ClaimOutcome::Valid(evidence) = outcome {
            prop_assert_eq!(&evidence.ticket_id, &ticket.id);
            let on_grid: BTreeSet<u8> = ticket.grid.numbers().collect();
            for n in &evidence.numbers {
                prop_assert!(called.contains(n) && on_grid.contains(n),
                    "evidence number {} must be called and on the grid", n);
            }
        }
    }

    /// Property: one short never wins
    /// A smallest winning set is valid; drop any one of its numbers and
    /// the claim fails, however many off-grid numbers are called.
    #[test]
    fn prop_winning_set_minus_one_is_invalid(
        ticket in test_gens::ticket(),
        condition in test_gens::condition(),
        five in test_gens::positions(5),
        dropped in any::<prop::sample::Index>(),
        noise in test_gens::noise(40),
    ) {
        let on_grid: BTreeSet<u8> = ticket.grid.numbers().collect();
        let off_grid: BTreeSet<u8> = noise.into_iter().filter(|n| !on_grid.contains(n)).collect();
        let winning = winning_set(&ticket.grid, condition, &five);

        let mut called: BTreeSet<u8> = winning.iter().copied().collect();
        called.extend(&off_grid);
        prop_assert!(validate(std::slice::from_ref(&ticket), condition, &called).is_valid(),
            "{} should win with {:?}", condition, winning);

        called.remove(&winning[dropped.index(winning.len())]);
        prop_assert!(!validate(std::slice::from_ref(&ticket), condition, &called).is_valid(),
            "{} must not win with {:?}", condition, called);
    }
}
