// Proptest strategies for grids and called sets.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Grid, LayoutGenerator, MAX_NUMBER, NUMBERS_PER_GRID, Ticket, TicketId, WinCondition};

/// Shared config. `PROPTEST_CASES` overrides the case count.
pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(64)
        .max(1);
    ProptestConfig {
        failure_persistence: None,
        cases,
        ..ProptestConfig::default()
    }
}

/// A rule-valid grid, built by the layout generator from a drawn seed.
pub fn grid() -> impl Strategy<Value = Grid> {
    any::<u64>().prop_map(|seed| {
        LayoutGenerator::new()
            .generate(&mut StdRng::seed_from_u64(seed))
            .expect("default budget builds a grid")
    })
}

pub fn ticket() -> impl Strategy<Value = Ticket> {
    grid().prop_map(|grid| Ticket {
        id: TicketId("K7TQ2M-asha-00001".into()),
        grid,
    })
}

pub fn condition() -> impl Strategy<Value = WinCondition> {
    prop::sample::select(WinCondition::ALL.to_vec())
}

/// Which of a grid's numbers are called, row-major. The hit rate is drawn
/// first so dense masks (whole lines, full houses) come up often.
pub fn mask() -> impl Strategy<Value = Vec<bool>> {
    (0.3f64..1.0).prop_flat_map(|p| prop::collection::vec(prop::bool::weighted(p), NUMBERS_PER_GRID))
}

/// Up to `max` distinct numbers from the whole range.
pub fn noise(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::sample::subsequence((1..=MAX_NUMBER).collect::<Vec<u8>>(), 0..=max)
}

/// `count` distinct positions among a grid's numbers.
pub fn positions(count: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::sample::subsequence((0..NUMBERS_PER_GRID).collect::<Vec<usize>>(), count)
}
