//! The call engine: which numbers have been called in one room.

use std::collections::BTreeSet;

use housie_ticket::MAX_NUMBER;
use rand::Rng;

use crate::RoomError;

/// Tracks called and available numbers for one game.
///
/// `called` and `available` always partition `1..=90`. `history` is the
/// called set in call order, for the end-of-game summary.
#[derive(Debug, Clone)]
pub struct CallEngine {
    called: BTreeSet<u8>,
    available: BTreeSet<u8>,
    history: Vec<u8>,
}

impl Default for CallEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CallEngine {
    /// An engine with every number available.
    pub fn new() -> Self {
        Self {
            called: BTreeSet::new(),
            available: (1..=MAX_NUMBER).collect(),
            history: Vec::new(),
        }
    }

    /// Makes every number available again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Moves one uniformly random available number to the called set.
    ///
    /// Returns `None` (and changes nothing) when nothing is left.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u8> {
        if self.available.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.available.len());
        let number = self.available.iter().nth(index).copied()?;
        self.available.remove(&number);
        self.called.insert(number);
        self.history.push(number);
        self.debug_check();
        Some(number)
    }

    /// Flips `number` between called and available.
    ///
    /// Returns `true` if the number is called afterwards.
    ///
    /// # Errors
    /// [`RoomError::BadRequest`] if `number` is outside `1..=90`.
    pub fn toggle(&mut self, number: u8) -> Result<bool, RoomError> {
        if !(1..=MAX_NUMBER).contains(&number) {
            return Err(RoomError::BadRequest(format!(
                "number {number} outside 1..={MAX_NUMBER}"
            )));
        }
        let now_called = if self.called.remove(&number) {
            self.available.insert(number);
            self.history.retain(|&n| n != number);
            false
        } else {
            self.available.remove(&number);
            self.called.insert(number);
            self.history.push(number);
            true
        };
        self.debug_check();
        Ok(now_called)
    }

    pub fn called(&self) -> &BTreeSet<u8> {
        &self.called
    }

    /// The called set, ascending.
    pub fn called_list(&self) -> Vec<u8> {
        self.called.iter().copied().collect()
    }

    /// The called set in call order.
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    /// `true` if called and available exactly partition `1..=90`.
    pub fn is_partition(&self) -> bool {
        self.called.is_disjoint(&self.available)
            && self.called.len() + self.available.len() == usize::from(MAX_NUMBER)
            && self
                .called
                .iter()
                .chain(&self.available)
                .all(|n| (1..=MAX_NUMBER).contains(n))
            && self.history.len() == self.called.len()
    }

    fn debug_check(&self) {
        debug_assert!(self.is_partition(), "called/available partition broken");
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_new_engine_has_everything_available() {
        let engine = CallEngine::new();
        assert_eq!(engine.remaining(), 90);
        assert!(engine.called().is_empty());
        assert!(engine.is_partition());
    }

    #[test]
    fn test_draw_until_exhausted() {
        let mut engine = CallEngine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut drawn = BTreeSet::new();
        while let Some(n) = engine.draw(&mut rng) {
            assert!(drawn.insert(n), "{n} drawn twice");
            assert!(engine.is_partition());
        }
        assert_eq!(drawn.len(), 90);
        assert!(engine.is_exhausted());
        assert_eq!(engine.history().len(), 90);
        assert_eq!(engine.draw(&mut rng), None);
    }

    #[test]
    fn test_called_list_is_ascending() {
        let mut engine = CallEngine::new();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            engine.draw(&mut rng);
        }
        let list = engine.called_list();
        assert!(list.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_toggle_in_and_out() {
        let mut engine = CallEngine::new();
        assert!(engine.toggle(42).unwrap());
        assert!(engine.called().contains(&42));
        assert_eq!(engine.remaining(), 89);
        assert_eq!(engine.history(), &[42]);

        assert!(!engine.toggle(42).unwrap());
        assert!(!engine.called().contains(&42));
        assert_eq!(engine.remaining(), 90);
        assert!(engine.history().is_empty());
        assert!(engine.is_partition());
    }

    #[test]
    fn test_toggle_rejects_out_of_range() {
        let mut engine = CallEngine::new();
        assert!(matches!(engine.toggle(0), Err(RoomError::BadRequest(_))));
        assert!(matches!(engine.toggle(91), Err(RoomError::BadRequest(_))));
        assert!(engine.is_partition());
    }

    #[test]
    fn test_toggled_out_number_can_be_drawn_again() {
        let mut engine = CallEngine::new();
        for n in 1..=89 {
            engine.toggle(n).unwrap();
        }
        engine.toggle(10).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut last_two: Vec<u8> = (0..2).filter_map(|_| engine.draw(&mut rng)).collect();
        last_two.sort_unstable();
        assert_eq!(last_two, vec![10, 90]);
        assert!(engine.is_exhausted());
    }

    #[test]
    fn test_reset_restores_partition() {
        let mut engine = CallEngine::new();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..30 {
            engine.draw(&mut rng);
        }
        engine.reset();
        assert_eq!(engine.remaining(), 90);
        assert!(engine.history().is_empty());
        assert!(engine.is_partition());
    }
}
