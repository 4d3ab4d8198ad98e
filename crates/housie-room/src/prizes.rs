//! The prize table: which win conditions are in play and who has won them.

use std::collections::BTreeMap;

use housie_protocol::{PrizeSetting, PrizeStatus, WinnerRecord};
use housie_ticket::WinCondition;

use crate::RoomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Prize {
    active: bool,
    max_winners: u32,
    winners: u32,
}

/// Active conditions, their winner caps, and the append-only winners list.
///
/// `winners` for a condition never exceeds its `max_winners`.
#[derive(Debug, Clone, Default)]
pub struct PrizeBoard {
    prizes: BTreeMap<WinCondition, Prize>,
    winners: Vec<WinnerRecord>,
}

impl PrizeBoard {
    /// Builds a board from the table submitted with `start-game`.
    ///
    /// # Errors
    /// - [`RoomError::Ticket`] (`UnknownClaimType`) for an unknown name
    /// - [`RoomError::BadRequest`] for a duplicate entry or a zero cap on
    ///   an active prize
    /// - [`RoomError::Validation`] if no prize is active
    pub fn from_settings(settings: &[PrizeSetting]) -> Result<Self, RoomError> {
        let mut prizes = BTreeMap::new();
        for setting in settings {
            let condition: WinCondition = setting.claim_type.parse()?;
            if setting.active && setting.max_winners == 0 {
                return Err(RoomError::BadRequest(format!(
                    "{condition} is active with max_winners 0"
                )));
            }
            let prize = Prize {
                active: setting.active,
                max_winners: setting.max_winners,
                winners: 0,
            };
            if prizes.insert(condition, prize).is_some() {
                return Err(RoomError::BadRequest(format!("{condition} listed twice")));
            }
        }
        if !prizes.values().any(|p| p.active) {
            return Err(RoomError::Validation(
                "at least one prize must be active".into(),
            ));
        }
        Ok(Self {
            prizes,
            winners: Vec::new(),
        })
    }

    /// Checks that `condition` can still be won.
    ///
    /// # Errors
    /// [`RoomError::Capacity`] if it's inactive or its cap is full.
    pub fn check_open(&self, condition: WinCondition) -> Result<(), RoomError> {
        match self.prizes.get(&condition) {
            Some(p) if p.active && p.winners < p.max_winners => Ok(()),
            Some(p) if p.active => Err(RoomError::Capacity(format!(
                "{condition} already has {} winner(s)",
                p.winners
            ))),
            _ => Err(RoomError::Capacity(format!("{condition} is not active"))),
        }
    }

    /// Whether `player` already holds a win for `condition`.
    pub fn has_won(&self, player: &str, condition: WinCondition) -> bool {
        self.winners
            .iter()
            .any(|w| w.player == player && w.claim_type == condition)
    }

    /// Records a verified win, re-checking the cap first.
    ///
    /// # Errors
    /// [`RoomError::Capacity`] ("cap already reached") if another winner
    /// filled the cap since the claim was queued.
    pub fn record_win(&mut self, record: WinnerRecord) -> Result<(), RoomError> {
        let prize = self
            .prizes
            .get_mut(&record.claim_type)
            .filter(|p| p.active)
            .ok_or_else(|| RoomError::Capacity(format!("{} is not active", record.claim_type)))?;
        if prize.winners >= prize.max_winners {
            return Err(RoomError::Capacity("cap already reached".into()));
        }
        prize.winners += 1;
        self.winners.push(record);
        Ok(())
    }

    /// The table as sent to clients, in condition order.
    pub fn statuses(&self) -> Vec<PrizeStatus> {
        self.prizes
            .iter()
            .map(|(&claim_type, p)| PrizeStatus {
                claim_type,
                active: p.active,
                max_winners: p.max_winners,
                winners: p.winners,
            })
            .collect()
    }

    /// Every win so far, in verification order.
    pub fn winners(&self) -> &[WinnerRecord] {
        &self.winners
    }

    /// Winners recorded for `condition`.
    pub fn winner_count(&self, condition: WinCondition) -> u32 {
        self.prizes.get(&condition).map_or(0, |p| p.winners)
    }
}
