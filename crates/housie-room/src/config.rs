//! Per-room defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Defaults a room falls back to when `start-game` leaves a setting out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Tickets one participant may hold in one room.
    pub max_tickets_per_player: u32,

    /// Time between timed draws.
    pub draw_interval: Duration,

    /// Bound on the room actor's command queue.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_tickets_per_player: 6,
            draw_interval: Duration::from_secs(5),
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// - `max_tickets_per_player` at least 1.
    /// - `draw_interval` clamped to the timer's accepted range.
    /// - `channel_size` at least 1.
    pub fn validated(mut self) -> Self {
        if self.max_tickets_per_player == 0 {
            tracing::warn!("max_tickets_per_player is 0, using 1");
            self.max_tickets_per_player = 1;
        }
        self.draw_interval = housie_timer::clamp_interval(self.draw_interval);
        self.channel_size = self.channel_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_tickets_per_player, 6);
        assert_eq!(config.draw_interval, Duration::from_secs(5));
        assert_eq!(config.channel_size, 64);
    }

    #[test]
    fn test_validated_fixes_out_of_range_values() {
        let config = RoomConfig {
            max_tickets_per_player: 0,
            draw_interval: Duration::from_millis(10),
            channel_size: 0,
        }
        .validated();
        assert_eq!(config.max_tickets_per_player, 1);
        assert_eq!(config.draw_interval, housie_timer::MIN_INTERVAL);
        assert_eq!(config.channel_size, 1);
    }

    #[test]
    fn test_validated_keeps_sane_values() {
        assert_eq!(RoomConfig::default().validated(), RoomConfig::default());
    }
}
