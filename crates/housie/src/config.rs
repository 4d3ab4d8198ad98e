//! Server configuration.

use std::str::FromStr;
use std::time::Duration;

use housie_room::RoomConfig;

use crate::HousieError;

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Grids pre-built into the shared ticket pool at start-up.
    pub pool_size: usize,

    /// A channel that sends nothing for this long is dropped. Events sent
    /// to it don't count; quiet clients keep alive with `ping`.
    pub idle_timeout: Duration,

    /// Defaults for every room.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            pool_size: 600,
            idle_timeout: Duration::from_secs(120),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `HOUSIE_*` environment variables.
    ///
    /// | Variable                    | Field                          |
    /// |-----------------------------|--------------------------------|
    /// | `HOUSIE_BIND`               | `bind_addr`                    |
    /// | `HOUSIE_POOL_SIZE`          | `pool_size`                    |
    /// | `HOUSIE_MAX_TICKETS`        | `room.max_tickets_per_player`  |
    /// | `HOUSIE_DRAW_INTERVAL_SECS` | `room.draw_interval`           |
    /// | `HOUSIE_IDLE_TIMEOUT_SECS`  | `idle_timeout`                 |
    ///
    /// # Errors
    /// [`HousieError::Config`] if a variable is set but doesn't parse.
    pub fn from_env() -> Result<Self, HousieError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HousieError> {
        let mut config = Self::default();
        if let Some(addr) = lookup("HOUSIE_BIND") {
            config.bind_addr = addr;
        }
        if let Some(size) = parse(&lookup, "HOUSIE_POOL_SIZE")? {
            config.pool_size = size;
        }
        if let Some(max) = parse(&lookup, "HOUSIE_MAX_TICKETS")? {
            config.room.max_tickets_per_player = max;
        }
        if let Some(secs) = parse(&lookup, "HOUSIE_DRAW_INTERVAL_SECS")? {
            config.room.draw_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse(&lookup, "HOUSIE_IDLE_TIMEOUT_SECS")? {
            config.idle_timeout = Duration::from_secs(secs);
        }
        config.room = config.room.validated();
        Ok(config)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, HousieError>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| HousieError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOUSIE_BIND", "0.0.0.0:9000"),
            ("HOUSIE_POOL_SIZE", "120"),
            ("HOUSIE_MAX_TICKETS", " 3 "),
            ("HOUSIE_DRAW_INTERVAL_SECS", "8"),
            ("HOUSIE_IDLE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.pool_size, 120);
        assert_eq!(config.room.max_tickets_per_player, 3);
        assert_eq!(config.room.draw_interval, Duration::from_secs(8));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_clamps_room_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOUSIE_DRAW_INTERVAL_SECS", "900"),
            ("HOUSIE_MAX_TICKETS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.room.draw_interval, Duration::from_secs(120));
        assert_eq!(config.room.max_tickets_per_player, 1);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ServerConfig::from_lookup(lookup(&[("HOUSIE_POOL_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, HousieError::Config(_)));
        assert!(err.to_string().contains("HOUSIE_POOL_SIZE"));
    }
}
