//! Server configuration.

use std::time::Duration;

use cobble_player::Gamemode;
use serde::{Deserialize, Serialize};

/// Settings for a [`Server`](crate::Server).
///
/// Every field has a default, so a config file only needs the keys it
/// changes. Durations are written as whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind: String,

    /// How long a client may take from connecting to finishing login.
    #[serde(with = "secs")]
    pub login_timeout: Duration,

    /// How often a keep-alive is sent to each player.
    #[serde(with = "secs")]
    pub keep_alive_interval: Duration,

    /// How long a player may leave a keep-alive unanswered before being
    /// disconnected.
    #[serde(with = "secs")]
    pub keep_alive_timeout: Duration,

    /// Capacity of each global chat mailbox.
    pub mailbox_capacity: usize,

    /// Game mode given to players on login.
    pub default_gamemode: Gamemode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:25565".to_string(),
            login_timeout: Duration::from_secs(10),
            keep_alive_interval: Duration::from_secs(15),
            keep_alive_timeout: Duration::from_secs(30),
            mailbox_capacity: cobble_chat::DEFAULT_MAILBOX_CAPACITY,
            default_gamemode: Gamemode::Survival,
        }
    }
}

/// (De)serializes a `Duration` as a number of seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"bind":"127.0.0.1:4000","keep_alive_interval":2.5}"#).unwrap();
        assert_eq!(config.bind, "127.0.0.1:4000");
        assert_eq!(config.keep_alive_interval, Duration::from_millis(2500));
        assert_eq!(config.keep_alive_timeout, Duration::from_secs(30));
        assert_eq!(config.default_gamemode, Gamemode::Survival);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result: Result<ServerConfig, _> = serde_json::from_str(r#"{"login_timeout":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = ServerConfig {
            default_gamemode: Gamemode::Creative,
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.default_gamemode, Gamemode::Creative);
        assert_eq!(back.login_timeout, config.login_timeout);
    }
}
