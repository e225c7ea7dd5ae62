//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use call_break::{SessionConfig, constants::DEFAULT_PORT};
use std::{
    net::{Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Settings for the hosted session
    pub session: SessionConfig,
}

/// Values given on the command line, which win over the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub players: Option<usize>,
    pub rounds: Option<u32>,
    pub seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed, or the
    /// resulting session settings are invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable source.
    pub fn from_vars<F>(var: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SessionConfig::default();

        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_var(&var, "CALLBREAK_BIND")?
                .unwrap_or(SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))),
        };

        let num_players = match overrides.players {
            Some(players) => players,
            None => parse_var(&var, "CALLBREAK_PLAYERS")?.unwrap_or(defaults.num_players),
        };
        let num_rounds = match overrides.rounds {
            Some(rounds) => rounds,
            None => parse_var(&var, "CALLBREAK_ROUNDS")?.unwrap_or(defaults.num_rounds),
        };

        // Zero disables the bid and play timeouts.
        let optional_timeout = |key: &str, default: Option<Duration>| {
            parse_var::<u64, _>(&var, key).map(|secs| match secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => default,
            })
        };

        let session = SessionConfig {
            num_players,
            num_rounds,
            trump_timeout: parse_var(&var, "CALLBREAK_TRUMP_TIMEOUT_SECS")?
                .map_or(defaults.trump_timeout, Duration::from_secs),
            bid_timeout: optional_timeout("CALLBREAK_BID_TIMEOUT_SECS", defaults.bid_timeout)?,
            play_timeout: optional_timeout("CALLBREAK_PLAY_TIMEOUT_SECS", defaults.play_timeout)?,
            next_round_delay: parse_var(&var, "CALLBREAK_ROUND_DELAY_SECS")?
                .map_or(defaults.next_round_delay, Duration::from_secs),
            seed: overrides.seed,
            ..defaults
        };

        Ok(ServerConfig { bind, session })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid session settings: {0}")]
    Session(#[from] call_break::session::ConfigError),
}

/// Reads and parses a variable. Unset is `None`; set but unparsable is an error.
fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|error: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{value:?}: {error}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(vars(&[]), Overrides::default()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:5555".parse().unwrap());
        assert_eq!(config.session.num_players, 4);
        assert_eq!(config.session.num_rounds, 5);
        assert_eq!(config.session.trump_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_values() {
        let config = ServerConfig::from_vars(
            vars(&[
                ("CALLBREAK_BIND", "127.0.0.1:7000"),
                ("CALLBREAK_PLAYERS", "3"),
                ("CALLBREAK_ROUNDS", "2"),
                ("CALLBREAK_TRUMP_TIMEOUT_SECS", "10"),
                ("CALLBREAK_BID_TIMEOUT_SECS", "0"),
                ("CALLBREAK_PLAY_TIMEOUT_SECS", "15"),
                ("CALLBREAK_ROUND_DELAY_SECS", "1"),
            ]),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(config.session.num_players, 3);
        assert_eq!(config.session.num_rounds, 2);
        assert_eq!(config.session.trump_timeout, Duration::from_secs(10));
        assert_eq!(config.session.bid_timeout, None);
        assert_eq!(config.session.play_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session.next_round_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides_win() {
        let config = ServerConfig::from_vars(
            vars(&[("CALLBREAK_PLAYERS", "3"), ("CALLBREAK_BIND", "not an address")]),
            Overrides {
                bind: Some("127.0.0.1:9000".parse().unwrap()),
                players: Some(2),
                rounds: Some(1),
                seed: Some(8),
            },
        )
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.session.num_players, 2);
        assert_eq!(config.session.num_rounds, 1);
        assert_eq!(config.session.seed, Some(8));
    }

    #[test]
    fn test_unparsable_value_is_an_error() {
        let err = ServerConfig::from_vars(
            vars(&[("CALLBREAK_ROUNDS", "many")]),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "CALLBREAK_ROUNDS"));
        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn test_validation_rejects_bad_player_count() {
        let config = ServerConfig::from_vars(
            vars(&[("CALLBREAK_PLAYERS", "6")]),
            Overrides::default(),
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Session(_)));
    }
}
