//! Session configuration.

use std::time::Duration;
use thiserror::Error;

use crate::game::{
    GameRules,
    constants::{DEFAULT_MAX_BID, DEFAULT_MIN_BID, DEFAULT_NUM_ROUNDS, MAX_PLAYERS, MIN_PLAYERS},
};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("player count must be between 2 and 4, got {0}")]
    PlayerCount(usize),
    #[error("a game needs at least one round")]
    NoRounds,
    #[error("bid range {min}..={max} is invalid")]
    BidRange { min: u8, max: u8 },
    #[error("trump timeout must be positive")]
    ZeroTrumpTimeout,
}

/// Session configuration
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    /// Seats at the table (default: 4)
    pub num_players: usize,

    pub num_rounds: u32,

    pub min_bid: u8,
    pub max_bid: u8,

    /// How long the chooser has to pick trump before one is picked for them
    pub trump_timeout: Duration,

    /// `None` waits forever for a connected bidder
    pub bid_timeout: Option<Duration>,

    /// `None` waits forever for a connected player
    pub play_timeout: Option<Duration>,

    /// Pause between a round's end and the next deal
    pub next_round_delay: Duration,

    /// Start as soon as every seat is taken
    pub auto_start: bool,

    /// Fixed shuffle seed, for reproducible games
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_players: MAX_PLAYERS,
            num_rounds: DEFAULT_NUM_ROUNDS,
            min_bid: DEFAULT_MIN_BID,
            max_bid: DEFAULT_MAX_BID,
            trump_timeout: Duration::from_secs(30),
            bid_timeout: Some(Duration::from_secs(30)),
            play_timeout: Some(Duration::from_secs(30)),
            next_round_delay: Duration::from_secs(3),
            auto_start: true,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.num_players) {
            return Err(ConfigError::PlayerCount(self.num_players));
        }
        if self.num_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.min_bid == 0 || self.min_bid > self.max_bid || self.max_bid > DEFAULT_MAX_BID {
            return Err(ConfigError::BidRange {
                min: self.min_bid,
                max: self.max_bid,
            });
        }
        if self.trump_timeout.is_zero() {
            return Err(ConfigError::ZeroTrumpTimeout);
        }
        Ok(())
    }

    pub fn rules(&self) -> GameRules {
        GameRules {
            min_bid: self.min_bid,
            max_bid: self.max_bid,
        }
    }

    /// Whole seconds advertised to clients, rounded up.
    pub fn timeout_secs(timeout: Duration) -> u64 {
        let secs = timeout.as_secs();
        if timeout.subsec_nanos() > 0 { secs + 1 } else { secs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.num_players, 4);
        assert_eq!(config.num_rounds, 5);
        assert_eq!(config.trump_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_player_count_bounds() {
        let mut config = SessionConfig {
            num_players: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PlayerCount(1)));
        config.num_players = 5;
        assert_eq!(config.validate(), Err(ConfigError::PlayerCount(5)));
        config.num_players = 2;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_bid_range() {
        let config = SessionConfig {
            min_bid: 5,
            max_bid: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BidRange { min: 5, max: 4 })
        );
        let config = SessionConfig {
            max_bid: 14,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rounds_and_timeout() {
        let config = SessionConfig {
            num_rounds: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoRounds));
        let config = SessionConfig {
            trump_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTrumpTimeout));
    }

    #[test]
    fn test_timeout_secs_rounds_up() {
        assert_eq!(SessionConfig::timeout_secs(Duration::from_secs(30)), 30);
        assert_eq!(SessionConfig::timeout_secs(Duration::from_millis(1500)), 2);
    }
}
