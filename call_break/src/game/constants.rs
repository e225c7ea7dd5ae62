//! Table-wide constants for a Call Break game.

/// Every player is dealt this many cards, and a round always has this many tricks.
pub const CARDS_PER_PLAYER: usize = 13;
pub const TRICKS_PER_ROUND: usize = CARDS_PER_PLAYER;

pub const MIN_PLAYERS: usize = 2;
/// One 52-card deck covers at most four hands of 13.
pub const MAX_PLAYERS: usize = 4;

pub const DEFAULT_NUM_ROUNDS: u32 = 5;
pub const DEFAULT_MIN_BID: u8 = 1;
pub const DEFAULT_MAX_BID: u8 = 13;

pub const MAX_NAME_LENGTH: usize = 16;

pub const DEFAULT_PORT: u16 = 5555;
