//! # Call Break
//!
//! A networked Call Break card game: an authoritative host that owns the
//! game state, and clients that mirror it.
//!
//! ## Architecture
//!
//! A game runs a fixed number of rounds. Each round moves through these
//! phases:
//!
//! - **Lobby**: Waiting for seats to fill
//! - **Dealing**: Shuffling and dealing 13 cards to each player
//! - **TrumpSelection**: The round's chooser names the trump suit
//! - **Bidding**: Every player declares how many tricks they'll take
//! - **Playing**: Thirteen tricks, following suit when possible
//! - **RoundEnd**: Scoring the round against the bids
//! - **GameEnd**: Final totals and the winner
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, trick rules and the phase state machine
//! - [`session`]: The actor that owns a session and runs its timers
//! - [`net`]: Wire protocol, framing, TCP host and client
//! - [`synchronizer`]: Client-side mirror of the host's state
//!
//! ## Example
//!
//! ```
//! use call_break::{GameState, Phase};
//!
//! // A fresh game waits in the lobby
//! let game = GameState::default();
//! assert_eq!(game.phase(), Phase::Lobby);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameError, GameRules, GameState, Phase,
    constants::{self, CARDS_PER_PLAYER, MAX_PLAYERS, MIN_PLAYERS},
    entities::{self, Card, PlayerId, PlayerName, Rank, Score, Suit},
    functional,
};

/// Networking components for client-host communication.
pub mod net;
pub use net::{client::Client, messages, server, utils};

/// Session orchestration on the host.
pub mod session;
pub use session::{SessionActor, SessionConfig, SessionHandle};

/// Client-side state mirror.
pub mod synchronizer;
pub use synchronizer::{ClientError, ClientSync};
