//! Call Break game engine: cards, trick rules and the phase state machine.
//!
//! Nothing in here does I/O. The session actor owns a [`GameState`] and is
//! the only thing that mutates it.

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;

pub use state_machine::{
    CardRejection, FinalStandings, GameError, GameRules, GameState, Phase, PlayOutcome, Round,
};
