//! Host-side session orchestration.
//!
//! A [`SessionActor`] runs in its own Tokio task, owns the one
//! [`GameState`](crate::game::GameState) of the session and the roster of
//! seats, and turns validated player intents into protocol messages.
//!
//! ## Example
//!
//! ```no_run
//! use call_break::session::{SessionActor, SessionConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let (actor, handle) = SessionActor::new(SessionConfig::default())?;
//! tokio::spawn(actor.run());
//! // Hand `handle` to whatever accepts player connections.
//! # drop(handle);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod messages;
pub mod roster;

pub use actor::{SessionActor, SessionHandle};
pub use config::{ConfigError, SessionConfig};
pub use messages::{SessionError, SessionMessage};
pub use roster::{ConnectionId, PlayerLink};
