//! Call Break host.
//!
//! Hosts a single session: waits for the table to fill, plays the game out
//! and exits once the session is over.

mod config;
mod logging;

use std::net::SocketAddr;

use anyhow::{Context, Error};
use call_break::{SessionActor, server};
use ctrlc::set_handler;
use pico_args::Arguments;
use tokio::net::TcpListener;
use tracing::info;

use config::{Overrides, ServerConfig};

const HELP: &str = "\
Host a game of Call Break

USAGE:
  cb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env CALLBREAK_BIND or 0.0.0.0:5555]
  --players    N           Seats at the table, 2 to 4  [default: env CALLBREAK_PLAYERS or 4]
  --rounds     N           Rounds to play              [default: env CALLBREAK_ROUNDS or 5]
  --seed       N           Fixed shuffle seed

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  CALLBREAK_TRUMP_TIMEOUT_SECS   Seconds to choose trump (default 30)
  CALLBREAK_BID_TIMEOUT_SECS     Seconds to bid, 0 to wait forever (default 30)
  CALLBREAK_PLAY_TIMEOUT_SECS    Seconds to play, 0 to wait forever (default 30)
  CALLBREAK_ROUND_DELAY_SECS     Pause between rounds (default 3)
  RUST_LOG                       Log filter (default info)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        players: pargs.opt_value_from_str("--players")?,
        rounds: pargs.opt_value_from_str("--rounds")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let (actor, handle) = SessionActor::new(config.session.clone())?;
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind))?;

    info!(
        bind = %config.bind,
        players = config.session.num_players,
        rounds = config.session.num_rounds,
        "waiting for players"
    );

    let session = tokio::spawn(actor.run());
    server::serve(listener, handle).await;
    session.await.context("session task failed")?;

    info!("session over, shutting down");
    Ok(())
}
