//! A command-line Call Break client.
//!
//! The client connects to a host over TCP, mirrors the game through a
//! `ClientSync`, and reads commands from stdin.

use anyhow::{Context, Result};
use call_break::{
    Client, ClientSync,
    constants::DEFAULT_PORT,
    entities::{PlayerId, PlayerName},
    messages::UserCommand,
};
use log::debug;
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

use cb_client::{
    commands::{self, HELP as COMMANDS_HELP, Input},
    view,
};

const HELP: &str = "\
Join a Call Break game

USAGE:
  cb_client [OPTIONS]

OPTIONS:
  --connect    IP:PORT   Host address  [default: 127.0.0.1:5555]
  --name       NAME      Display name  [default: $USER]
  --id         UUID      Rejoin with the id printed when you first joined

FLAGS:
  -h, --help             Print help information
";

struct Args {
    connect: String,
    name: PlayerName,
    player_id: PlayerId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        connect: pargs
            .opt_value_from_str("--connect")?
            .unwrap_or_else(|| format!("127.0.0.1:{DEFAULT_PORT}")),
        name: PlayerName::new(
            &pargs
                .opt_value_from_str::<_, String>("--name")?
                .unwrap_or_else(whoami::username),
        ),
        player_id: pargs.opt_value_from_str("--id")?.unwrap_or_default(),
    };

    env_logger::builder().format_target(false).init();

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.connect, args.player_id, args.name.clone())
        .await
        .with_context(|| format!("couldn't join {}", args.connect))?;
    println!(
        "connected to {} as {} (id {})",
        args.connect, args.name, args.player_id
    );
    println!("type 'help' for commands");

    let mut sync = ClientSync::new(args.player_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            message = client.recv() => {
                let Some(message) = message else {
                    println!("disconnected from host");
                    break;
                };
                debug!("received {message}");
                sync.apply(message.clone());
                if let Some(line) = view::describe(sync.projection(), &message) {
                    println!("{line}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = client.leave().await;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let input = match commands::parse_input(&line) {
                    Ok(input) => input,
                    Err(error) => {
                        println!("{error}");
                        continue;
                    }
                };
                match input {
                    Input::Help => print!("{COMMANDS_HELP}"),
                    Input::State => {
                        println!("{}", serde_json::to_string_pretty(sync.projection())?);
                    }
                    _ => {}
                }
                match commands::to_command(&sync, input) {
                    Ok(Some(UserCommand::Leave)) => {
                        client.leave().await?;
                        println!("left the game. rejoin with --id {}", args.player_id);
                        break;
                    }
                    Ok(Some(command)) => client.send(&command).await?,
                    Ok(None) => {}
                    Err(error) => println!("{error}"),
                }
            }
        }
    }

    Ok(())
}
