use call_break::{
    ClientError, ClientSync,
    entities::{Card, Suit},
    messages::UserCommand,
};
use std::fmt;

/// Something typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Trump(Suit),
    Bid(u8),
    Play(Card),
    /// Ask the host for a fresh snapshot.
    Sync,
    /// Dump the local projection.
    State,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Bid amount isn't a number.
    InvalidBid(String),
    /// Card isn't in short notation.
    InvalidCard(String),
    /// Suit name isn't recognized.
    InvalidSuit(String),
    /// Command is missing its argument.
    MissingArgument(&'static str),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBid(value) => write!(
                f,
                "Invalid bid '{value}'. Must be a number (e.g., 'bid 3')"
            ),
            Self::InvalidCard(value) => write!(
                f,
                "Invalid card '{value}'. Use rank then suit (e.g., 'play 10h', 'play qs')"
            ),
            Self::InvalidSuit(value) => write!(
                f,
                "Invalid suit '{value}'. Use spades, hearts, diamonds or clubs"
            ),
            Self::MissingArgument(usage) => write!(f, "Missing argument. Usage: '{usage}'"),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  trump SUIT     choose trump (spades, hearts, diamonds, clubs)
  bid N          bid N tricks
  play CARD      play a card, rank then suit (10h, qs, 2c)
  sync           ask the host for a fresh snapshot
  state          print the local game state as JSON
  help           show this text
  quit           leave the game
";

/// Parse a line of input.
///
/// # Examples
///
/// ```
/// use cb_client::commands::{Input, parse_input};
/// use call_break::entities::Suit;
///
/// assert_eq!(parse_input("bid 3"), Ok(Input::Bid(3)));
/// assert_eq!(parse_input("trump hearts"), Ok(Input::Trump(Suit::Hearts)));
/// assert!(parse_input("play 11x").is_err());
/// ```
pub fn parse_input(input: &str) -> Result<Input, ParseError> {
    let mut words = input.split_whitespace();
    let Some(command) = words.next() else {
        return Err(ParseError::UnrecognizedCommand(String::new()));
    };
    let argument = words.next();

    match command.to_lowercase().as_str() {
        "trump" | "t" => {
            let value = argument.ok_or(ParseError::MissingArgument("trump SUIT"))?;
            value
                .parse()
                .map(Input::Trump)
                .map_err(|_| ParseError::InvalidSuit(value.to_string()))
        }
        "bid" | "b" => {
            let value = argument.ok_or(ParseError::MissingArgument("bid N"))?;
            value
                .parse()
                .map(Input::Bid)
                .map_err(|_| ParseError::InvalidBid(value.to_string()))
        }
        "play" | "p" => {
            let value = argument.ok_or(ParseError::MissingArgument("play CARD"))?;
            value
                .parse()
                .map(Input::Play)
                .map_err(|_| ParseError::InvalidCard(value.to_string()))
        }
        "sync" => Ok(Input::Sync),
        "state" => Ok(Input::State),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        other => Err(ParseError::UnrecognizedCommand(other.to_string())),
    }
}

/// Turns game input into a command for the host, checked against the local
/// view. Returns `Ok(None)` for input handled locally.
pub fn to_command(sync: &ClientSync, input: Input) -> Result<Option<UserCommand>, ClientError> {
    let command = match input {
        Input::Trump(suit) => sync.choose_trump(suit)?,
        Input::Bid(amount) => sync.submit_bid(amount)?,
        Input::Play(card) => sync.play_card(card)?,
        Input::Sync => sync.request_sync(),
        Input::Quit => UserCommand::Leave,
        Input::State | Input::Help => return Ok(None),
    };
    Ok(Some(command))
}
