//! Session actor: the single owner of a game's state.
//!
//! Connections talk to the actor through a [`SessionHandle`]. Every intent
//! funnels through one inbox, so only one mutation is ever in flight. Turn
//! timers are a single armed deadline polled next to the inbox.

use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

use super::{
    config::{ConfigError, SessionConfig},
    messages::{SessionError, SessionMessage},
    roster::{ConnectionId, PlayerLink, Roster},
};
use crate::{
    game::{
        GameError, GameState, Phase,
        entities::{Card, PlayerId, PlayerName, Suit},
        functional,
    },
    net::messages::{ErrorCode, Payload, ServerMessage, Snapshot, UserCommand},
};

/// Session actor handle for sending messages
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub async fn send(&self, message: SessionMessage) -> Result<(), SessionError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Seats a player or reattaches their seat. Resolves to the id of the
    /// new attachment, which later commands and disconnects must carry.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: PlayerName,
        link: Box<dyn PlayerLink>,
    ) -> Result<ConnectionId, SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Join {
            player_id,
            name,
            link,
            response,
        })
        .await?;
        rx.await
            .map_err(|_| SessionError::Closed)?
            .map_err(SessionError::Rejected)
    }

    pub async fn command(
        &self,
        player_id: PlayerId,
        connection: ConnectionId,
        command: UserCommand,
    ) -> Result<(), SessionError> {
        self.send(SessionMessage::Command {
            player_id,
            connection,
            command,
        })
        .await
    }

    pub async fn disconnect(
        &self,
        player_id: PlayerId,
        connection: ConnectionId,
    ) -> Result<(), SessionError> {
        self.send(SessionMessage::Disconnect {
            player_id,
            connection,
        })
        .await
    }

    pub async fn start_game(&self) -> Result<(), SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::StartGame { response }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn close(&self) -> Result<(), SessionError> {
        self.send(SessionMessage::Close).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the actor has stopped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TimerKind {
    Trump,
    Bid,
    Play,
    NextRound,
}

#[derive(Debug)]
struct ArmedTimer {
    kind: TimerKind,
    player: Option<PlayerId>,
    deadline: Instant,
}

pub struct SessionActor {
    config: SessionConfig,
    state: GameState,
    roster: Roster,
    inbox: mpsc::Receiver<SessionMessage>,
    timer: Option<ArmedTimer>,
    is_closed: bool,
}

impl SessionActor {
    pub fn new(config: SessionConfig) -> Result<(Self, SessionHandle), ConfigError> {
        config.validate()?;
        let (sender, inbox) = mpsc::channel(100);
        let actor = Self {
            state: GameState::new(config.rules(), config.seed),
            roster: Roster::new(config.num_players),
            config,
            inbox,
            timer: None,
            is_closed: false,
        };
        Ok((actor, SessionHandle { sender }))
    }

    /// Run the session event loop until the game ends or the session is
    /// closed.
    pub async fn run(mut self) {
        info!(
            "session starting: {} players, {} rounds",
            self.config.num_players, self.config.num_rounds
        );

        loop {
            let deadline = self.timer.as_ref().map(|timer| timer.deadline);
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timer();
                }
            }

            if self.is_closed {
                break;
            }
        }

        info!("session closed in {} (round {})", self.state.phase(), self.state.current_round());
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join {
                player_id,
                name,
                link,
                response,
            } => {
                let result = self.handle_join(player_id, name, link);
                let joined = result.is_ok();
                let _ = response.send(result);
                if joined {
                    self.after_join(player_id);
                }
            }

            SessionMessage::Command {
                player_id,
                connection,
                command,
            } => self.handle_command(player_id, connection, command),

            SessionMessage::Disconnect {
                player_id,
                connection,
            } => self.handle_disconnect(player_id, connection),

            SessionMessage::StartGame { response } => {
                let result = self.start_game();
                if let Err(error) = &result {
                    if error.is_fatal() {
                        self.abort(error);
                    }
                }
                let _ = response.send(result.map_err(SessionError::from));
            }

            SessionMessage::Close => {
                info!("session close requested");
                self.broadcast(Payload::Error {
                    code: ErrorCode::SessionClosed,
                    reason: "host closed the session".to_string(),
                });
                self.is_closed = true;
            }
        }
    }

    fn stamp(&self, payload: Payload) -> ServerMessage {
        ServerMessage {
            round_number: self.state.current_round(),
            phase: self.state.phase(),
            payload,
        }
    }

    fn broadcast(&self, payload: Payload) {
        let message = self.stamp(payload);
        debug!("broadcast {message}");
        self.roster.broadcast(&message);
    }

    fn unicast(&self, player_id: &PlayerId, payload: Payload) {
        let message = self.stamp(payload);
        debug!("{player_id} <- {message}");
        self.roster.send_to(player_id, message);
    }

    fn reject(&self, player_id: &PlayerId, code: ErrorCode, reason: String) {
        warn!("{player_id}: rejected ({code}): {reason}");
        self.unicast(player_id, Payload::Error { code, reason });
    }

    fn player_name(&self, player_id: &PlayerId) -> PlayerName {
        self.roster
            .name(player_id)
            .cloned()
            .unwrap_or_else(|| PlayerName::new(&player_id.to_string()))
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: PlayerName,
        link: Box<dyn PlayerLink>,
    ) -> Result<ConnectionId, ErrorCode> {
        let admission = match self.state.phase() {
            Phase::Lobby => self.roster.check_add(&player_id),
            Phase::GameEnd => Err(ErrorCode::SessionClosed),
            _ => self.roster.check_reattach(&player_id),
        };
        if let Err(code) = admission {
            warn!("{name} ({player_id}) turned away: {code}");
            link.send(self.stamp(Payload::Error {
                code,
                reason: code.to_string(),
            }));
            return Err(code);
        }

        match self.state.phase() {
            Phase::Lobby => {
                let connection = self.roster.add(player_id, name.clone(), link)?;
                info!("{name} ({player_id}) joined the lobby");
                Ok(connection)
            }
            Phase::GameEnd => Err(ErrorCode::SessionClosed),
            _ => {
                let connection = self.roster.reattach(&player_id, link)?;
                info!("{} ({player_id}) reconnected", self.player_name(&player_id));
                Ok(connection)
            }
        }
    }

    fn after_join(&mut self, player_id: PlayerId) {
        if self.state.phase() == Phase::Lobby {
            self.broadcast_lobby();
            if self.config.auto_start && self.roster.is_full() {
                if let Err(error) = self.start_game() {
                    warn!("couldn't start a full lobby: {error}");
                    if error.is_fatal() {
                        self.abort(&error);
                    }
                }
            }
            return;
        }

        self.broadcast(Payload::PlayerReconnect { player_id });
        self.send_snapshot(&player_id);
        self.resend_prompt(&player_id);
    }

    fn broadcast_lobby(&self) {
        self.broadcast(Payload::LobbyUpdate {
            players: self.roster.player_info(),
            max_players: self.roster.capacity(),
        });
    }

    fn handle_command(&mut self, player_id: PlayerId, connection: ConnectionId, command: UserCommand) {
        if !self.roster.is_current(&player_id, connection) {
            debug!("{player_id}: dropping command from stale connection {connection}");
            return;
        }
        debug!("{player_id} {command}");

        let result = match command {
            UserCommand::Join { .. } => {
                self.reject(&player_id, ErrorCode::Protocol, "already joined".to_string());
                Ok(())
            }
            UserCommand::ChooseTrump(suit) => self.apply_trump(player_id, suit, false),
            UserCommand::Bid(amount) => self.apply_bid(player_id, amount, false),
            UserCommand::PlayCard(card) => self.apply_card(player_id, card, false),
            UserCommand::RequestSync => {
                self.send_snapshot(&player_id);
                Ok(())
            }
            UserCommand::Leave => {
                self.handle_disconnect(player_id, connection);
                Ok(())
            }
        };

        if let Err(error) = result {
            if error.is_fatal() {
                self.abort(&error);
            } else {
                self.reject(&player_id, ErrorCode::from(&error), error.to_string());
            }
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId, connection: ConnectionId) {
        match self.state.phase() {
            Phase::Lobby => {
                if self.roster.remove(&player_id, connection) {
                    info!("{player_id} left the lobby");
                    self.broadcast_lobby();
                }
            }
            Phase::GameEnd => {
                self.roster.detach(&player_id, connection);
            }
            _ => {
                if !self.roster.detach(&player_id, connection) {
                    return;
                }
                warn!("{} ({player_id}) disconnected", self.player_name(&player_id));
                self.broadcast(Payload::PlayerDisconnect { player_id });

                if self.roster.connected_count() == 0 {
                    info!("every player is gone, closing session");
                    self.is_closed = true;
                    return;
                }

                // A disconnected player's turn is played for them right away.
                if let Some(timer) = self.timer.as_mut() {
                    if timer.player == Some(player_id) {
                        timer.deadline = Instant::now();
                    }
                } else if self.state.current_player() == Some(player_id) {
                    self.arm_turn_timer();
                }
            }
        }
    }

    fn start_game(&mut self) -> Result<(), GameError> {
        self.state
            .start_game(self.roster.order(), self.config.num_rounds)?;
        info!("game started with {} players", self.roster.len());
        self.broadcast(Payload::GameStart {
            player_order: self.roster.player_info(),
            num_rounds: self.config.num_rounds,
        });
        self.begin_round()
    }

    fn begin_round(&mut self) -> Result<(), GameError> {
        let round = self.state.deal_round()?;
        let round_number = round.round_number;
        let chooser = round.trump_chooser;
        info!("round {round_number} of {} dealt", self.state.num_rounds());

        self.broadcast(Payload::RoundStart {
            round_number,
            total_rounds: self.state.num_rounds(),
        });
        for player_id in self.state.player_order() {
            let cards = self.state.hand(player_id).unwrap_or_default().to_vec();
            self.unicast(
                player_id,
                Payload::CardsDealt {
                    cards,
                    round_number,
                },
            );
        }
        self.broadcast(Payload::TrumpChooserSelected {
            player_id: chooser,
            player_name: self.player_name(&chooser),
        });
        self.prompt_current();
        Ok(())
    }

    /// The prompt for whoever the game is waiting on, if anyone.
    fn pending_prompt(&self) -> Option<(PlayerId, Payload)> {
        let player_id = self.state.current_player()?;
        let payload = match self.state.phase() {
            Phase::TrumpSelection => Payload::TrumpSelectionRequest {
                available_suits: Suit::ALL.to_vec(),
                timeout_seconds: SessionConfig::timeout_secs(self.config.trump_timeout),
            },
            Phase::Bidding => {
                let rules = self.state.rules();
                Payload::BidTurn {
                    min_bid: rules.min_bid,
                    max_bid: rules.max_bid,
                    timeout_seconds: self.config.bid_timeout.map(SessionConfig::timeout_secs),
                }
            }
            Phase::Playing => Payload::PlayTurn {
                valid_cards: self.state.legal_cards(&player_id),
                timeout_seconds: self.config.play_timeout.map(SessionConfig::timeout_secs),
            },
            _ => return None,
        };
        Some((player_id, payload))
    }

    /// Prompts the player on turn, tells everyone whose turn it is and arms
    /// the turn timer.
    fn prompt_current(&mut self) {
        let Some((player_id, prompt)) = self.pending_prompt() else {
            return;
        };
        self.unicast(&player_id, prompt);
        let status = self.state.round().map(|round| match self.state.phase() {
            Phase::Bidding => Some(Payload::BiddingStatus {
                current_bidder: player_id,
                bids_so_far: round.bids.clone(),
                total_players: self.state.player_order().len(),
            }),
            Phase::Playing => Some(Payload::PlayingStatus {
                current_player: player_id,
                trick_size: round.current_trick.len(),
            }),
            _ => None,
        });
        if let Some(Some(status)) = status {
            self.broadcast(status);
        }
        self.arm_turn_timer();
    }

    fn resend_prompt(&self, player_id: &PlayerId) {
        if let Some((current, prompt)) = self.pending_prompt() {
            if current == *player_id {
                self.unicast(player_id, prompt);
            }
        }
    }

    fn arm_turn_timer(&mut self) {
        let Some(player_id) = self.state.current_player() else {
            self.timer = None;
            return;
        };
        let (kind, timeout) = match self.state.phase() {
            Phase::TrumpSelection => (TimerKind::Trump, Some(self.config.trump_timeout)),
            Phase::Bidding => (TimerKind::Bid, self.config.bid_timeout),
            Phase::Playing => (TimerKind::Play, self.config.play_timeout),
            _ => {
                self.timer = None;
                return;
            }
        };
        let timeout = if self.roster.is_connected(&player_id) {
            timeout
        } else {
            Some(Duration::ZERO)
        };
        self.timer = timeout.map(|timeout| ArmedTimer {
            kind,
            player: Some(player_id),
            deadline: Instant::now() + timeout,
        });
        if let Some(timer) = &self.timer {
            debug!("armed {:?} timer for {player_id}", timer.kind);
        }
    }

    fn apply_trump(&mut self, chooser: PlayerId, suit: Suit, auto_selected: bool) -> Result<(), GameError> {
        self.state.select_trump(&chooser, suit, auto_selected)?;
        self.timer = None;
        self.broadcast(Payload::TrumpSelected {
            trump_suit: suit,
            chooser_name: self.player_name(&chooser),
            auto_selected,
            round_number: self.state.current_round(),
        });
        self.prompt_current();
        Ok(())
    }

    fn apply_bid(&mut self, player_id: PlayerId, amount: u8, auto_selected: bool) -> Result<(), GameError> {
        let complete = self.state.record_bid(&player_id, amount)?;
        self.timer = None;
        self.broadcast(Payload::BidMade {
            player_id,
            amount,
            auto_selected,
        });
        if complete {
            let all_bids = self
                .state
                .round()
                .map(|round| round.bids.clone())
                .unwrap_or_default();
            self.broadcast(Payload::BiddingComplete { all_bids });
        }
        self.prompt_current();
        Ok(())
    }

    fn apply_card(&mut self, player_id: PlayerId, card: Card, auto_played: bool) -> Result<(), GameError> {
        let outcome = self.state.play_card(&player_id, card)?;
        self.timer = None;

        let trick_cards = match &outcome.completed_trick {
            Some(trick) => trick.plays.clone(),
            None => self
                .state
                .round()
                .map(|round| round.current_trick.clone())
                .unwrap_or_default(),
        };
        self.broadcast(Payload::CardPlayed {
            player_id,
            card,
            trick_cards,
            auto_played,
        });

        if let Some(trick) = outcome.completed_trick {
            debug!(
                "{} wins the trick ({} tricks)",
                trick.winner_id, outcome.winner_tricks
            );
            let tricks_won_count = self
                .state
                .round()
                .map(|round| round.tricks_won.clone())
                .unwrap_or_default();
            self.broadcast(Payload::TrickWon {
                winner_id: trick.winner_id,
                cards: trick.plays,
                tricks_won_count,
            });
        }

        if outcome.round_complete {
            return self.finish_round();
        }
        self.prompt_current();
        Ok(())
    }

    fn finish_round(&mut self) -> Result<(), GameError> {
        let summary = self.state.round_scores()?;
        info!("round {} complete", summary.round_number);
        self.broadcast(Payload::RoundEnd {
            round_number: summary.round_number,
            scores: summary.scores,
            total_scores: self.state.total_scores(),
            tricks_won: summary.tricks_won,
            bids: summary.bids,
        });

        if self.state.current_round() >= self.state.num_rounds() {
            self.state.end_round()?;
            return self.finish_game();
        }
        self.timer = Some(ArmedTimer {
            kind: TimerKind::NextRound,
            player: None,
            deadline: Instant::now() + self.config.next_round_delay,
        });
        Ok(())
    }

    fn finish_game(&mut self) -> Result<(), GameError> {
        let standings = self.state.compute_final_scores()?;
        info!(
            "game over, {} wins",
            self.player_name(&standings.winner_id)
        );
        self.broadcast(Payload::GameEnd {
            final_scores: standings.totals,
            winner_id: standings.winner_id,
            all_round_scores: self.state.round_history().to_vec(),
        });
        self.timer = None;
        self.is_closed = true;
        Ok(())
    }

    fn on_timer(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        let result = match (timer.kind, timer.player) {
            (TimerKind::NextRound, _) => match self.state.end_round() {
                Ok(_) => self.begin_round(),
                Err(error) => Err(error),
            },
            (_, Some(player_id)) if self.state.current_player() != Some(player_id) => {
                debug!("stale {:?} timer for {player_id}", timer.kind);
                Ok(())
            }
            (TimerKind::Trump, Some(chooser)) => {
                let hand = self.state.hand(&chooser).unwrap_or_default();
                let suit = functional::fallback_trump(hand);
                debug!("trump timer expired, picking {} for {chooser}", suit.name());
                self.apply_trump(chooser, suit, true)
            }
            (TimerKind::Bid, Some(player_id)) => {
                let amount = self.state.rules().min_bid;
                debug!("bid timer expired, bidding {amount} for {player_id}");
                self.apply_bid(player_id, amount, true)
            }
            (TimerKind::Play, Some(player_id)) => {
                match functional::fallback_card(&self.state.legal_cards(&player_id)) {
                    Some(card) => {
                        debug!("play timer expired, playing {card} for {player_id}");
                        self.apply_card(player_id, card, true)
                    }
                    None => Err(GameError::InvariantViolation(format!(
                        "{player_id} has no legal card"
                    ))),
                }
            }
            (kind, None) => Err(GameError::InvariantViolation(format!(
                "{kind:?} timer without a player"
            ))),
        };

        if let Err(error) = result {
            if error.is_fatal() {
                self.abort(&error);
            } else {
                warn!("automatic action failed: {error}");
            }
        }
    }

    fn snapshot_for(&self, player_id: &PlayerId) -> Snapshot {
        let round = self.state.round();
        Snapshot {
            round_number: self.state.current_round(),
            total_rounds: self.state.num_rounds(),
            phase: self.state.phase(),
            players: self.roster.player_info(),
            trump_suit: round.and_then(|round| round.trump_suit),
            trump_chooser: round.map(|round| round.trump_chooser),
            hand: self.state.hand(player_id).unwrap_or_default().to_vec(),
            current_trick: round
                .map(|round| round.current_trick.clone())
                .unwrap_or_default(),
            bids: round.map(|round| round.bids.clone()).unwrap_or_default(),
            tricks_won: round
                .map(|round| round.tricks_won.clone())
                .unwrap_or_default(),
            current_turn: self.state.current_player(),
            total_scores: self.state.total_scores(),
        }
    }

    fn send_snapshot(&self, player_id: &PlayerId) {
        let snapshot = self.snapshot_for(player_id);
        self.unicast(player_id, Payload::StateSyncSnapshot(Box::new(snapshot)));
    }

    fn abort(&mut self, error: &GameError) {
        error!("aborting session: {error}");
        self.broadcast(Payload::Error {
            code: ErrorCode::SessionAborted,
            reason: error.to_string(),
        });
        self.timer = None;
        self.is_closed = true;
    }
}
