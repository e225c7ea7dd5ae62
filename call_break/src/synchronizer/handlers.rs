//! One handler per host message kind. Handlers write full values into the
//! projection so replaying a message is harmless.

use log::debug;

use super::projection::{FinalResult, Projection, Prompt};
use crate::{
    game::entities::{Card, Play, PlayerId, PlayerInfo},
    net::messages::{Payload, Snapshot},
};

pub(super) fn apply_payload(projection: &mut Projection, payload: Payload) {
    match payload {
        Payload::LobbyUpdate {
            players,
            max_players,
        } => {
            projection.players = players;
            projection.max_players = max_players;
        }

        Payload::GameStart {
            player_order,
            num_rounds,
        } => on_game_start(projection, player_order, num_rounds),

        Payload::RoundStart {
            round_number,
            total_rounds,
        } => {
            projection.total_rounds = total_rounds;
            if round_number > projection.round_number {
                projection.reset_round();
            } else {
                debug!(
                    "ignoring start of round {round_number} during round {}",
                    projection.round_number
                );
            }
        }

        Payload::CardsDealt { mut cards, .. } => {
            cards.sort();
            projection.hand = cards;
        }

        Payload::TrumpChooserSelected { player_id, .. } => {
            projection.trump_chooser = Some(player_id);
            projection.current_turn = Some(player_id);
        }

        Payload::TrumpSelectionRequest {
            available_suits,
            timeout_seconds,
        } => {
            projection.current_turn = Some(projection.player_id);
            projection.prompt = Some(Prompt::ChooseTrump {
                available_suits,
                timeout_seconds,
            });
        }

        Payload::TrumpSelected {
            trump_suit,
            auto_selected,
            ..
        } => {
            projection.trump_suit = Some(trump_suit);
            projection.trump_auto_selected = auto_selected;
            if matches!(projection.prompt, Some(Prompt::ChooseTrump { .. })) {
                projection.prompt = None;
            }
        }

        Payload::BidTurn {
            min_bid,
            max_bid,
            timeout_seconds,
        } => {
            projection.current_turn = Some(projection.player_id);
            projection.prompt = Some(Prompt::Bid {
                min_bid,
                max_bid,
                timeout_seconds,
            });
        }

        Payload::BiddingStatus {
            current_bidder,
            bids_so_far,
            ..
        } => {
            projection.current_turn = Some(current_bidder);
            projection.bids = bids_so_far;
        }

        Payload::BidMade {
            player_id, amount, ..
        } => {
            projection.bids.insert(player_id, amount);
            if player_id == projection.player_id {
                projection.prompt = None;
            }
        }

        Payload::BiddingComplete { all_bids } => {
            projection.bids = all_bids;
        }

        Payload::PlayTurn {
            valid_cards,
            timeout_seconds,
        } => {
            projection.current_turn = Some(projection.player_id);
            projection.prompt = Some(Prompt::Play {
                valid_cards,
                timeout_seconds,
            });
        }

        Payload::PlayingStatus { current_player, .. } => {
            projection.current_turn = Some(current_player);
        }

        Payload::CardPlayed {
            player_id,
            card,
            trick_cards,
            ..
        } => on_card_played(projection, player_id, card, trick_cards),

        Payload::TrickWon {
            winner_id,
            cards,
            tricks_won_count,
        } => {
            projection.tricks_won = tricks_won_count;
            projection.current_trick.clear();
            projection.last_trick = Some((winner_id, cards));
            projection.current_turn = Some(winner_id);
        }

        Payload::RoundEnd {
            scores,
            total_scores,
            tricks_won,
            bids,
            ..
        } => {
            projection.round_scores = scores;
            projection.total_scores = total_scores;
            projection.tricks_won = tricks_won;
            projection.bids = bids;
            projection.current_trick.clear();
            projection.current_turn = None;
            projection.prompt = None;
        }

        Payload::GameEnd {
            final_scores,
            winner_id,
            ..
        } => {
            projection.total_scores = final_scores.iter().copied().collect();
            projection.final_result = Some(FinalResult {
                final_scores,
                winner_id,
            });
            projection.current_turn = None;
            projection.prompt = None;
        }

        Payload::PlayerDisconnect { player_id } => projection.set_connected(player_id, false),

        Payload::PlayerReconnect { player_id } => projection.set_connected(player_id, true),

        Payload::StateSyncSnapshot(snapshot) => apply_snapshot(projection, *snapshot),

        Payload::Error { code, reason } => {
            projection.last_error = Some((code, reason));
        }
    }
}

fn on_game_start(projection: &mut Projection, player_order: Vec<PlayerInfo>, num_rounds: u32) {
    projection.disconnected = player_order
        .iter()
        .filter(|info| !info.connected)
        .map(|info| info.id)
        .collect();
    projection.players = player_order;
    projection.total_rounds = num_rounds;
    projection.total_scores = projection
        .players
        .iter()
        .map(|info| (info.id, Default::default()))
        .collect();
    projection.final_result = None;
}

fn on_card_played(
    projection: &mut Projection,
    player_id: PlayerId,
    card: Card,
    trick_cards: Vec<Play>,
) {
    let already_won = projection
        .last_trick
        .as_ref()
        .is_some_and(|(_, plays)| *plays == trick_cards);
    if already_won {
        debug!("{card} closed a trick that was already won");
    } else {
        projection.current_trick = trick_cards;
    }
    if player_id == projection.player_id {
        projection.hand.retain(|held| *held != card);
        projection.prompt = None;
    }
}

/// Replaces every field the snapshot covers. Applying the same snapshot
/// again yields the same projection.
fn apply_snapshot(projection: &mut Projection, snapshot: Snapshot) {
    projection.total_rounds = snapshot.total_rounds;
    projection.disconnected = snapshot
        .players
        .iter()
        .filter(|info| !info.connected)
        .map(|info| info.id)
        .collect();
    projection.players = snapshot.players;
    projection.trump_suit = snapshot.trump_suit;
    projection.trump_chooser = snapshot.trump_chooser;
    projection.hand = snapshot.hand;
    projection.hand.sort();
    projection.current_trick = snapshot.current_trick;
    projection.bids = snapshot.bids;
    projection.tricks_won = snapshot.tricks_won;
    projection.current_turn = snapshot.current_turn;
    projection.total_scores = snapshot.total_scores;
    if !projection.is_my_turn() {
        projection.prompt = None;
    }
}
