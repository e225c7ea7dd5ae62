//! Plain-text rendering of host messages.

use call_break::{
    entities::{Card, PlayerId},
    messages::{Payload, ServerMessage},
    synchronizer::Projection,
};

fn cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn who(projection: &Projection, player_id: &PlayerId) -> String {
    if *player_id == projection.player_id {
        return "you".to_string();
    }
    projection
        .name_of(player_id)
        .map_or_else(|| player_id.to_string(), |name| name.to_string())
}

/// One line describing `message`, read against the projection it was
/// applied to. Messages that add nothing worth printing yield `None`.
pub fn describe(projection: &Projection, message: &ServerMessage) -> Option<String> {
    let line = match &message.payload {
        Payload::LobbyUpdate {
            players,
            max_players,
        } => format!("lobby: {}/{max_players} seated", players.len()),
        Payload::GameStart {
            player_order,
            num_rounds,
        } => {
            let names: Vec<String> = player_order.iter().map(|p| p.name.to_string()).collect();
            format!("game start: {num_rounds} rounds, {}", names.join(", "))
        }
        Payload::RoundStart {
            round_number,
            total_rounds,
        } => format!("--- round {round_number} of {total_rounds} ---"),
        Payload::CardsDealt { cards: dealt, .. } => format!("your hand: {}", cards(dealt)),
        Payload::TrumpChooserSelected { player_id, .. } => {
            format!("{} choose(s) trump", who(projection, player_id))
        }
        Payload::TrumpSelectionRequest {
            timeout_seconds, ..
        } => format!("choose trump within {timeout_seconds}s: trump SUIT"),
        Payload::TrumpSelected {
            trump_suit,
            chooser_name,
            auto_selected,
            ..
        } => {
            let auto = if *auto_selected { " (timed out)" } else { "" };
            format!("trump is {} {trump_suit}, chosen by {chooser_name}{auto}", trump_suit.name())
        }
        Payload::BidTurn {
            min_bid,
            max_bid,
            timeout_seconds,
        } => match timeout_seconds {
            Some(secs) => format!("your bid ({min_bid}-{max_bid}) within {secs}s: bid N"),
            None => format!("your bid ({min_bid}-{max_bid}): bid N"),
        },
        Payload::BidMade {
            player_id,
            amount,
            auto_selected,
        } => {
            let auto = if *auto_selected { " (timed out)" } else { "" };
            format!("{} bid {amount}{auto}", who(projection, player_id))
        }
        Payload::PlayTurn { valid_cards, .. } => {
            format!("your play: {}", cards(valid_cards))
        }
        Payload::CardPlayed {
            player_id,
            card,
            auto_played,
            ..
        } => {
            let auto = if *auto_played { " (timed out)" } else { "" };
            format!("{} played {card}{auto}", who(projection, player_id))
        }
        Payload::TrickWon {
            winner_id, cards: played, ..
        } => {
            let played: Vec<Card> = played.iter().map(|play| play.card).collect();
            format!("{} won the trick [{}]", who(projection, winner_id), cards(&played))
        }
        Payload::RoundEnd {
            round_number,
            scores,
            total_scores,
            ..
        } => {
            let rows: Vec<String> = scores
                .iter()
                .map(|(id, score)| {
                    let total = total_scores.get(id).copied().unwrap_or_default();
                    format!("{} {score} (total {total})", who(projection, id))
                })
                .collect();
            format!("round {round_number} scores: {}", rows.join(", "))
        }
        Payload::GameEnd {
            final_scores,
            winner_id,
            ..
        } => {
            let rows: Vec<String> = final_scores
                .iter()
                .map(|(id, score)| format!("{} {score}", who(projection, id)))
                .collect();
            format!(
                "game over, {} won. final: {}",
                who(projection, winner_id),
                rows.join(", ")
            )
        }
        Payload::PlayerDisconnect { player_id } => {
            format!("{} disconnected", who(projection, player_id))
        }
        Payload::PlayerReconnect { player_id } => {
            format!("{} reconnected", who(projection, player_id))
        }
        Payload::StateSyncSnapshot(snapshot) => format!(
            "synced: round {} of {}, {}, hand {}",
            snapshot.round_number,
            snapshot.total_rounds,
            snapshot.phase,
            cards(&snapshot.hand)
        ),
        Payload::Error { code, reason } => format!("error ({code}): {reason}"),
        Payload::BiddingStatus { .. }
        | Payload::BiddingComplete { .. }
        | Payload::PlayingStatus { .. } => return None,
    };
    Some(line)
}
