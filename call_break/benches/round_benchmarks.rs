use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use call_break::{
    GameRules, GameState, Phase,
    entities::{Card, Play, PlayerId, Suit},
    functional::{fallback_card, fallback_trump, legal_cards, trick_winner},
    messages::{Payload, ServerMessage},
    utils::{decode, encode},
};

/// A game with `n` seated players and round one dealt.
fn dealt_game(n: usize) -> GameState {
    let ids: Vec<PlayerId> = (0..n).map(|_| PlayerId::new()).collect();
    let mut game = GameState::new(GameRules::default(), Some(1));
    game.start_game(ids, 1).unwrap();
    game.deal_round().unwrap();
    game
}

/// Plays a whole round with timeout defaults for every decision.
fn play_round(mut game: GameState) -> GameState {
    let chooser = game.round().unwrap().trump_chooser;
    let trump = fallback_trump(game.hand(&chooser).unwrap());
    game.select_trump(&chooser, trump, true).unwrap();
    while game.phase() == Phase::Bidding {
        let id = game.current_player().unwrap();
        game.record_bid(&id, 1).unwrap();
    }
    while game.phase() == Phase::Playing {
        let id = game.current_player().unwrap();
        let card = fallback_card(&game.legal_cards(&id)).unwrap();
        game.play_card(&id, card).unwrap();
    }
    game
}

fn bench_trick_winner(c: &mut Criterion) {
    let plays: Vec<Play> = ["10h", "5h", "kh", "2s"]
        .iter()
        .map(|s| Play {
            player_id: PlayerId::new(),
            card: s.parse().unwrap(),
        })
        .collect();

    c.bench_function("trick_winner_4_cards", |b| {
        b.iter(|| trick_winner(black_box(&plays), Suit::Spades));
    });
}

fn bench_legal_cards(c: &mut Criterion) {
    let hand: Vec<Card> = "2s 5s 9s qs 3h 7h jh 4d 8d kd 6c 10c ac"
        .split_whitespace()
        .map(|s| s.parse().unwrap())
        .collect();

    c.bench_function("legal_cards_follow", |b| {
        b.iter(|| legal_cards(black_box(&hand), Some(Suit::Hearts)));
    });
    c.bench_function("legal_cards_void", |b| {
        b.iter(|| legal_cards(black_box(&hand[..9]), Some(Suit::Clubs)));
    });
}

/// Benchmark a full round with different player counts
fn bench_full_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_round");

    for n_players in [2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || dealt_game(n),
                    play_round,
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_message_codec(c: &mut Criterion) {
    let game = dealt_game(4);
    let id = game.player_order()[0];
    let message = ServerMessage {
        round_number: 1,
        phase: game.phase(),
        payload: Payload::CardsDealt {
            cards: game.hand(&id).unwrap().to_vec(),
            round_number: 1,
        },
    };
    let bytes = encode(&message).unwrap();

    c.bench_function("encode_cards_dealt", |b| {
        b.iter(|| encode(black_box(&message)).unwrap());
    });
    c.bench_function("decode_cards_dealt", |b| {
        b.iter(|| decode::<ServerMessage>(black_box(&bytes)).unwrap());
    });
}

criterion_group!(rules, bench_trick_winner, bench_legal_cards);

criterion_group!(rounds, bench_full_round, bench_message_codec);

criterion_main!(rules, rounds);
