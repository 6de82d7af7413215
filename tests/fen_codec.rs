use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scacco::board::CastleSide;
use scacco::fen::{decode, encode};
use scacco::{Board, ChessError, Color, Game, START_FEN};

#[test]
fn start_position_decodes_to_standard_board() {
    let (board, aux) = decode(START_FEN).unwrap();
    assert_eq!(board, Board::standard());
    assert_eq!(encode(&board, &aux), START_FEN);
}

#[test]
fn round_trip_over_random_games() {
    scacco::init();
    for seed in 0..6u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new();
        for _ in 0..60 {
            let text = game.fen();
            let (board, aux) = decode(&text).unwrap();
            assert!(board.same_placement(game.board()), "{}", text);
            assert_eq!(&aux, game.aux());
            for color in Color::BOTH {
                for side in [CastleSide::King, CastleSide::Queen] {
                    assert_eq!(
                        board.castling_right(color, side),
                        game.board().castling_right(color, side),
                        "{}",
                        text
                    );
                }
            }
            assert_eq!(encode(&board, &aux), text);

            if game.status().is_terminal() {
                break;
            }
            let moves = game.legal_moves();
            game.commit(moves[rng.random_range(0..moves.len())]).unwrap();
        }
    }
}

#[test]
fn malformed_text_is_rejected() {
    let bad = [
        "",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
        "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkx - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
        "rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQ - 0 1",
        "4k3/8/8/8/8/8/8/4K2R w Q - 0 1",
        "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
        // Black is in check with White to move
        "4k3/8/8/8/8/8/4R3/4K3 w - - 0 1",
    ];
    for text in bad {
        assert!(
            matches!(decode(text), Err(ChessError::MalformedPosition(_))),
            "accepted '{}'",
            text
        );
    }
}

#[test]
fn king_capture_position_never_reaches_the_game() {
    scacco::init();
    assert!(matches!(
        Game::from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1"),
        Err(ChessError::MalformedPosition(_))
    ));
    let game = Game::from_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1").unwrap();
    assert_eq!(game.status(), scacco::GameStatus::Check);
    assert!(game
        .legal_moves()
        .iter()
        .all(|mv| game.board().get(mv.to).is_none()));
}
