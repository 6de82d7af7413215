use scacco::eval::score;
use scacco::fen::decode;
use scacco::Board;

fn board_of(text: &str) -> Board {
    decode(text).expect("valid position").0
}

#[test]
fn test_material_difference() {
    assert_eq!(score(&board_of(scacco::START_FEN)), 0, "Initial position should be 0");

    // Black missing the e-pawn
    let pawn_up = score(&board_of(
        "rnbqkbnr/pppp1ppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ));
    assert!(pawn_up > 50, "White should be up material, got {}", pawn_up);

    let queen_down = score(&board_of(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1",
    ));
    assert!(queen_down < -800);
}

#[test]
fn test_knight_psqt() {
    let corner = score(&board_of("N7/8/8/8/8/8/8/k6K w - - 0 1"));
    let center = score(&board_of("8/8/8/8/3N4/8/8/k6K w - - 0 1"));
    assert!(center > corner, "centralised knight {} vs corner {}", center, corner);
}

#[test]
fn evaluation_ignores_side_to_move() {
    let white = board_of("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
    let black = board_of("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 3");
    assert_eq!(score(&white), score(&black));
}
