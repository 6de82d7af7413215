//! Count leaf nodes with our generator and cross-check against shakmaty.

use clap::Parser;
use scacco::board::START_FEN;
use scacco::{fen, movegen};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from(START_FEN))]
    fen: String,

    #[arg(short, long, default_value_t = 4)]
    depth: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    scacco::init();

    println!("Running perft on FEN: '{}' at depth {}", args.fen, args.depth);

    let (board, aux) = match fen::decode(&args.fen) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let pos = match reference_position(&args.fen) {
        Ok(pos) => pos,
        Err(e) => {
            eprintln!("shakmaty rejected the position: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = std::time::Instant::now();
    let ours = movegen::perft(&board, &aux, args.depth);
    let duration = start.elapsed();
    println!(
        "Scacco perft({}) = {} nodes ({} ms)",
        args.depth,
        ours,
        duration.as_millis()
    );

    let start = std::time::Instant::now();
    let expected = perft_shakmaty(&pos, args.depth);
    let duration = start.elapsed();
    println!(
        "Shakmaty perft({}) = {} nodes ({} ms)",
        args.depth,
        expected,
        duration.as_millis()
    );

    if ours != expected {
        println!("MISMATCH: off by {}", ours as i64 - expected as i64);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn reference_position(text: &str) -> Result<Chess, String> {
    if text == START_FEN {
        return Ok(Chess::default());
    }
    let fen: Fen = text.parse().map_err(|e| format!("{}", e))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| format!("{}", e))
}

fn perft_shakmaty(pos: &Chess, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut new_pos = pos.clone();
        new_pos.play_unchecked(&m);
        nodes += perft_shakmaty(&new_pos, depth - 1);
    }
    nodes
}
