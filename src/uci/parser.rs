//! UCI command parser covering the subset the engine answers

use crate::time::ClockInfo;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption {
        name: String,
        value: Option<String>,
    },
    UciNewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go {
        depth: Option<u8>,
        clock: ClockInfo,
        infinite: bool,
    },
    Stop,
    /// Non-standard `d`: print the current position
    Display,
    Quit,
    Unknown(String),
}

// Value following `key`, if present and parseable.
fn value_after<T: FromStr>(parts: &[&str], key: &str) -> Option<T> {
    parts
        .iter()
        .position(|&p| p == key)
        .and_then(|i| parts.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Parse a UCI command from a string (simple tokenizer)
pub fn parse_uci_command(line: &str) -> UciCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = parts.first() else {
        return UciCommand::Unknown(String::new());
    };
    match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "stop" => UciCommand::Stop,
        "d" => UciCommand::Display,
        "quit" => UciCommand::Quit,
        "setoption" => parse_setoption(&parts[1..]),
        "position" => parse_position(&parts[1..]),
        "go" => {
            let args = &parts[1..];
            UciCommand::Go {
                depth: value_after(args, "depth"),
                clock: ClockInfo {
                    wtime: value_after(args, "wtime"),
                    btime: value_after(args, "btime"),
                    winc: value_after(args, "winc"),
                    binc: value_after(args, "binc"),
                    movetime: value_after(args, "movetime"),
                    movestogo: value_after(args, "movestogo"),
                },
                infinite: args.contains(&"infinite"),
            }
        }
        _ => UciCommand::Unknown(line.trim().to_string()),
    }
}

// setoption name <name words> [value <value words>]
fn parse_setoption(parts: &[&str]) -> UciCommand {
    let value_at = parts.iter().position(|&p| p == "value");
    let name_end = value_at.unwrap_or(parts.len());
    let name = parts
        .iter()
        .take(name_end)
        .skip_while(|&&p| p == "name")
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let value = value_at.map(|i| parts[i + 1..].join(" "));
    UciCommand::SetOption { name, value }
}

// position [startpos | fen <6 fields>] [moves <m1> ...]
fn parse_position(parts: &[&str]) -> UciCommand {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let head = &parts[..moves_at.unwrap_or(parts.len())];
    let fen = match head.first() {
        Some(&"fen") => Some(head[1..].join(" ")),
        _ => None,
    };
    let moves = moves_at
        .map(|i| parts[i + 1..].iter().map(|m| m.to_string()).collect())
        .unwrap_or_default();
    UciCommand::Position { fen, moves }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_startpos_with_moves() {
        assert_eq!(
            parse_uci_command("position startpos moves e2e4 e7e5"),
            UciCommand::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
    }

    #[test]
    fn position_fen() {
        let cmd = parse_uci_command("position fen 4k3/8/8/8/8/8/8/4K3 w - - 0 1 moves e1e2");
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1".to_string()),
                moves: vec!["e1e2".to_string()],
            }
        );
    }

    #[test]
    fn go_fields() {
        let cmd = parse_uci_command("go wtime 1000 btime 2000 winc 10 binc 20 movestogo 5 depth 3");
        let UciCommand::Go {
            depth,
            clock,
            infinite,
        } = cmd
        else {
            panic!("not a go command");
        };
        assert_eq!(depth, Some(3));
        assert_eq!(clock.wtime, Some(1000));
        assert_eq!(clock.binc, Some(20));
        assert_eq!(clock.movestogo, Some(5));
        assert!(!infinite);
    }

    #[test]
    fn setoption_multiword() {
        assert_eq!(
            parse_uci_command("setoption name Own Book value true"),
            UciCommand::SetOption {
                name: "Own Book".to_string(),
                value: Some("true".to_string()),
            }
        );
        assert_eq!(
            parse_uci_command("setoption name Difficulty"),
            UciCommand::SetOption {
                name: "Difficulty".to_string(),
                value: None,
            }
        );
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!(
            parse_uci_command("xyzzy 1"),
            UciCommand::Unknown("xyzzy 1".to_string())
        );
        assert_eq!(parse_uci_command("   "), UciCommand::Unknown(String::new()));
    }
}
