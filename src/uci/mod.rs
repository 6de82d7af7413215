pub mod engine;
pub mod parser;

pub use engine::{process_uci_line, run_uci_loop, UciEngine, UciState};
pub use parser::{parse_uci_command, UciCommand};
