//! Command-line front-end.

mod repl;

pub use repl::{is_end_command, Command, Repl, FAREWELL, GREETING, PROMPT};
