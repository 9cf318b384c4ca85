//! User controls typed on stdin.

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start scanning.
    Start,
    /// Stop scanning.
    Stop,
    /// Close the product result.
    Dismiss,
    /// Print the current state.
    Status,
    /// Print the command list.
    Help,
    /// Leave the program.
    Quit,
    /// Anything else is a barcode from a keyboard-wedge reader.
    Scan(String),
}

impl Command {
    /// Interpret a line of input. Keywords are case-insensitive.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "dismiss" | "close" => Self::Dismiss,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Scan(trimmed.to_string()),
        }
    }
}

/// Shown for `help`.
pub const HELP: &str = "\
commands:
  start     start scanning
  stop      stop scanning
  dismiss   close the product result
  status    show the current state
  quit      exit
any other line is treated as a scanned barcode";
