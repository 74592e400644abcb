//! Script lines understood by the CLI on top of the simulation commands.

use sim_runtime::{Command, ParseCommandError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    Status,
    Shop,
    /// Commit `command` this many times.
    Run(Command, u32),
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(raw: &str) -> Result<Option<Line>, ParseCommandError> {
    let text = raw.split('#').next().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(None);
    }
    let mut words = text.split_whitespace();
    let line = match (words.next(), words.next(), words.next()) {
        (Some("status"), None, _) => Line::Status,
        (Some("shop"), None, _) => Line::Shop,
        (Some("tick"), Some(n), None) => {
            let times = n
                .parse()
                .map_err(|_| ParseCommandError::InvalidNumber(n.to_string()))?;
            Line::Run(Command::Tick, times)
        }
        _ => Line::Run(text.parse()?, 1),
    };
    Ok(Some(line))
}
