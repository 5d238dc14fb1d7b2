//! Command parsing for the interactive channel.
//!
//! Lines starting with `/` map to engine operations; anything else is a
//! counting candidate.

/// Parses a line of input into a `Command`.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(content: &str) -> Command {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/end" | "/stop" => Command::End,
            "/reset" => Command::Reset,
            "/turns" | "/toggleturns" => Command::ToggleTurns,
            "/resetonwrong" | "/togglereset" => Command::ToggleResetOnWrong,
            "/leaderboard" | "/lb" => Command::Leaderboard,
            "/info" => Command::Info,
            "/help" | "/?" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => parse_complex(trimmed),
        }
    }
}

fn parse_complex(trimmed: &str) -> Command {
    parse_mode_command(trimmed, "/start")
        .map(|(mode, args)| Command::Start { mode, args })
        .or_else(|| {
            parse_mode_command(trimmed, "/reload")
                .map(|(mode, args)| Command::Reload { mode, args })
        })
        .or_else(|| parse_skip(trimmed))
        .or_else(|| parse_as(trimmed))
        .unwrap_or_else(|| Command::Candidate(trimmed.to_string()))
}

/// `/start <mode> [args]` and `/reload <mode> [args]`.
fn parse_mode_command(trimmed: &str, name: &str) -> Option<(String, String)> {
    let rest = strip_command(trimmed, name)?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let mode = parts.next().filter(|m| !m.is_empty())?.to_lowercase();
    let args = parts.next().unwrap_or("").trim().to_string();
    Some((mode, args))
}

/// `/skip 5,10,15`
fn parse_skip(trimmed: &str) -> Option<Command> {
    let rest = strip_command(trimmed, "/skip")?;
    Some(Command::SetSkipNumbers(rest.to_string()))
}

/// `/as <participant>` switches who the following lines come from.
fn parse_as(trimmed: &str) -> Option<Command> {
    let rest = strip_command(trimmed, "/as")?;
    let participant = rest.split_whitespace().next()?;
    Some(Command::As(participant.to_string()))
}

/// Argument text after `name`, which must be followed by whitespace or end the line.
fn strip_command<'a>(trimmed: &'a str, name: &str) -> Option<&'a str> {
    if !trimmed.get(..name.len())?.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = &trimmed[name.len()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { mode: String, args: String },
    Reload { mode: String, args: String },
    End,
    Reset,
    ToggleTurns,
    ToggleResetOnWrong,
    /// Raw comma-separated list.
    SetSkipNumbers(String),
    Leaderboard,
    Info,
    As(String),
    Help,
    Quit,
    /// A counting attempt.
    Candidate(String),
}

pub const HELP: &str = "\
/start <mode> [args]   start a game (normal, reverse, skip, random, multiples <n>,
                       prime, fibonacci, squares, cubes, factorials, custom <a,b,c>)
/reload <mode> [args]  replace the running game
/end                   end the game
/reset                 reset the count
/turns                 toggle taking turns
/resetonwrong          toggle reset on wrong count
/skip <a,b,c>          set skip numbers (skip mode)
/leaderboard, /info    show standings or game state
/as <name>             switch participant
/quit                  exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(CommandParser::parse("/end"), Command::End);
        assert_eq!(CommandParser::parse("  /RESET "), Command::Reset);
        assert_eq!(CommandParser::parse("/turns"), Command::ToggleTurns);
        assert_eq!(CommandParser::parse("/lb"), Command::Leaderboard);
        assert_eq!(CommandParser::parse("/exit"), Command::Quit);
    }

    #[test]
    fn start_with_args() {
        assert_eq!(
            CommandParser::parse("/start Multiples 3"),
            Command::Start {
                mode: "multiples".into(),
                args: "3".into()
            }
        );
        assert_eq!(
            CommandParser::parse("/reload custom 1, 2, 3"),
            Command::Reload {
                mode: "custom".into(),
                args: "1, 2, 3".into()
            }
        );
        assert_eq!(
            CommandParser::parse("/start"),
            Command::Candidate("/start".into())
        );
    }

    #[test]
    fn skip_and_as() {
        assert_eq!(
            CommandParser::parse("/skip 5,7"),
            Command::SetSkipNumbers("5,7".into())
        );
        assert_eq!(CommandParser::parse("/as Bob"), Command::As("Bob".into()));
        // prefix must end at a word boundary
        assert_eq!(
            CommandParser::parse("/skipper"),
            Command::Candidate("/skipper".into())
        );
    }

    #[test]
    fn everything_else_is_a_candidate() {
        assert_eq!(
            CommandParser::parse(" twenty-one "),
            Command::Candidate("twenty-one".into())
        );
    }
}
