//! Line commands typed on stdin, standing in for a user at the overlay.
use anyhow::{bail, Result};
use inpage_search::agent::{AgentDisplay, KeyCode, KeyPress};
use inpage_search::{SearchEvent, UiEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ui(UiEvent),
    Open,
    Quit,
}

pub const HELP: &str = "commands: open | type <text> | enter | submit | back | forward | close | esc | ctrl-g | quit";

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let cmd = match word {
        "type" => Command::Ui(UiEvent::Input(rest.to_string())),
        "enter" => Command::Ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter))),
        "submit" => Command::Ui(UiEvent::SubmitClick),
        "back" => Command::Ui(UiEvent::BackClick),
        "forward" => Command::Ui(UiEvent::ForwardClick),
        "close" => Command::Ui(UiEvent::CloseClick),
        "esc" => Command::Ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Escape))),
        "ctrl-g" => Command::Ui(UiEvent::KeyDown(KeyPress::ctrl(KeyCode::Char('g')))),
        "open" => Command::Open,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command `{other}`; {HELP}"),
    };
    Ok(Some(cmd))
}

pub fn describe(event: &SearchEvent) -> String {
    match event {
        SearchEvent::Open => "open".into(),
        SearchEvent::Stop => "stop".into(),
        SearchEvent::Start { query } => format!("start {query:?}"),
        SearchEvent::Next { query, forward } => {
            let dir = if *forward { "forward" } else { "back" };
            format!("next {query:?} {dir}")
        }
        SearchEvent::Found { query, nth, all } => format!("found {query:?} {nth}/{all}"),
        SearchEvent::FocusInput => "focus-input".into(),
    }
}

pub fn render(display: &AgentDisplay) -> String {
    format!("[{}] {}", display.input, display.counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_keeps_inner_spaces() {
        assert_eq!(
            parse("type foo bar").unwrap(),
            Some(Command::Ui(UiEvent::Input("foo bar".into())))
        );
        assert_eq!(
            parse("type").unwrap(),
            Some(Command::Ui(UiEvent::Input(String::new())))
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("jump").is_err());
    }

    #[test]
    fn ctrl_g_is_a_ctrl_chord() {
        assert_eq!(
            parse("ctrl-g").unwrap(),
            Some(Command::Ui(UiEvent::KeyDown(KeyPress::ctrl(KeyCode::Char('g')))))
        );
    }

    #[test]
    fn found_reads_as_counter() {
        let e = SearchEvent::Found {
            query: "foo".into(),
            nth: 1,
            all: 2,
        };
        assert_eq!(describe(&e), "found \"foo\" 1/2");
    }
}
