use quiz_core::model::{Category, OptionId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0} (type `help`)")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fresh session; `Some` restricts it to one category (`Some(None)` = uncategorized).
    Start(Option<Option<Category>>),
    Resume,
    Select(Vec<OptionId>),
    Check,
    Next,
    /// 1-based position in the working set.
    Jump(usize),
    Clear,
    Flag,
    List,
    Review,
    Quiz,
    RetryWrong,
    RetryFlagged,
    Restart,
    Login(String),
    Logout,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Empty lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` for unknown words or bad arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "start" | "new" => Command::Start(parse_category(rest)?),
            "resume" | "continue" => Command::Resume,
            "select" => Command::Select(parse_options(rest, "select")?),
            "check" | "ok" => Command::Check,
            "next" => Command::Next,
            "jump" | "go" => Command::Jump(parse_position(rest)?),
            "clear" => Command::Clear,
            "flag" => Command::Flag,
            "list" | "ls" => Command::List,
            "review" | "stop" => Command::Review,
            "quiz" | "back" => Command::Quiz,
            "retry-wrong" | "rw" => Command::RetryWrong,
            "retry-flagged" | "rf" => Command::RetryFlagged,
            "restart" => Command::Restart,
            "login" => match rest.trim() {
                "" => {
                    return Err(CommandError::BadArgument {
                        command: "login",
                        expected: "a user name",
                    });
                }
                user => Command::Login(user.to_owned()),
            },
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ if is_option_list(line) => Command::Select(parse_options(line, "select")?),
            _ => return Err(CommandError::Unknown(word.to_owned())),
        };
        Ok(Some(command))
    }
}

fn split_word(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    Some(line.split_once(char::is_whitespace).unwrap_or((line, "")))
}

/// Bare option ids such as `b` or `a c` select directly.
fn is_option_list(line: &str) -> bool {
    line.split_whitespace()
        .all(|token| token.len() == 1 && token.chars().all(|c| c.is_ascii_alphabetic()))
}

fn parse_options(rest: &str, command: &'static str) -> Result<Vec<OptionId>, CommandError> {
    let options: Vec<_> = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| OptionId::new(token.to_ascii_lowercase()))
        .collect();
    if options.is_empty() {
        return Err(CommandError::BadArgument {
            command,
            expected: "one or more option ids",
        });
    }
    Ok(options)
}

fn parse_position(rest: &str) -> Result<usize, CommandError> {
    rest.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(CommandError::BadArgument {
            command: "jump",
            expected: "a question number starting at 1",
        })
}

fn parse_category(rest: &str) -> Result<Option<Option<Category>>, CommandError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(None);
    }
    if rest.eq_ignore_ascii_case(quiz_core::model::UNCATEGORIZED) {
        return Ok(Some(None));
    }
    Category::from_label(rest)
        .map(|category| Some(Some(category)))
        .ok_or(CommandError::BadArgument {
            command: "start",
            expected: "a category label",
        })
}

pub const HELP: &str = "\
commands:
  start [category]   new session (optionally one category)
  resume             continue the saved session
  a | a c | select a choose option(s); multiple-answer questions toggle
  check | ok         grade the current selection
  next               go to the next unanswered question
  jump N             go to question N
  clear              hide a wrong result and try again
  flag               flag or unflag the current question
  list               show every question by category
  review / quiz      switch between review and quiz
  retry-wrong        practice questions answered wrong
  retry-flagged      practice flagged questions
  restart            discard the saved session and start over
  login NAME         sign in (enables the remote copy)
  logout             sign out
  quit";

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn parses_keywords_and_aliases() {
        assert_eq!(parse("check"), Command::Check);
        assert_eq!(parse("NEXT"), Command::Next);
        assert_eq!(parse("retry-wrong"), Command::RetryWrong);
        assert_eq!(parse("jump 3"), Command::Jump(3));
        assert_eq!(parse("login  alice "), Command::Login("alice".into()));
    }

    #[test]
    fn bare_letters_select_options() {
        assert_eq!(parse("b"), Command::Select(vec![OptionId::new("b")]));
        assert_eq!(
            parse("A d"),
            Command::Select(vec![OptionId::new("a"), OptionId::new("d")])
        );
        assert_eq!(
            parse("select a,c"),
            Command::Select(vec![OptionId::new("a"), OptionId::new("c")])
        );
    }

    #[test]
    fn single_letters_are_always_options() {
        assert_eq!(parse("c"), Command::Select(vec![OptionId::new("c")]));
        assert_eq!(parse("f"), Command::Select(vec![OptionId::new("f")]));
    }

    #[test]
    fn start_accepts_category_labels() {
        assert_eq!(parse("start"), Command::Start(None));
        assert_eq!(
            parse("start security and compliance"),
            Command::Start(Some(Some(Category::SecurityAndCompliance)))
        );
        assert_eq!(parse("start uncategorized"), Command::Start(Some(None)));
        assert!(Command::parse("start networking").is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
        assert!(Command::parse("jump 0").is_err());
        assert!(Command::parse("jump x").is_err());
        assert!(Command::parse("login").is_err());
    }
}
