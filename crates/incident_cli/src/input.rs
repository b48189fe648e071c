//! Console input parsing.
//!
//! Every stdin line is chat text from the current user in the current
//! channel, except lines starting with `/`, which control the console:
//!
//! ```text
//! /as <name>        speak as another user
//! /join <channel>   move to a named channel
//! /dm <id>          move to a private chat
//! /quit             stop the console
//! ```

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("Unknown console directive: /{0}")]
    UnknownDirective(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Chat(String),
    SwitchUser(String),
    Join(String),
    DirectMessage(String),
    Quit,
    Blank,
}

pub fn parse_line(line: &str) -> Result<ConsoleLine, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleLine::Blank);
    }

    let Some(directive) = line.strip_prefix('/') else {
        return Ok(ConsoleLine::Chat(line.to_string()));
    };
    let (name, argument) = match directive.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (directive, ""),
    };

    let required = |key: &'static str| {
        if argument.is_empty() {
            Err(InputError::MissingArgument(key))
        } else {
            Ok(argument.to_string())
        }
    };

    match name {
        "as" => required("as").map(ConsoleLine::SwitchUser),
        "join" => {
            required("join").map(|c| ConsoleLine::Join(c.trim_start_matches('#').to_string()))
        }
        "dm" => required("dm").map(ConsoleLine::DirectMessage),
        "quit" | "exit" => Ok(ConsoleLine::Quit),
        other => Err(InputError::UnknownDirective(other.to_string())),
    }
}
