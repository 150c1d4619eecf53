//! Remote-control command tokens.
//!
//! Tokens are sent one per line over the command stream to the device's
//! input handler at port 2048.

use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// Fixed-vocabulary tokens without parameters
pub const SIMPLE_TOKENS: &[&str] = &[
    "MENU", "MENU_LONG", "UP", "DOWN", "LEFT", "RIGHT", "BACK", "ENTER", "STOP", "PLAY",
    "INFO", "PREV", "NEXT", "RW", "FF", "VOLUP", "VOLDOWN", "CLEAR",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Menu,
    /// Long press on menu; opens the context menu
    MenuLong,
    Up,
    Down,
    Left,
    Right,
    Back,
    Enter,
    Stop,
    Play,
    Info,
    Prev,
    Next,
    Rewind,
    FastForward,
    VolumeUp,
    VolumeDown,
    /// Delete the last typed character
    Clear,
    /// One keyboard character
    Key(char),
    /// Open a stream URL
    Url(String),
    /// Queue a URL for download
    Download(String),
}

impl Command {
    /// Keyboard command for `c`. Only printable ASCII is accepted; letters
    /// are sent upper-case.
    pub fn key(c: char) -> Result<Self, CommandError> {
        if c == '\n' || c == '\r' {
            return Err(CommandError::LineBreak);
        }
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(CommandError::InvalidKey(c.to_string()));
        }
        Ok(Command::Key(c.to_ascii_uppercase()))
    }

    pub fn url(url: &str) -> Result<Self, CommandError> {
        Ok(Command::Url(checked_payload("URL", url)?))
    }

    pub fn download(url: &str) -> Result<Self, CommandError> {
        Ok(Command::Download(checked_payload("DOWNLOAD", url)?))
    }

    /// Key presses for every character of `text`.
    pub fn typing(text: &str) -> Result<Vec<Self>, CommandError> {
        text.chars().map(Command::key).collect()
    }

    /// Wire token, without the trailing newline.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

fn checked_payload(kind: &'static str, payload: &str) -> Result<String, CommandError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(CommandError::MissingPayload(kind));
    }
    if payload.contains(['\n', '\r']) {
        return Err(CommandError::LineBreak);
    }
    Ok(payload.to_string())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Menu => f.write_str("MENU"),
            Command::MenuLong => f.write_str("MENU_LONG"),
            Command::Up => f.write_str("UP"),
            Command::Down => f.write_str("DOWN"),
            Command::Left => f.write_str("LEFT"),
            Command::Right => f.write_str("RIGHT"),
            Command::Back => f.write_str("BACK"),
            Command::Enter => f.write_str("ENTER"),
            Command::Stop => f.write_str("STOP"),
            Command::Play => f.write_str("PLAY"),
            Command::Info => f.write_str("INFO"),
            Command::Prev => f.write_str("PREV"),
            Command::Next => f.write_str("NEXT"),
            Command::Rewind => f.write_str("RW"),
            Command::FastForward => f.write_str("FF"),
            Command::VolumeUp => f.write_str("VOLUP"),
            Command::VolumeDown => f.write_str("VOLDOWN"),
            Command::Clear => f.write_str("CLEAR"),
            Command::Key(c) => write!(f, "KEY:{}", c),
            Command::Url(url) => write!(f, "URL:{}", url),
            Command::Download(url) => write!(f, "DOWNLOAD:{}", url),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse a wire token. Plain tokens are case-insensitive; `KEY:` keeps
    /// its character (a space is a valid key).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(['\n', '\r']) {
            return Err(CommandError::LineBreak);
        }
        if s.trim().is_empty() {
            return Err(CommandError::Empty);
        }

        if let Some(rest) = strip_prefix_ignore_case(s, "KEY:") {
            let mut chars = rest.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Command::key(c),
                _ => Err(CommandError::InvalidKey(rest.to_string())),
            };
        }
        if let Some(rest) = strip_prefix_ignore_case(s, "URL:") {
            return Command::url(rest);
        }
        if let Some(rest) = strip_prefix_ignore_case(s, "DOWNLOAD:") {
            return Command::download(rest);
        }

        let command = match s.trim().to_ascii_uppercase().as_str() {
            "MENU" => Command::Menu,
            "MENU_LONG" => Command::MenuLong,
            "UP" => Command::Up,
            "DOWN" => Command::Down,
            "LEFT" => Command::Left,
            "RIGHT" => Command::Right,
            "BACK" => Command::Back,
            "ENTER" => Command::Enter,
            "STOP" => Command::Stop,
            "PLAY" => Command::Play,
            "INFO" => Command::Info,
            "PREV" => Command::Prev,
            "NEXT" => Command::Next,
            "RW" => Command::Rewind,
            "FF" => Command::FastForward,
            "VOLUP" => Command::VolumeUp,
            "VOLDOWN" => Command::VolumeDown,
            "CLEAR" => Command::Clear,
            _ => return Err(CommandError::Unknown(s.to_string())),
        };
        Ok(command)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
