//! The slice of the IRC wire format the relay speaks.
//!
//! Outgoing lines are rendered by [`Command`]; incoming lines are classified
//! by [`Incoming::parse`]. Framing (CRLF) is handled by the session.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// RFC 1459 `ERR_NONICKNAMEGIVEN`.
pub const ERR_NO_NICKNAME_GIVEN: u16 = 431;
/// RFC 1459 `ERR_ERRONEUSNICKNAME`.
pub const ERR_ERRONEUS_NICKNAME: u16 = 432;
/// RFC 1459 `ERR_NICKNAMEINUSE`.
pub const ERR_NICKNAME_IN_USE: u16 = 433;
/// RFC 1459 `ERR_NICKCOLLISION`.
pub const ERR_NICK_COLLISION: u16 = 436;

/// Codes at or below this are informational and never complete a handshake.
pub const INFORMATIONAL_MAX: u16 = 1;

static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:[^ ]+ ([0-9]{2,4}) ([^ ]+) (.*)").expect("status line pattern is valid")
});

/// `:<server> <code> <target> <text>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub target: String,
    pub text: String,
}

impl StatusLine {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = STATUS_LINE.captures(line.trim_end_matches(['\r', '\n']))?;
        Some(Self {
            // At most four digits, always fits.
            code: caps[1].parse().ok()?,
            target: caps[2].to_string(),
            text: caps[3].to_string(),
        })
    }

    /// Nickname rejection codes that fail the handshake.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.code,
            ERR_NO_NICKNAME_GIVEN | ERR_ERRONEUS_NICKNAME | ERR_NICKNAME_IN_USE | ERR_NICK_COLLISION
        )
    }

    pub fn is_informational(&self) -> bool {
        self.code <= INFORMATIONAL_MAX
    }
}

/// A line received from the relay, classified for the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Status(StatusLine),
    Ping(String),
    Other(String),
}

impl Incoming {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(status) = StatusLine::parse(line) {
            return Incoming::Status(status);
        }
        match line.strip_prefix("PING ") {
            Some(token) => Incoming::Ping(token.to_string()),
            None => Incoming::Other(line.to_string()),
        }
    }
}

/// Commands the relay sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Nick(&'a str),
    /// `USER` registration; the nickname doubles as user and real name.
    User(&'a str),
    Privmsg { target: &'a str, text: &'a str },
    Pong(&'a str),
    Quit,
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Nick(nick) => write!(f, "NICK {nick}"),
            Command::User(nick) => write!(f, "USER {nick} localhost 127.0.0.1 :{nick}"),
            Command::Privmsg { target, text } => write!(f, "PRIVMSG {target} :{text}"),
            Command::Pong(token) => write!(f, "PONG {token}"),
            Command::Quit => write!(f, "QUIT"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
