//! Short-lived relay sessions.
//!
//! A session moves through three states, each its own type:
//!
//! ```text
//!   open()            await_ready()
//! ─────────► Pending ─────────────► Live ──► close()
//!               │                     │
//!               └──── error ──────────┴──► transport released
//! ```
//!
//! Only [`LiveSession`] can push, so nothing is sent before the relay has
//! accepted the nickname. Every state owns a [`Connection`] whose [`Drop`]
//! shuts the socket down, so the transport is released on every exit path.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::protocol::{Command, Incoming};
use crate::error::{NotifierError, Result};

/// How many lines the handshake may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandshakeMode {
    /// The first line received decides the handshake.
    #[default]
    FirstLine,
    /// Skip notices and informational codes (answering `PING`) until a
    /// decisive status line arrives or the handshake timeout expires.
    UntilMatch,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub connect_timeout: Duration,
    /// Silence for this long while authenticating counts as acceptance.
    pub handshake_timeout: Duration,
    /// Pause between acceptance and the first push.
    pub settle_delay: Duration,
    pub handshake_mode: HandshakeMode,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(500),
            handshake_mode: HandshakeMode::FirstLine,
        }
    }
}

/// CRLF line framing over a TCP stream. Shuts the stream down on drop.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn new(stream: TcpStream) -> io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    fn send(&mut self, command: Command<'_>) -> io::Result<()> {
        let line = command.to_string();
        let line = line.trim();
        debug!("> {line}");
        write!(self.writer, "{line}\r\n")?;
        self.writer.flush()
    }

    /// Read one line, waiting at most until `deadline`. `None` on EOF.
    fn recv_until(&mut self, deadline: Instant) -> io::Result<Option<String>> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        self.reader.get_ref().set_read_timeout(Some(remaining))?;

        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf).trim_end().to_string();
        debug!("< {line}");
        Ok(Some(line))
    }

    fn close(&mut self) {
        // Already-closed sockets report NotConnected; nothing to do then.
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace line terminators and NUL with spaces.
fn flatten_line(line: &str) -> String {
    line.replace(['\r', '\n', '\0'], " ")
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Connect to `address` and announce `nickname`.
pub fn open(address: &str, nickname: &str, options: SessionOptions) -> Result<PendingSession> {
    info!(%address, %nickname, "connecting to relay");

    let connect_err = |source: io::Error| NotifierError::Connect {
        address: address.to_string(),
        source,
    };

    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing");
    let mut stream = None;
    for addr in address.to_socket_addrs().map_err(connect_err)? {
        match TcpStream::connect_timeout(&addr, options.connect_timeout) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) => last_err = e,
        }
    }
    let stream = stream.ok_or_else(|| connect_err(last_err))?;

    let mut conn = Connection::new(stream)?;
    conn.send(Command::Nick(nickname))?;
    conn.send(Command::User(nickname))?;

    Ok(PendingSession {
        conn,
        nickname: nickname.to_string(),
        options,
    })
}

/// Identity announced, waiting for the relay's verdict.
pub struct PendingSession {
    conn: Connection,
    nickname: String,
    options: SessionOptions,
}

impl PendingSession {
    /// Wait for the relay to accept the nickname, then settle.
    ///
    /// On failure the transport is closed before the error is returned.
    pub fn await_ready(mut self) -> Result<LiveSession> {
        if let Err(e) = self.handshake() {
            self.conn.close();
            return Err(e);
        }

        info!(nickname = %self.nickname, "relay accepted session");
        thread::sleep(self.options.settle_delay);
        Ok(LiveSession { conn: self.conn })
    }

    fn handshake(&mut self) -> Result<()> {
        let mode = self.options.handshake_mode;
        let deadline = Instant::now() + self.options.handshake_timeout;

        loop {
            let line = match self.conn.recv_until(deadline) {
                Ok(Some(line)) => line,
                Ok(None) => return Err(NotifierError::Disconnected),
                Err(e) if is_timeout(&e) => {
                    warn!(
                        timeout = ?self.options.handshake_timeout,
                        "no status line from relay, assuming accepted"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            match Incoming::parse(&line) {
                Incoming::Status(status) if status.is_rejection() => {
                    return Err(NotifierError::Protocol { code: status.code })
                }
                Incoming::Status(status) if status.target != self.nickname => {
                    return Err(NotifierError::CrossTalk {
                        expected: self.nickname.clone(),
                        got: status.target,
                    })
                }
                Incoming::Status(status) if !status.is_informational() => return Ok(()),
                Incoming::Status(status) if mode == HandshakeMode::FirstLine => {
                    return Err(NotifierError::Protocol { code: status.code })
                }
                Incoming::Ping(token) if mode == HandshakeMode::UntilMatch => {
                    self.conn.send(Command::Pong(&token))?;
                }
                _ if mode == HandshakeMode::FirstLine => {
                    return Err(NotifierError::UnexpectedLine(line))
                }
                _ => {}
            }
        }
    }
}

/// Accepted by the relay; lines may be pushed.
pub struct LiveSession {
    conn: Connection,
}

impl LiveSession {
    /// Send `line` to `destination` as a single message.
    ///
    /// Embedded CR, LF and NUL become spaces so the text cannot end the
    /// `PRIVMSG` early; edge whitespace is trimmed.
    pub fn push(&mut self, destination: &str, line: &str) -> Result<()> {
        let text = flatten_line(line);
        self.conn.send(Command::Privmsg {
            target: destination,
            text: text.trim(),
        })?;
        Ok(())
    }

    /// Say goodbye and release the transport.
    pub fn close(mut self) {
        if let Err(e) = self.conn.send(Command::Quit) {
            debug!(error = %e, "QUIT not delivered");
        }
        self.conn.close();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
