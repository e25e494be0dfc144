//! Delivery of notification lines to the relay network.
//!
//! [`session`] holds the handshake-then-push state machine and
//! [`protocol`] the wire format. [`Relay`] is the seam the orchestrator
//! delivers through, so runs can be tested without a network.

pub mod protocol;
pub mod session;

pub use session::{HandshakeMode, LiveSession, PendingSession, SessionOptions};

use tracing::info;

use crate::error::Result;

/// Delivers one batch of lines per run.
pub trait Relay {
    /// Push every line to every destination, destinations outermost.
    fn deliver(&self, destinations: &[String], lines: &[String]) -> Result<()>;
}

/// Delivers over a fresh IRC session per batch.
pub struct IrcRelay {
    pub address: String,
    pub nickname: String,
    pub options: SessionOptions,
}

impl IrcRelay {
    pub fn new(address: impl Into<String>, nickname: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            address: address.into(),
            nickname: nickname.into(),
            options,
        }
    }
}

impl Relay for IrcRelay {
    fn deliver(&self, destinations: &[String], lines: &[String]) -> Result<()> {
        let pending = session::open(&self.address, &self.nickname, self.options.clone())?;
        let mut live = pending.await_ready()?;

        // On a push error `live` is dropped, which releases the socket.
        for destination in destinations {
            for line in lines {
                live.push(destination, line)?;
            }
        }
        live.close();

        info!(
            lines = lines.len(),
            destinations = destinations.len(),
            "batch delivered"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn delivers_every_line_to_every_destination_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut received = Vec::new();
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                if line.starts_with("USER ") {
                    write!(writer, ":irc.test 002 asoi :Your host is irc.test\r\n").unwrap();
                }
                received.push(line);
            }
            received
        });

        let relay = IrcRelay::new(
            address,
            "asoi",
            SessionOptions {
                settle_delay: Duration::ZERO,
                handshake_timeout: Duration::from_secs(5),
                ..SessionOptions::default()
            },
        );
        let destinations = vec!["#ops".to_string(), "#aws".to_string()];
        let lines = vec!["ec2: B".to_string(), "ec2: A".to_string()];

        relay.deliver(&destinations, &lines).unwrap();

        let privmsgs: Vec<String> = server
            .join()
            .unwrap()
            .into_iter()
            .filter(|l| l.starts_with("PRIVMSG"))
            .collect();
        assert_eq!(
            privmsgs,
            vec![
                "PRIVMSG #ops :ec2: B",
                "PRIVMSG #ops :ec2: A",
                "PRIVMSG #aws :ec2: B",
                "PRIVMSG #aws :ec2: A",
            ]
        );
    }
}
