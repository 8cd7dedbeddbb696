//! Forwarding to an external interactive console
//!
//! A console process may listen on a local TCP address. When the facility
//! starts it tries to connect once; if that works every delivered line is
//! also sent there, one message per line:
//!
//! ```text
//! LOG <LEVEL> <file>:<line> <message>
//! SET <name>=<value>
//! ```
//!
//! `SET` messages update a watched variable in the console. Newlines inside a
//! message are escaped as `\n` so each message stays on one line.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::sink::LogRecord;

/// Connection to a listening console
#[derive(Debug)]
pub struct ExternalConsole {
    stream: TcpStream,
    peer: SocketAddr,
    broken: bool,
}

impl ExternalConsole {
    /// Try to reach a console at `address`
    ///
    /// Returns `None` if the address does not resolve or nothing accepts the
    /// connection within `timeout`.
    pub fn probe(address: &str, timeout: Duration) -> Option<Self> {
        let candidates = address.to_socket_addrs().ok()?;
        candidates.into_iter().find_map(|peer| {
            let stream = TcpStream::connect_timeout(&peer, timeout).ok()?;
            let _ = stream.set_nodelay(true);
            let _ = stream.set_write_timeout(Some(timeout));
            Some(Self { stream, peer, broken: false })
        })
    }

    /// Address of the connected console
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Whether a previous write failed and forwarding stopped
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Forward one delivered line
    pub fn send_record(&mut self, record: &LogRecord<'_>) {
        let message = format!(
            "LOG {} {}:{} {}\n",
            record.level.tag(),
            record.file,
            record.line,
            escape(record.message)
        );
        self.send(&message);
    }

    /// Update a watched variable
    pub fn send_variable(&mut self, name: &str, value: &str) {
        let message = format!("SET {}={}\n", escape(name), escape(value));
        self.send(&message);
    }

    /// Flush buffered output
    pub fn flush(&mut self) {
        if !self.broken && self.stream.flush().is_err() {
            self.broken = true;
        }
    }

    fn send(&mut self, message: &str) {
        if self.broken {
            return;
        }
        if self.stream.write_all(message.as_bytes()).is_err() {
            self.broken = true;
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n").replace('\r', "\\r")
}
