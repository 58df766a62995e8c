//! Syslog client sink.
//!
//! Speaks the line format most daemons (rsyslog, syslog-ng) accept on their
//! network inputs:
//!
//! ```text
//! <PRI>2026-10-18T09:30:00+02:00 hostname tag[pid]: message\n
//! ```
//!
//! where `PRI = facility * 8 + severity`.
//!
//! [`LogSink::write`] never touches the socket. It formats the line and
//! queues it for a background task that owns the connection, so a slow or
//! stuck daemon costs dropped lines, never a stalled request.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use chrono::{Local, SecondsFormat};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::{LogSink, Severity};
use crate::error::Error;

/// Transport used to reach the daemon.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Network {
    Tcp,
    Udp,
}

/// Syslog facilities (RFC 5424 §6.2.1).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    Authpriv,
    Ftp,
    Local0 = 16,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Where and how to reach the syslog daemon.
///
/// The default dials `localhost:514` over TCP with facility `local0`, tagging
/// lines with the executable name. Up to `queue` lines wait for the sender;
/// each dial and each send gives up after `timeout`.
#[derive(Clone, Debug)]
pub struct SyslogConfig {
    pub network: Network,
    pub addr: String,
    pub facility: Facility,
    pub tag: String,
    pub hostname: String,
    pub queue: usize,
    pub timeout: Duration,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            network: Network::Tcp,
            addr: "localhost:514".to_owned(),
            facility: Facility::Local0,
            tag: default_tag(),
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_owned()),
            queue: 1024,
            timeout: Duration::from_secs(5),
        }
    }
}

fn default_tag() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| std::path::Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

enum Conn {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Conn {
    async fn dial(network: Network, addr: &str, timeout: Duration) -> io::Result<Self> {
        let connect = async {
            match network {
                Network::Tcp => TcpStream::connect(addr).await.map(Self::Tcp),
                Network::Udp => {
                    let remote = tokio::net::lookup_host(addr).await?.next().ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidInput, format!("no address for `{addr}`"))
                    })?;
                    let local = if remote.is_ipv4() {
                        SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0)
                    } else {
                        SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0)
                    };
                    let socket = UdpSocket::bind(local).await?;
                    socket.connect(remote).await?;
                    Ok(Self::Udp(socket))
                }
            }
        };
        tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("syslog dial to `{addr}` timed out")))?
    }

    async fn send(&mut self, line: &[u8], timeout: Duration) -> io::Result<()> {
        let send = async {
            match self {
                Self::Tcp(stream) => stream.write_all(line).await,
                Self::Udp(socket) => socket.send(line).await.map(|_| ()),
            }
        };
        tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "syslog send timed out"))?
    }
}

enum Command {
    Line(String),
    Close,
}

/// Owns the connection on the background task.
struct Sender {
    network: Network,
    addr: String,
    timeout: Duration,
    conn: Option<Conn>,
}

impl Sender {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Close => self.conn = None,
                Command::Line(line) => {
                    if let Err(e) = self.send(line.as_bytes()).await {
                        warn!(addr = %self.addr, error = %e, "syslog line dropped");
                    }
                }
            }
        }
        debug!(addr = %self.addr, "syslog sender stopped");
    }

    /// Sends on the current connection. On failure, or with no connection,
    /// dials once and retries.
    async fn send(&mut self, line: &[u8]) -> io::Result<()> {
        if let Some(conn) = self.conn.as_mut() {
            match conn.send(line, self.timeout).await {
                Ok(()) => return Ok(()),
                Err(e) => debug!(addr = %self.addr, error = %e, "syslog send failed, redialing"),
            }
        }
        self.conn = None;

        let mut fresh = Conn::dial(self.network, &self.addr, self.timeout).await?;
        fresh.send(line, self.timeout).await?;
        self.conn = Some(fresh);
        Ok(())
    }
}

/// A [`LogSink`] writing to a syslog daemon.
///
/// Lines go through a bounded queue to a task that owns one connection.
/// A failed send reconnects once and retries; a line that still cannot be
/// sent is dropped with a warning. `write` fails only when the queue is
/// full or the task is gone.
pub struct Syslog {
    config: SyslogConfig,
    pid: u32,
    tx: mpsc::Sender<Command>,
}

impl Syslog {
    /// Connects to the daemon described by `config` and starts the sender
    /// task on the current tokio runtime.
    pub async fn dial(config: SyslogConfig) -> Result<Self, Error> {
        let conn = Conn::dial(config.network, &config.addr, config.timeout).await?;
        debug!(addr = %config.addr, network = ?config.network, "syslog connected");

        let (tx, rx) = mpsc::channel(config.queue.max(1));
        let sender = Sender {
            network: config.network,
            addr: config.addr.clone(),
            timeout: config.timeout,
            conn: Some(conn),
        };
        tokio::spawn(sender.run(rx));

        Ok(Self { config, pid: std::process::id(), tx })
    }

    pub fn config(&self) -> &SyslogConfig {
        &self.config
    }

    /// Drops the connection once the lines queued so far are sent. The next
    /// line dials again.
    pub fn close(&self) {
        if let Err(e) = self.tx.try_send(Command::Close) {
            debug!(error = %e, "syslog close not queued");
        }
    }

    fn line(&self, severity: Severity, msg: &str, timestamp: &str) -> String {
        let pri = u16::from(self.config.facility.code()) * 8 + u16::from(severity.code());
        let nl = if msg.ends_with('\n') { "" } else { "\n" };
        format!(
            "<{pri}>{timestamp} {} {}[{}]: {msg}{nl}",
            self.config.hostname, self.config.tag, self.pid,
        )
    }
}

impl LogSink for Syslog {
    fn write(&self, severity: Severity, msg: &str) -> io::Result<()> {
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = self.line(severity, msg, &timestamp);

        self.tx.try_send(Command::Line(line)).map_err(|e| match e {
            TrySendError::Full(_) => io::Error::new(io::ErrorKind::WouldBlock, "syslog queue full"),
            TrySendError::Closed(_) => io::Error::new(io::ErrorKind::BrokenPipe, "syslog sender stopped"),
        })
    }
}
