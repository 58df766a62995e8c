//! Leveled log sinks.
//!
//! Middleware that needs to report something depends only on [`LogSink`]:
//! a `write(severity, message)` call plus one helper per syslog severity.
//! Two sinks ship with the crate:
//!
//! | Sink | Destination |
//! |---|---|
//! | [`TracingSink`] | the process's `tracing` subscriber |
//! | [`Syslog`] | a syslog daemon over TCP or UDP |

use std::fmt;
use std::io;

use tracing::{debug, error, info, warn};

mod syslog;

pub use syslog::{Facility, Network, Syslog, SyslogConfig};

/// Syslog severities, most severe first (RFC 5424 §6.2.1).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Severity {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Numeric code, `0` (emerg) through `7` (debug).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emerg   => "emerg",
            Self::Alert   => "alert",
            Self::Crit    => "crit",
            Self::Err     => "err",
            Self::Warning => "warning",
            Self::Notice  => "notice",
            Self::Info    => "info",
            Self::Debug   => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A destination for leveled, preformatted log messages.
///
/// Sinks are shared by every concurrent request that passes through the
/// middleware holding them, so implementations must be `Send + Sync`.
pub trait LogSink: Send + Sync {
    fn write(&self, severity: Severity, msg: &str) -> io::Result<()>;

    fn emerg(&self, msg: &str) -> io::Result<()> { self.write(Severity::Emerg, msg) }
    fn alert(&self, msg: &str) -> io::Result<()> { self.write(Severity::Alert, msg) }
    fn crit(&self, msg: &str) -> io::Result<()> { self.write(Severity::Crit, msg) }
    fn err(&self, msg: &str) -> io::Result<()> { self.write(Severity::Err, msg) }
    fn warning(&self, msg: &str) -> io::Result<()> { self.write(Severity::Warning, msg) }
    fn notice(&self, msg: &str) -> io::Result<()> { self.write(Severity::Notice, msg) }
    fn info(&self, msg: &str) -> io::Result<()> { self.write(Severity::Info, msg) }
    fn debug(&self, msg: &str) -> io::Result<()> { self.write(Severity::Debug, msg) }
}

/// Forwards messages to `tracing` under the `chainmux::access` target.
///
/// emerg through err map to `ERROR`, warning to `WARN`, notice and info to
/// `INFO`, debug to `DEBUG`. Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, severity: Severity, msg: &str) -> io::Result<()> {
        match severity {
            Severity::Emerg | Severity::Alert | Severity::Crit | Severity::Err => {
                error!(target: "chainmux::access", severity = %severity, "{msg}")
            }
            Severity::Warning => warn!(target: "chainmux::access", "{msg}"),
            Severity::Notice | Severity::Info => info!(target: "chainmux::access", severity = %severity, "{msg}"),
            Severity::Debug => debug!(target: "chainmux::access", "{msg}"),
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemorySink;
    use super::*;

    #[test]
    fn severity_codes_follow_syslog() {
        assert_eq!(Severity::Emerg.code(), 0);
        assert_eq!(Severity::Warning.code(), 4);
        assert_eq!(Severity::Debug.code(), 7);
        assert!(Severity::Err < Severity::Info);
    }

    #[test]
    fn helpers_route_through_write() {
        let sink = MemorySink::default();
        sink.warning("careful").unwrap();
        sink.debug("detail").unwrap();
        assert_eq!(
            sink.lines(),
            [(Severity::Warning, "careful".to_owned()), (Severity::Debug, "detail".to_owned())],
        );
    }

    #[test]
    fn tracing_sink_never_fails() {
        for severity in [Severity::Emerg, Severity::Warning, Severity::Info, Severity::Debug] {
            assert!(TracingSink.write(severity, "msg").is_ok());
        }
    }
}
