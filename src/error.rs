//! Unified error type.

use std::fmt;

/// The error type returned by chainmux's fallible operations.
///
/// Application-level failures (404, 405, 422, etc.) are expressed as HTTP
/// responses written through a [`ResponseWriter`](crate::ResponseWriter),
/// not as `Error`s. This type surfaces setup and infrastructure failures:
/// a route without a handler, binding to a port, dialing a log sink, or
/// running out of entropy.
#[derive(Debug)]
pub enum Error {
    /// [`Router::build`](crate::Router::build) found a route with no terminal handler.
    MissingHandler { route: String },
    /// The bind address could not be parsed.
    Addr(std::net::AddrParseError),
    /// Socket-level failure: bind, accept, or a log sink connection.
    Io(std::io::Error),
    /// The operating system random source failed.
    Entropy(rand::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHandler { route } => write!(f, "no handler specified for route `{route}`"),
            Self::Addr(e)    => write!(f, "invalid address: {e}"),
            Self::Io(e)      => write!(f, "io: {e}"),
            Self::Entropy(e) => write!(f, "entropy: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingHandler { .. } => None,
            Self::Addr(e)    => Some(e),
            Self::Io(e)      => Some(e),
            Self::Entropy(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<std::net::AddrParseError> for Error {
    fn from(e: std::net::AddrParseError) -> Self {
        Self::Addr(e)
    }
}

impl From<rand::Error> for Error {
    fn from(e: rand::Error) -> Self {
        Self::Entropy(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_handler_names_the_route() {
        let err = Error::MissingHandler { route: "/orders".to_owned() };
        assert_eq!(err.to_string(), "no handler specified for route `/orders`");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
