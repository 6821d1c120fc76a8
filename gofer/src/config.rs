//! Runtime configuration for gofer.
//!
//! All configuration arrives through CLI flags; this module validates the
//! flags into a typed [`Config`] before any writer starts. Crashes are most
//! likely to originate from this code, intentionally.

use std::time::Duration;

use http::Uri;

/// Upper bound on the writer count. Each writer holds one connection, so
/// this caps the process at a sane number of sockets.
pub const MAX_WRITERS: u16 = 1024;

/// Period between measurement sends on an established stream.
pub const WRITE_PERIOD: Duration = Duration::from_millis(10);

/// How long a closing writer waits for the peer to acknowledge the close
/// frame before giving up.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// How long a writer slot sits out after a failed or broken session before
/// its next auth+connect attempt.
pub const RESTART_COOL_DOWN: Duration = Duration::from_secs(1);

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The auth base URL did not parse.
    #[error("Failed to parse auth base URL: {0}")]
    AuthUrl(#[from] http::uri::InvalidUri),
    /// The auth base URL parsed but carries a scheme we cannot speak.
    #[error("Auth base URL scheme must be http or https, got {0:?}")]
    UnsupportedScheme(String),
    /// The requested writer count exceeds [`MAX_WRITERS`].
    #[error("Writer count {requested} exceeds the maximum of {maximum}")]
    TooManyWriters {
        /// Writer count asked for on the command line.
        requested: u16,
        /// The enforced bound, [`MAX_WRITERS`].
        maximum: u16,
    },
}

/// Validated configuration for a gofer run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the credential service.
    pub auth: Uri,
    /// Number of concurrent writer slots.
    pub writers: u16,
    /// Period between measurement sends, [`WRITE_PERIOD`] by default.
    pub write_period: Duration,
    /// Close-acknowledgement wait bound, [`CLOSE_TIMEOUT`] by default.
    pub close_timeout: Duration,
    /// Post-failure restart delay, [`RESTART_COOL_DOWN`] by default.
    pub cool_down: Duration,
}

impl Config {
    /// Validate CLI input into a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the auth base URL is malformed or non-HTTP, or
    /// if the writer count exceeds [`MAX_WRITERS`].
    pub fn new(auth: &str, writers: u16) -> Result<Self, Error> {
        let auth: Uri = auth.parse()?;
        match auth.scheme_str() {
            Some("http" | "https") => {}
            other => return Err(Error::UnsupportedScheme(other.unwrap_or("").to_string())),
        }
        if writers > MAX_WRITERS {
            return Err(Error::TooManyWriters {
                requested: writers,
                maximum: MAX_WRITERS,
            });
        }

        Ok(Self {
            auth,
            writers,
            write_period: WRITE_PERIOD,
            close_timeout: CLOSE_TIMEOUT,
            cool_down: RESTART_COOL_DOWN,
        })
    }
}
