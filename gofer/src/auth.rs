//! Client for the credential service.
//!
//! Writers do not hold long-lived credentials. Before every connection
//! attempt a writer asks the auth service for a fresh username, password and
//! intake endpoint; the credentials live exactly as long as that one
//! session. Transport failures here are ordinary recoverable errors handled
//! by the slot restart policy, they never take the process down.

use http::Uri;
use serde::Deserialize;

/// Errors produced by [`Client`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transport-level failure, or a non-success status from the service.
    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered but left a credential field empty.
    #[error("Auth response is missing {field}")]
    Incomplete {
        /// Name of the empty field.
        field: &'static str,
    },
}

/// Credentials for one writer session.
///
/// Obtained fresh on every session start, moved into the session that
/// fetched them and dropped when it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username for the Basic authorization header.
    pub username: String,
    /// Password for the Basic authorization header.
    pub password: String,
    /// Host and port of the metrics intake service.
    pub endpoint: String,
}

/// Wire shape of the auth response. Fields the service omits decode to the
/// empty string and are rejected in [`Client::fetch`].
#[derive(Debug, Deserialize)]
struct Wire {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    endpoint: String,
}

/// Client for the credential service.
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    url: String,
}

impl Client {
    /// Create a new [`Client`] against the given base URL.
    #[must_use]
    pub fn new(base: &Uri) -> Self {
        let url = format!("{}/auth", base.to_string().trim_end_matches('/'));
        Self {
            inner: reqwest::Client::new(),
            url,
        }
    }

    /// Fetch one set of credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the request cannot be sent or the service
    /// responds with a non-success status, `Error::Incomplete` if any
    /// credential field comes back empty.
    pub async fn fetch(&self) -> Result<Credentials, Error> {
        let response = self
            .inner
            .get(self.url.as_str())
            .send()
            .await?
            .error_for_status()?;
        let wire: Wire = response.json().await?;

        for (field, value) in [
            ("username", &wire.username),
            ("password", &wire.password),
            ("endpoint", &wire.endpoint),
        ] {
            if value.is_empty() {
                return Err(Error::Incomplete { field });
            }
        }

        Ok(Credentials {
            username: wire.username,
            password: wire.password,
            endpoint: wire.endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use warp::Filter;

    use super::{Client, Error};

    fn client_for(addr: std::net::SocketAddr) -> Client {
        let base = format!("http://{addr}")
            .parse()
            .expect("failed to build base URL");
        Client::new(&base)
    }

    #[tokio::test]
    async fn fetch_returns_complete_credentials() {
        let route = warp::path("auth").map(|| {
            warp::reply::json(&serde_json::json!({
                "username": "scout",
                "password": "hunter2",
                "endpoint": "127.0.0.1:9000",
            }))
        });
        let (addr, serve_fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        let _server = tokio::spawn(serve_fut);

        let creds = client_for(addr).fetch().await.expect("fetch failed");
        assert_eq!(creds.username, "scout");
        assert_eq!(creds.password, "hunter2");
        assert_eq!(creds.endpoint, "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn missing_fields_are_an_auth_failure() {
        let route = warp::path("auth").map(|| {
            warp::reply::json(&serde_json::json!({
                "username": "scout",
                "endpoint": "127.0.0.1:9000",
            }))
        });
        let (addr, serve_fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        let _server = tokio::spawn(serve_fut);

        let res = client_for(addr).fetch().await;
        assert!(matches!(res, Err(Error::Incomplete { field: "password" })));
    }

    #[tokio::test]
    async fn transport_failure_is_a_recoverable_error() {
        // Reserve a port, then drop the listener so nothing answers there.
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind throwaway port");
        let addr = listener.local_addr().expect("listener has no address");
        drop(listener);

        let res = client_for(addr).fetch().await;
        assert!(matches!(res, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn server_error_statuses_are_rejected() {
        let route = warp::path("auth").map(|| {
            warp::reply::with_status(
                "credential backend unavailable",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
        });
        let (addr, serve_fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        let _server = tokio::spawn(serve_fut);

        let res = client_for(addr).fetch().await;
        assert!(matches!(res, Err(Error::Http(_))));
    }
}
