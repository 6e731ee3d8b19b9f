//! Transport selection from URLs.
//!
//! Only `tcp://host:port` is supported. The host defaults to `localhost` and
//! the port to 9933.

use std::fmt;

use crate::config::{ProtocolConfig, DEFAULT_PORT};
use crate::error::{ProtocolError, Result};
use crate::transport::tcp::{TcpAcceptor, TcpTransport};

pub const DEFAULT_HOST: &str = "localhost";

/// Host and port parsed from a `tcp://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpEndpoint {
    pub host: String,
    pub port: u16,
}

impl TcpEndpoint {
    /// Parses `scheme://host:port[/path]`.
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ProtocolError::InvalidAddress(format!("missing scheme in '{url}'")))?;
        if !scheme.eq_ignore_ascii_case("tcp") {
            return Err(ProtocolError::UnsupportedScheme(scheme.to_ascii_lowercase()));
        }

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let (host, port) = split_host_port(authority)
            .ok_or_else(|| ProtocolError::InvalidAddress(format!("malformed authority in '{url}'")))?;

        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let port = match port {
            None | Some("") => DEFAULT_PORT,
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| ProtocolError::InvalidAddress(format!("invalid port '{p}' in '{url}'")))?,
        };

        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}

/// Splits `host[:port]`, keeping IPv6 literals in brackets intact.
fn split_host_port(authority: &str) -> Option<(&str, Option<&str>)> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        return match after {
            "" => Some((host, None)),
            _ => Some((host, Some(after.strip_prefix(':')?))),
        };
    }
    match authority.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => None,
        Some((host, port)) => Some((host, Some(port))),
        None => Some((authority, None)),
    }
}

impl fmt::Display for TcpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A closed client transport for `url`. Call `open` to connect.
pub fn client_from_url(url: &str) -> Result<TcpTransport> {
    let endpoint = TcpEndpoint::parse(url)?;
    let mut config = ProtocolConfig::default();
    config.client.address = endpoint.to_string();
    Ok(TcpTransport::from_config(&config))
}

/// A bound acceptor for `url`.
pub async fn server_from_url(url: &str) -> Result<TcpAcceptor> {
    let endpoint = TcpEndpoint::parse(url)?;
    TcpAcceptor::bind(&endpoint.to_string()).await
}
