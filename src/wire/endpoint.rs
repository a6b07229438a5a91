use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

const TCP_SCHEME: &str = "tcp://";
const WILDCARD_HOST: &str = "*";
const ALL_INTERFACES: &str = "0.0.0.0";

/// Endpoint is a messaging address of the form `tcp://host:port`.
///
/// A host of `*` means "all interfaces" when binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("'{0}' does not start with tcp://")]
    UnsupportedScheme(String),
    #[error("'{0}' is missing a port")]
    MissingPort(String),
    #[error("'{0}' has an invalid port")]
    InvalidPort(String),
    #[error("'{0}' is missing a host")]
    MissingHost(String),
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    /// Host in a form the socket APIs accept. IPv6 brackets are stripped.
    pub fn host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(self.host.as_str())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn bind_host(&self) -> &str {
        if self.host == WILDCARD_HOST {
            ALL_INTERFACES
        } else {
            self.host()
        }
    }

    /// The endpoint peers should dial once this one is bound at `addr`. A wildcard bind is
    /// reported as loopback, the one address known to reach it.
    pub(crate) fn bound_at(&self, addr: SocketAddr) -> Self {
        let host = match addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => Ipv4Addr::LOCALHOST.to_string(),
            IpAddr::V6(ip) if ip.is_unspecified() => format!("[{}]", Ipv6Addr::LOCALHOST),
            _ => self.host.clone(),
        };
        Endpoint::new(host, addr.port())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let host_port = s
            .strip_prefix(TCP_SCHEME)
            .ok_or_else(|| EndpointError::UnsupportedScheme(s.to_string()))?;
        let (host, port) = host_port
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;

        if host.is_empty() {
            return Err(EndpointError::MissingHost(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointError::InvalidPort(s.to_string()))?;

        Ok(Endpoint::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", TCP_SCHEME, self.host, self.port)
    }
}
