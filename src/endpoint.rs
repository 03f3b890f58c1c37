use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_BACKDOOR_PORT: u16 = 5557;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("endpoint {0:?} must have the form <host>:<port>")]
    MissingPort(String),

    #[error("host {0:?} must be localhost or an IP address")]
    InvalidHost(String),

    #[error("port {0:?} must be a decimal number between 0 and 65535")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    Localhost,
    Ip(IpAddr),
}

/// Address of a memory backdoor service: `localhost:<port>` or `<ip>:<port>`.
///
/// IPv6 hosts are written in brackets, e.g. `[::1]:5557`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub host: Host,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: Host::Localhost,
            port: DEFAULT_BACKDOOR_PORT,
        }
    }
}

impl Endpoint {
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = match self.host {
            Host::Localhost => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Host::Ip(ip) => ip,
        };
        SocketAddr::new(ip, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;

        let host = if host.eq_ignore_ascii_case("localhost") {
            Host::Localhost
        } else {
            let literal = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            let ip: IpAddr = literal
                .parse()
                .map_err(|_| EndpointError::InvalidHost(host.to_string()))?;
            // Bare IPv6 would make the port separator ambiguous.
            if ip.is_ipv6() && literal.len() == host.len() {
                return Err(EndpointError::InvalidHost(host.to_string()));
            }
            Host::Ip(ip)
        };

        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EndpointError::InvalidPort(port.to_string()));
        }
        let port = port
            .parse()
            .map_err(|_| EndpointError::InvalidPort(port.to_string()))?;

        Ok(Self { host, port })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Host::Localhost => write!(f, "localhost:{}", self.port),
            Host::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]:{}", self.port),
            Host::Ip(ip) => write!(f, "{ip}:{}", self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        assert_eq!(Endpoint::default().to_string(), "localhost:5557");
    }

    #[test]
    fn test_parse_localhost_and_ipv4() {
        let ep: Endpoint = "localhost:5557".parse().unwrap();
        assert_eq!(ep, Endpoint::default());
        assert_eq!(
            ep.socket_addr(),
            "127.0.0.1:5557".parse::<SocketAddr>().unwrap()
        );

        let ep: Endpoint = "10.0.0.7:80".parse().unwrap();
        assert_eq!(ep.host, Host::Ip("10.0.0.7".parse().unwrap()));
        assert_eq!(ep.port, 80);
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let ep: Endpoint = "[::1]:9000".parse().unwrap();
        assert_eq!(ep.to_string(), "[::1]:9000");
        assert_eq!(
            "::1:9000".parse::<Endpoint>(),
            Err(EndpointError::InvalidHost("::1".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_descriptors() {
        assert_eq!(
            "localhost".parse::<Endpoint>(),
            Err(EndpointError::MissingPort("localhost".to_string()))
        );
        assert_eq!(
            "example.com:80".parse::<Endpoint>(),
            Err(EndpointError::InvalidHost("example.com".to_string()))
        );
        assert_eq!(
            "localhost:http".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort("http".to_string()))
        );
        assert_eq!(
            "localhost:+80".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort("+80".to_string()))
        );
        assert_eq!(
            "localhost:70000".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort("70000".to_string()))
        );
        assert_eq!(
            "localhost:".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort(String::new()))
        );
    }
}
