//! Proxy descriptor normalization.
//!
//! Accepted shapes, tried in order (scheme optional unless noted):
//!
//! | shape | example |
//! |---|---|
//! | `host:port` | `1.2.3.4:8080` |
//! | `scheme://host:port` | `socks5://1.2.3.4:1080` |
//! | `user:pass@host:port` | `u:p@1.2.3.4:8080` |
//! | `user:pass:host:port` | `u:p:1.2.3.4:8080` |
//! | `host:port@user:pass` | `1.2.3.4:8080@u:p` |
//! | `host:port:user:pass` | `1.2.3.4:8080:u:p` |
//!
//! When both orders are possible, a purely numeric second token marks the
//! leading pair as `host:port`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ProxyError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks4 => "socks4",
            Self::Socks5 => "socks5",
        }
    }
}

impl FromStr for ProxyScheme {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "socks4" => Ok(Self::Socks4),
            "socks5" => Ok(Self::Socks5),
            other => Err(ProxyError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A normalized proxy endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

impl ProxyEndpoint {
    /// Canonical URL without the password, for logs.
    pub fn redacted(&self) -> String {
        match &self.credentials {
            Some(c) => format!(
                "{}://{}:***@{}:{}",
                self.scheme.as_str(),
                c.username,
                self.host,
                self.port
            ),
            None => format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port),
        }
    }
}

/// Canonical `scheme://[user:pass@]host:port` form.
impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme.as_str())?;
        if let Some(c) = &self.credentials {
            write!(f, "{}:{}@", c.username, c.password)?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ProxyEndpoint {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_proxy(s)
    }
}

fn is_port(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_token(token: &str) -> bool {
    !token.is_empty() && !token.contains([':', '@']) && !token.contains(char::is_whitespace)
}

/// Split `a:b` into exactly two non-empty tokens.
fn pair(part: &str) -> Option<(&str, &str)> {
    let (a, b) = part.split_once(':')?;
    (is_token(a) && is_token(b)).then_some((a, b))
}

/// Parse any accepted proxy shape into a [`ProxyEndpoint`].
pub fn parse_proxy(input: &str) -> Result<ProxyEndpoint, ProxyError> {
    let raw = input.trim();
    let invalid = || ProxyError::InvalidFormat(raw.to_string());

    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme.parse::<ProxyScheme>()?, rest),
        None => (ProxyScheme::Http, raw),
    };

    // (host, port, user, pass)
    let (host, port, creds) = if let Some((left, right)) = rest.split_once('@') {
        let (l0, l1) = pair(left).ok_or_else(invalid)?;
        let (r0, r1) = pair(right).ok_or_else(invalid)?;
        if is_port(r1) && !is_port(l1) {
            (r0, r1, Some((l0, l1)))
        } else if is_port(l1) {
            (l0, l1, Some((r0, r1)))
        } else {
            return Err(invalid());
        }
    } else {
        let parts: Vec<&str> = rest.split(':').collect();
        if !parts.iter().all(|p| is_token(p)) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [host, port] if is_port(port) => (*host, *port, None),
            [host, port, user, pass] if is_port(port) => (*host, *port, Some((*user, *pass))),
            [user, pass, host, port] if is_port(port) => (*host, *port, Some((*user, *pass))),
            _ => return Err(invalid()),
        }
    };

    let port: u16 = port
        .parse()
        .map_err(|_| ProxyError::InvalidPort(port.to_string()))?;
    if port == 0 {
        return Err(ProxyError::InvalidPort("0".into()));
    }

    Ok(ProxyEndpoint {
        scheme,
        host: host.to_string(),
        port,
        credentials: creds.map(|(u, p)| ProxyCredentials {
            username: u.to_string(),
            password: p.to_string(),
        }),
    })
}
