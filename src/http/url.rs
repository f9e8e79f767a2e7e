//! Request target resolution.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Port used when the URL does not name one.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// A resolved request target: everything needed to open a connection and
/// write the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlDescriptor {
    scheme: Scheme,
    host: String,
    port: u16,
    path: String,
}

impl UrlDescriptor {
    /// Parses an absolute `http` or `https` URL.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpline::http::url::UrlDescriptor;
    /// let url = UrlDescriptor::parse("https://example.com/search?q=rust").unwrap();
    /// assert_eq!(url.host(), "example.com");
    /// assert_eq!(url.port(), 443);
    /// assert_eq!(url.path(), "/search?q=rust");
    /// assert!(url.is_tls());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(Error::MalformedUrl(format!("unsupported scheme `{other}`"))),
        };

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(Error::MalformedUrl(format!("missing host in `{raw}`"))),
        };

        let port = url.port().unwrap_or(scheme.default_port());

        let mut path = url.path().to_string();
        if path.is_empty() {
            path.push('/');
        }
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host as written in the URL (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host suitable for name resolution and TLS server names.
    pub fn connect_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path plus query, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == Scheme::Https
    }

    pub fn is_default_port(&self) -> bool {
        self.port == self.scheme.default_port()
    }

    /// `host[:port]`, with the port only when it differs from the scheme's.
    pub fn authority(&self) -> String {
        if self.is_default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme.as_str(), self.authority())
    }
}

impl fmt::Display for UrlDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.path)
    }
}
