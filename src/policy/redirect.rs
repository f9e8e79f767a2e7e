//! Redirect resolution.
//!
//! ```text
//!   Initial ─► Executing ─┬─► Done
//!                  ▲      │ 3xx + Location, hops < max
//!                  └── Redirecting
//! ```
//!
//! Reaching `max_hops` is not an error: the last fetched response, still
//! carrying its `Location`, is handed back as-is.

use url::Url;

use crate::config::RedirectConfig;
use crate::error::Result;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::url::UrlDescriptor;

/// The next request to issue after a redirect.
#[derive(Debug, Clone)]
pub struct Hop {
    /// Absolute URL recorded in the redirect chain
    pub url: String,
    pub target: UrlDescriptor,
    pub request: Request,
}

/// Hop counter for one top-level call.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    follow: bool,
    max_hops: u32,
    hops: u32,
}

impl RedirectResolver {
    pub fn new(config: &RedirectConfig) -> Self {
        Self {
            follow: config.follow,
            max_hops: config.max_hops,
            hops: 0,
        }
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Returns the hop to follow after `response`, or `None` when the
    /// response is final.
    ///
    /// The new request is a GET to the resolved location carrying the
    /// previous request's headers; any body is dropped.
    pub fn next_hop(
        &mut self,
        request: &Request,
        target: &UrlDescriptor,
        response: &Response,
    ) -> Result<Option<Hop>> {
        if !self.follow || self.hops >= self.max_hops || !response.is_redirect() {
            return Ok(None);
        }

        let Some(location) = response.header("Location").map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(None);
        };

        let url = resolve_location(target, location)?;
        let next_target = UrlDescriptor::parse(&url)?;

        let next_request = Request {
            method: Method::GET,
            url: url.clone(),
            headers: request.headers.clone(),
            body: None,
        };

        self.hops += 1;

        Ok(Some(Hop {
            url,
            target: next_target,
            request: next_request,
        }))
    }
}

/// Resolves a `Location` value against the URL that produced it.
///
/// Absolute locations are used verbatim. Path-only locations keep the
/// current scheme and host, with the port written only when it is not the
/// scheme's default. Other relative references are joined per RFC 3986.
pub fn resolve_location(current: &UrlDescriptor, location: &str) -> Result<String> {
    if location.starts_with('/') && !location.starts_with("//") {
        return Ok(format!("{}{}", current.origin(), location));
    }

    match Url::parse(location) {
        Ok(_) => Ok(location.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(&current.to_string())?;
            Ok(base.join(location)?.to_string())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_only_location_keeps_non_default_port() {
        let current = UrlDescriptor::parse("http://example.com:8080/old").unwrap();
        assert_eq!(
            resolve_location(&current, "/new").unwrap(),
            "http://example.com:8080/new"
        );

        let current = UrlDescriptor::parse("https://example.com:443/old").unwrap();
        assert_eq!(resolve_location(&current, "/new").unwrap(), "https://example.com/new");
    }

    #[test]
    fn relative_location_is_joined() {
        let current = UrlDescriptor::parse("http://example.com/a/b").unwrap();
        assert_eq!(resolve_location(&current, "c").unwrap(), "http://example.com/a/c");
    }
}
