use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::GopherError;
use crate::item::Item;
use crate::types::{DEFAULT_PATH, DEFAULT_PORT, SEPARATOR};

const SELECTOR: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'?');

/// Coordinates of a resource: where to connect and what to ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub host: String,
    pub port: u16,
    pub item_type: Option<char>,
    pub selector: String,
    pub query: Option<String>,
}

impl Locator {
    /// Parses either a `gopher://` URL or a bare `host[:port][/selector]`.
    ///
    /// URLs follow RFC 4266: the first path character is the item type, the
    /// rest is the percent-encoded selector, optionally followed by `%09` and
    /// a search query. A missing selector becomes `/`.
    ///
    /// # Errors
    ///
    /// Returns [`GopherError::InvalidLocator`] for other schemes, a missing
    /// host, a bad port or a selector that is not valid UTF-8 once decoded.
    pub fn parse(input: &str) -> Result<Self, GopherError> {
        let input = input.trim();
        if input.contains("://") {
            Self::parse_url(input)
        } else {
            Self::parse_bare(input)
        }
    }

    fn parse_url(input: &str) -> Result<Self, GopherError> {
        let invalid = |reason: &str| GopherError::InvalidLocator(format!("{input}: {reason}"));

        let url = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "gopher" {
            return Err(invalid("scheme must be gopher"));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(invalid("missing host")),
        };

        // '?' belongs to the selector in gopher URLs
        let mut rest = url.path().to_string();
        if let Some(query) = url.query() {
            rest.push('?');
            rest.push_str(query);
        }
        let rest = rest.strip_prefix('/').unwrap_or(&rest);
        let decoded = percent_decode_str(rest)
            .decode_utf8()
            .map_err(|_| invalid("selector is not valid UTF-8"))?;

        let mut chars = decoded.chars();
        let item_type = chars.next();
        let (selector, query) = match chars.as_str().split_once(SEPARATOR) {
            Some((selector, query)) => (selector, Some(query.to_string())),
            None => (chars.as_str(), None),
        };

        Ok(Locator {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            item_type,
            selector: if selector.is_empty() { DEFAULT_PATH } else { selector }.to_string(),
            query,
        })
    }

    fn parse_bare(input: &str) -> Result<Self, GopherError> {
        let (authority, selector) = match input.find('/') {
            Some(pos) => (&input[..pos], &input[pos..]),
            None => (input, DEFAULT_PATH),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| {
                    GopherError::InvalidLocator(format!("{input}: bad port {port:?}"))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(GopherError::InvalidLocator(format!("{input}: missing host")));
        }

        Ok(Locator {
            host: host.to_string(),
            port,
            item_type: None,
            selector: selector.to_string(),
            query: None,
        })
    }

    pub fn to_url(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let mut url = format!("gopher://{}:{}/", host, self.port);
        if let Some(item_type) = self.item_type {
            url.push(item_type);
            url.extend(utf8_percent_encode(&self.selector, SELECTOR));
            if let Some(query) = &self.query {
                url.push_str("%09");
                url.extend(utf8_percent_encode(query, SELECTOR));
            }
        }
        url
    }
}

impl From<&Item> for Locator {
    fn from(item: &Item) -> Self {
        Locator {
            host: item.host.clone(),
            port: item.port,
            item_type: item.raw_type.chars().next(),
            selector: item.path.clone(),
            query: None,
        }
    }
}
