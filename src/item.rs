use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::encoding::Encoding;
use crate::error::GopherError;
use crate::gopher::{Gopher, Response};
use crate::locator::Locator;
use crate::types::{self, DEFAULT_PORT, INFO_TYPE, MESSAGE_SEPARATOR, SEPARATOR, TERMINATOR};

/// One entry of a directory listing.
///
/// Items are produced by [`Item::parse`]. An item does not hold on to the
/// client that fetched it; pass a client back in to [`Item::follow`] it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Protocol type code. Empty for the raw-payload sentinel.
    pub raw_type: String,
    pub pretty_type: String,
    pub desc: String,
    pub path: String,
    pub host: String,
    pub port: u16,
}

impl Item {
    /// Parses a single line of a response, without its line terminator.
    ///
    /// Returns `Ok(None)` for empty lines and the `.` terminator. A line that
    /// does not decode, or that has fewer than four tab-separated fields after
    /// the type code, yields the raw sentinel (see [`Item::is_raw`]).
    ///
    /// # Errors
    ///
    /// Returns [`GopherError::InvalidPort`] when the port field is not a
    /// valid port number.
    pub fn parse(encoding: Encoding, raw: &[u8]) -> Result<Option<Item>, GopherError> {
        if raw.is_empty() || raw == TERMINATOR {
            return Ok(None);
        }

        let Some(line) = encoding.decode(raw) else {
            return Ok(Some(Item::raw_sentinel()));
        };

        let mut chars = line.chars();
        let Some(code) = chars.next() else {
            return Ok(Some(Item::raw_sentinel()));
        };
        let parts: Vec<&str> = chars.as_str().split(SEPARATOR).collect();
        if parts.len() < 4 {
            return Ok(Some(Item::raw_sentinel()));
        }

        let port = parts[3]
            .trim()
            .parse()
            .map_err(|source| GopherError::InvalidPort {
                value: parts[3].to_string(),
                source,
            })?;

        let raw_type = code.to_string();
        Ok(Some(Item {
            pretty_type: types::pretty_type(&raw_type).to_string(),
            raw_type,
            desc: parts[0].to_string(),
            path: parts[1].to_string(),
            host: parts[2].to_string(),
            port,
        }))
    }

    fn raw_sentinel() -> Self {
        Item {
            raw_type: String::new(),
            pretty_type: types::pretty_type("").to_string(),
            desc: String::new(),
            path: String::new(),
            host: String::new(),
            port: DEFAULT_PORT,
        }
    }

    /// True for the sentinel marking a line that is not a directory entry.
    pub fn is_raw(&self) -> bool {
        self.raw_type.is_empty()
    }

    pub fn is_info(&self) -> bool {
        self.raw_type == INFO_TYPE
    }

    /// Appends the description of another informational line to this one.
    ///
    /// # Errors
    ///
    /// Returns [`GopherError::TypeMismatch`] unless both items are
    /// informational. The error carries `other`'s label as the type found
    /// and this item's label as the type expected.
    pub fn merge_messages(&mut self, other: Item) -> Result<(), GopherError> {
        if !self.is_info() || !other.is_info() {
            return Err(GopherError::TypeMismatch {
                got: other.pretty_type,
                expected: self.pretty_type.clone(),
            });
        }

        trace!(desc = %other.desc, "Merging informational line");
        self.desc.push_str(MESSAGE_SEPARATOR);
        self.desc.push_str(&other.desc);
        Ok(())
    }

    /// Requests the resource this item points to, using `client`'s settings.
    ///
    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn follow(&self, client: &Gopher) -> Result<Response, GopherError> {
        client.follow(self)
    }

    /// Submits `query` to the search server this item points to.
    ///
    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn search(&self, client: &Gopher, query: &str) -> Result<Response, GopherError> {
        client.search(self, query)
    }

    pub fn to_url(&self) -> String {
        Locator::from(self).to_url()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_info() {
            f.write_str(&self.desc)
        } else if self.is_raw() {
            write!(f, "File {} on {}:{}", self.path, self.host, self.port)
        } else {
            write!(
                f,
                "{} ({}) - {} on {}:{}",
                self.desc, self.pretty_type, self.path, self.host, self.port
            )
        }
    }
}
