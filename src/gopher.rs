use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::encoding::Encoding;
use crate::error::GopherError;
use crate::item::Item;
use crate::locator::Locator;
use crate::types::{DEFAULT_PATH, DEFAULT_PORT, DEFAULT_TIMEOUT, EOL, SEPARATOR};

/// What a server sent back: a parsed directory listing, or the bytes as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    DirectoryListing(Vec<Item>),
    RawPayload(Vec<u8>),
}

impl Response {
    pub fn items(&self) -> Option<&[Item]> {
        match self {
            Response::DirectoryListing(items) => Some(items),
            Response::RawPayload(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Response::DirectoryListing(_) => None,
            Response::RawPayload(bytes) => Some(bytes),
        }
    }
}

/// Blocking Gopher client.
///
/// Settings are fixed at construction. Every request opens its own
/// connection, so a client can be shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gopher {
    timeout: Duration,
    encoding: Encoding,
    max_response_size: Option<u64>,
}

impl Default for Gopher {
    fn default() -> Self {
        Gopher::new(DEFAULT_TIMEOUT, Encoding::default())
    }
}

impl Gopher {
    pub fn new(timeout: Duration, encoding: Encoding) -> Self {
        Gopher {
            timeout,
            encoding,
            max_response_size: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Gopher {
            timeout: config.timeout(),
            encoding: config.encoding,
            max_response_size: config.max_response_size,
        }
    }

    /// Fails requests whose response grows past `limit` bytes.
    pub fn with_max_response_size(mut self, limit: u64) -> Self {
        self.max_response_size = Some(limit);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn max_response_size(&self) -> Option<u64> {
        self.max_response_size
    }

    fn prepare_payload(&self, path: &str, query: &str) -> Result<Vec<u8>, GopherError> {
        let mut selector = path.to_string();
        if !query.is_empty() {
            selector.push(SEPARATOR);
            selector.push_str(query);
        }

        let mut payload = self.encoding.encode(&selector)?;
        payload.extend_from_slice(EOL);
        Ok(payload)
    }

    fn send_raw(&self, host: &str, port: u16, payload: &[u8]) -> Result<Vec<u8>, GopherError> {
        let addrs = (host, port).to_socket_addrs().map_err(GopherError::from_io)?;

        let mut last_err = None;
        for addr in addrs {
            debug!(host = %host, addr = %addr, "Connecting");
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return self.exchange(stream, payload),
                Err(e) => {
                    debug!(addr = %addr, error = %e, "Connect failed");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => GopherError::from_io(e),
            None => GopherError::Resolve {
                host: host.to_string(),
            },
        })
    }

    /// Sends the payload and reads until the server closes the connection.
    /// The stream is dropped, and the socket closed, on every return path.
    fn exchange(&self, mut stream: TcpStream, payload: &[u8]) -> Result<Vec<u8>, GopherError> {
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(GopherError::from_io)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(GopherError::from_io)?;

        stream.write_all(payload).map_err(GopherError::from_io)?;
        debug!(bytes = payload.len(), "Sent selector");

        let mut buffer = Vec::new();
        match self.max_response_size {
            Some(limit) => {
                (&mut stream)
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut buffer)
                    .map_err(GopherError::from_io)?;
                if buffer.len() as u64 > limit {
                    return Err(GopherError::ResponseTooLarge { limit });
                }
            }
            None => {
                stream
                    .read_to_end(&mut buffer)
                    .map_err(GopherError::from_io)?;
            }
        }

        debug!(bytes = buffer.len(), "Received response");
        Ok(buffer)
    }

    /// Interprets a complete response body.
    ///
    /// The first line that is not a directory entry turns the whole response
    /// into a [`Response::RawPayload`] holding `resp` unchanged. Runs of
    /// informational lines are merged into a single item.
    ///
    /// # Errors
    ///
    /// Returns [`GopherError::InvalidPort`] if an entry has a malformed port.
    pub fn parse_response(&self, resp: &[u8]) -> Result<Response, GopherError> {
        let mut items: Vec<Item> = Vec::new();

        for line in split_lines(resp) {
            let Some(item) = Item::parse(self.encoding, line)? else {
                continue;
            };

            if item.is_raw() {
                debug!(bytes = resp.len(), "Response is not a directory listing");
                return Ok(Response::RawPayload(resp.to_vec()));
            }

            if item.is_info() {
                if let Some(last) = items.last_mut().filter(|last| last.is_info()) {
                    last.merge_messages(item)?;
                    continue;
                }
            }

            items.push(item);
        }

        Ok(Response::DirectoryListing(items))
    }

    /// Sends `path` (and `query`, when non-empty) to `host:port` and parses
    /// the reply.
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`GopherError::Io`] or
    /// [`GopherError::Timeout`]; see also [`Gopher::parse_response`].
    pub fn request(
        &self,
        host: &str,
        path: &str,
        port: u16,
        query: &str,
    ) -> Result<Response, GopherError> {
        let payload = self.prepare_payload(path, query)?;
        let resp = self.send_raw(host, port, &payload)?;
        self.parse_response(&resp)
    }

    /// Requests the root menu of `host` on the default port.
    ///
    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn fetch(&self, host: &str) -> Result<Response, GopherError> {
        self.request(host, DEFAULT_PATH, DEFAULT_PORT, "")
    }

    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn request_locator(&self, locator: &Locator) -> Result<Response, GopherError> {
        self.request(
            &locator.host,
            &locator.selector,
            locator.port,
            locator.query.as_deref().unwrap_or(""),
        )
    }

    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn follow(&self, item: &Item) -> Result<Response, GopherError> {
        self.request(&item.host, &item.path, item.port, "")
    }

    /// # Errors
    ///
    /// Same as [`Gopher::request`].
    pub fn search(&self, item: &Item, query: &str) -> Result<Response, GopherError> {
        self.request(&item.host, &item.path, item.port, query)
    }
}

/// Splits on CRLF. A trailing CRLF yields a final empty line.
fn split_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    let mut rest = Some(buf);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.windows(EOL.len()).position(|w| w == EOL) {
            Some(pos) => {
                rest = Some(&current[pos + EOL.len()..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(resp: &[u8]) -> Vec<Item> {
        match Gopher::default().parse_response(resp).unwrap() {
            Response::DirectoryListing(items) => items,
            Response::RawPayload(bytes) => panic!("unexpected raw payload: {bytes:?}"),
        }
    }

    #[test]
    fn splits_on_crlf_only() {
        let lines: Vec<&[u8]> = split_lines(b"a\r\nb\nc\r\n").collect();
        assert_eq!(lines, vec![&b"a"[..], &b"b\nc"[..], &b""[..]]);
        assert_eq!(split_lines(b"").count(), 1);
    }

    #[test]
    fn terminator_only_is_empty_listing() {
        assert!(listing(b".").is_empty());
        assert!(listing(b".\r\n").is_empty());
        assert!(listing(b"").is_empty());
    }

    #[test]
    fn parses_menu() {
        let items = listing(
            b"1Example dir\t/dir\texample.com\t70\r\n0Readme\t/readme.txt\texample.com\t70\r\n.\r\n",
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].pretty_type, "Directory");
        assert_eq!(items[1].path, "/readme.txt");
    }

    #[test]
    fn merges_consecutive_info_lines() {
        let items = listing(
            b"iHello\tfake\t(NULL)\t0\r\n\
              iWorld\tfake\t(NULL)\t0\r\n\
              iAgain\tfake\t(NULL)\t0\r\n\
              1Dir\t/d\thost\t70\r\n.\r\n",
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].raw_type, "i");
        assert_eq!(items[0].desc, "Hello\nWorld\nAgain");
        assert_eq!(items[1].raw_type, "1");
    }

    #[test]
    fn separated_info_runs_stay_apart() {
        let items = listing(
            b"iTop\t\t\t0\r\n1Dir\t/d\thost\t70\r\niBottom\t\t\t0\r\niEnd\t\t\t0\r\n",
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].desc, "Top");
        assert_eq!(items[2].desc, "Bottom\nEnd");
    }

    #[test]
    fn short_first_line_returns_raw_buffer() {
        let resp = b"Just some text\r\n1Dir\t/d\thost\t70\r\n";
        let parsed = Gopher::default().parse_response(resp).unwrap();
        assert_eq!(parsed, Response::RawPayload(resp.to_vec()));
        assert_eq!(parsed.bytes(), Some(&resp[..]));
        assert_eq!(parsed.items(), None);
    }

    #[test]
    fn raw_line_after_entries_still_returns_raw_buffer() {
        let resp = b"1Dir\t/d\thost\t70\r\nplain text\r\n";
        let parsed = Gopher::default().parse_response(resp).unwrap();
        assert_eq!(parsed, Response::RawPayload(resp.to_vec()));
    }

    #[test]
    fn binary_data_is_raw() {
        let resp = b"Binary\x00\x01data";
        let parsed = Gopher::default().parse_response(resp).unwrap();
        assert_eq!(parsed, Response::RawPayload(resp.to_vec()));
    }

    #[test]
    fn bad_port_aborts_parse() {
        let err = Gopher::default()
            .parse_response(b"1Dir\t/d\thost\tnope\r\n")
            .unwrap_err();
        assert!(matches!(err, GopherError::InvalidPort { .. }));
    }

    #[test]
    fn lines_after_terminator_are_parsed() {
        let items = listing(b".\r\n1Dir\t/d\thost\t70\r\n");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn payload_without_query() {
        let payload = Gopher::default().prepare_payload("/dir", "").unwrap();
        assert_eq!(payload, b"/dir\r\n".to_vec());
    }

    #[test]
    fn payload_with_query() {
        let payload = Gopher::default().prepare_payload("/v2/vs", "plan 9").unwrap();
        assert_eq!(payload, b"/v2/vs\tplan 9\r\n".to_vec());
    }

    #[test]
    fn payload_respects_encoding() {
        let latin1 = Gopher::new(DEFAULT_TIMEOUT, Encoding::Latin1);
        assert_eq!(latin1.prepare_payload("/café", "").unwrap(), b"/caf\xe9\r\n".to_vec());

        let ascii = Gopher::new(DEFAULT_TIMEOUT, Encoding::Ascii);
        assert!(matches!(
            ascii.prepare_payload("/café", ""),
            Err(GopherError::Encode { .. })
        ));
    }

    #[test]
    fn builds_from_config() {
        let config = ClientConfig {
            timeout: 3,
            encoding: Encoding::Latin1,
            max_response_size: Some(1024),
        };
        let client = Gopher::from_config(&config);
        assert_eq!(client.timeout(), Duration::from_secs(3));
        assert_eq!(client.encoding(), Encoding::Latin1);
        assert_eq!(client.max_response_size(), Some(1024));
    }

    #[test]
    fn defaults() {
        let client = Gopher::default();
        assert_eq!(client.timeout(), Duration::from_secs(10));
        assert_eq!(client.encoding(), Encoding::Utf8);
        assert_eq!(client.max_response_size(), None);
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(128))]

            /// A run of informational lines followed by one link collapses to two items.
            #[test]
            fn info_run_then_link_yields_two_items(
                descs in prop::collection::vec("[^\t\r\n]{0,16}", 1..20),
            ) {
                let mut resp = String::new();
                for desc in &descs {
                    resp.push_str(&format!("i{desc}\tfake\t(NULL)\t0\r\n"));
                }
                resp.push_str("1Dir\t/d\thost\t70\r\n.\r\n");

                let parsed = Gopher::default().parse_response(resp.as_bytes()).unwrap();
                let items = parsed.items().expect("listing, not raw payload");

                prop_assert_eq!(items.len(), 2);
                prop_assert!(items[0].is_info());
                prop_assert_eq!(&items[0].desc, &descs.join("\n"));
                prop_assert_eq!(&items[1].raw_type, "1");
            }
        }
    }
}
