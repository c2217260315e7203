use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GopherError;

/// Text codec used to decode directory lines and encode requests.
///
/// ASCII and ISO-8859-1 are handled strictly and byte for byte. Every other
/// label is resolved through `encoding_rs`, which follows the WHATWG label
/// table (so `latin1` there would mean windows-1252).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    /// Rejects any byte above 0x7f.
    Ascii,
    /// Every byte maps to the code point of the same value.
    Latin1,
    Codec(&'static encoding_rs::Encoding),
}

impl Encoding {
    /// Looks up a codec by label, ignoring case and surrounding whitespace.
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "ascii" | "us-ascii" => return Some(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => {
                return Some(Encoding::Latin1)
            }
            _ => {}
        }

        let codec = encoding_rs::Encoding::for_label(label.as_bytes())?;
        if codec == encoding_rs::UTF_8 {
            Some(Encoding::Utf8)
        } else {
            Some(Encoding::Codec(codec))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
            Encoding::Codec(codec) => codec.name(),
        }
    }

    /// Returns `None` when `bytes` is not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            Encoding::Ascii => {
                if bytes.is_ascii() {
                    Some(bytes.iter().map(|&b| b as char).collect())
                } else {
                    None
                }
            }
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Codec(codec) => codec
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, GopherError> {
        let unrepresentable = || GopherError::Encode { encoding: self.name() };
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => {
                if text.is_ascii() {
                    Ok(text.as_bytes().to_vec())
                } else {
                    Err(unrepresentable())
                }
            }
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| unrepresentable()))
                .collect(),
            Encoding::Codec(codec) => {
                let (bytes, _, had_unmappable) = codec.encode(text);
                if had_unmappable {
                    Err(unrepresentable())
                } else {
                    Ok(bytes.into_owned())
                }
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = GopherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::for_label(s).ok_or_else(|| GopherError::UnknownEncoding(s.to_string()))
    }
}

impl TryFrom<String> for Encoding {
    type Error = GopherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.name().to_string()
    }
}
