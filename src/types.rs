use std::time::Duration;

/// Line terminator for requests and responses.
pub const EOL: &[u8] = b"\r\n";
/// Field separator inside a directory line, also used between selector and query.
pub const SEPARATOR: char = '\t';
/// Joins the descriptions of coalesced informational lines.
pub const MESSAGE_SEPARATOR: &str = "\n";
/// Optional end-of-listing marker.
pub const TERMINATOR: &[u8] = b".";

pub const DEFAULT_PORT: u16 = 70;
pub const DEFAULT_PATH: &str = "/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const INFO_TYPE: &str = "i";
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Human-readable label for a single-character type code.
///
/// Codes outside the table, including the empty code of a raw payload,
/// resolve to `"Unknown"`.
pub fn pretty_type(code: &str) -> &'static str {
    match code {
        "0" => "Text file",
        "1" => "Directory",
        "2" => "CCSO Nameserver",
        "3" => "Failure",
        "4" => "BinHex-encoded file",
        "5" => "DOS file",
        "6" => "uuencoded file",
        "7" => "Full-text search",
        "8" => "Telnet session",
        "9" => "Binary file",
        "+" => "Mirror or alternate server",
        "g" => "GIF file",
        "I" => "Image file",
        "T" => "Telnet 3270",
        // Gopher+ media types seen in the wild
        ":" => "Bitmap image",
        ";" => "Movie file",
        "<" => "Sound file",
        "d" => "Document file",
        "h" => "HTML file",
        "i" => "Informational message",
        "s" => "Sound file",
        _ => UNKNOWN_TYPE,
    }
}
