// (c) 2026 Ferry contributors

//! Control message vocabulary and parsers

use std::time::Duration;

/// Server reply: the requested path is not a servable file
pub const ERROR: &[u8] = b"error";
/// Prefix of the server's size reply
pub const BEGIN: &str = "begin";
/// Completion marker sent by the server after the last data byte
pub const END: &[u8] = b"end";
/// Client acknowledgement of a size reply
pub const ACK: &[u8] = b"ack";
/// Client report that a file arrived complete
pub const SUCCESS: &[u8] = b"success";

/// Reasons a size negotiation attempt did not yield a size.
///
/// Every one of these is answered by waiting and asking again.
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    /// The server said `error`
    #[error("server refused the request")]
    Refused,
    /// The reply was not UTF-8
    #[error("reply could not be decoded")]
    Undecodable,
    /// The reply was empty, or the server closed the stream
    #[error("empty reply")]
    Empty,
    /// The reply was something other than a size
    #[error("reply was not a size: {0:?}")]
    NotNumeric(String),
    /// Nothing arrived in time
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Formats a size reply
#[must_use]
pub fn size_response(size: u64) -> Vec<u8> {
    format!("{BEGIN}{size}").into_bytes()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

/// Parses a size reply.
///
/// `begin<N>`, `end<N>` and a bare `<N>` are all accepted. A leading
/// completion marker left over from a previous transfer is tolerated,
/// so `endbegin<N>` also parses.
pub fn parse_size_response(payload: &[u8]) -> Result<u64, NegotiationError> {
    let text = std::str::from_utf8(payload).map_err(|_| NegotiationError::Undecodable)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(NegotiationError::Empty);
    }
    if text.eq_ignore_ascii_case("error") {
        return Err(NegotiationError::Refused);
    }
    let stripped = strip_prefix_ignore_case(text, "end");
    let stripped = strip_prefix_ignore_case(stripped, BEGIN).trim();
    if stripped.eq_ignore_ascii_case("error") {
        return Err(NegotiationError::Refused);
    }
    if stripped.is_empty() {
        return Err(NegotiationError::Empty);
    }
    stripped
        .parse::<u64>()
        .map_err(|_| NegotiationError::NotNumeric(text.to_string()))
}
