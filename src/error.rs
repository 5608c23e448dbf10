//! A dedicated error for everything that can go wrong sending a query,
//! listening for replies, or decoding what comes back.
use std::io;
use std::str;

#[derive(Debug)]
pub enum MdnsError {
    /// Socket creation, bind or multicast-join failure. The Collector cycle
    /// aborts before any query is sent.
    Socket(io::Error),
    /// The query datagram could not be sent on the unicast socket.
    Send(io::Error),
    /// A single datagram failed to decode. Never escapes the Collector:
    /// logged, the datagram is dropped, listening continues.
    Decode(DecodeError),
    /// `get_address` was called with a name that isn't `<instance>.<rest>`,
    /// or whose instance label is empty or starts with `_`.
    InvalidFqdn(String),
    /// A required argument was empty. Kept for symmetry with the
    /// callback-passing source, where this was a logged no-op; most of
    /// these cases are compile errors here instead.
    MissingParameter(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Header flags didn't carry both QR and AA, or the transaction id
    /// wasn't zero — not a reply to one of our queries.
    NotAReply,
    /// A length, rdlength, or label walked past the end of the datagram.
    Truncated,
    /// A label length byte was >= 0x40 and < 0xC0 (reserved combination).
    BadLabelLength(u8),
    /// A compression pointer pointed forward or at/after its own offset.
    BadPointer { at: usize, target: usize },
    /// More than 64 pointer hops were followed resolving one name.
    PointerLoop,
    /// Label bytes were not valid UTF-8.
    BadLabelText,
    /// An A record didn't carry exactly 4 bytes of rdata.
    BadRdLength { rrtype: u16, expected: u16, got: u16 },
}

/// A specific custom `Result` for all functions
pub type MdnsResult<T> = Result<T, MdnsError>;

impl From<io::Error> for MdnsError {
    fn from(err: io::Error) -> Self {
        MdnsError::Socket(err)
    }
}

impl From<DecodeError> for MdnsError {
    fn from(err: DecodeError) -> Self {
        MdnsError::Decode(err)
    }
}

impl std::fmt::Display for MdnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MdnsError::Socket(e) => write!(f, "socket error: {}", e),
            MdnsError::Send(e) => write!(f, "send error: {}", e),
            MdnsError::Decode(e) => write!(f, "decode error: {:?}", e),
            MdnsError::InvalidFqdn(s) => write!(f, "invalid fqdn: {}", s),
            MdnsError::MissingParameter(name) => write!(f, "missing parameter: {}", name),
        }
    }
}

impl std::error::Error for MdnsError {}

impl From<str::Utf8Error> for DecodeError {
    fn from(_: str::Utf8Error) -> Self {
        DecodeError::BadLabelText
    }
}
