//! Base structures for DNS messages, restricted to the slice of RFC1035
//! mDNS actually needs: a fixed 12-byte header and a label-encoded domain
//! name, both for outgoing questions and for decoding whatever a responder
//! sends back. https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
use std::io::Cursor;

use crate::error::DecodeError;
use crate::network_order::{FromNetworkOrder, ToNetworkOrder};

/// QR bit (query=0, response=1). https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
pub const FLAG_QR: u16 = 0x8000;
/// AA bit: responder asserts ownership of the name in the question section.
pub const FLAG_AA: u16 = 0x0400;
/// Unicast-response-preferred bit (mDNS, RFC6762 §5.4), OR'd into the
/// question class of outgoing queries.
pub const QU_BIT: u16 = 0x8000;
/// Internet class.
pub const CLASS_IN: u16 = 1;
/// Cache-flush bit set by responders on the class field of an answer;
/// ResourceRecord retains but never interprets it.
pub const CACHE_FLUSH_BIT: u16 = 0x8000;

pub const MAX_POINTER_HOPS: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl Header {
    /// The header a one-shot query sends: everything zero except qdcount.
    pub fn query() -> Self {
        Header {
            id: 0,
            flags: 0,
            qd_count: 1,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    pub fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> std::io::Result<usize> {
        let mut length = 0;
        length += self.id.to_network_bytes(buffer)?;
        length += self.flags.to_network_bytes(buffer)?;
        length += self.qd_count.to_network_bytes(buffer)?;
        length += self.an_count.to_network_bytes(buffer)?;
        length += self.ns_count.to_network_bytes(buffer)?;
        length += self.ar_count.to_network_bytes(buffer)?;
        Ok(length)
    }

    pub fn from_network_bytes(buffer: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Header {
            id: u16::from_network_bytes(buffer)?,
            flags: u16::from_network_bytes(buffer)?,
            qd_count: u16::from_network_bytes(buffer)?,
            an_count: u16::from_network_bytes(buffer)?,
            ns_count: u16::from_network_bytes(buffer)?,
            ar_count: u16::from_network_bytes(buffer)?,
        })
    }

    /// mDNS queriers only accept authoritative responses to transaction id 0.
    pub fn is_accepted_reply(&self) -> bool {
        self.id == 0 && self.flags & FLAG_QR != 0 && self.flags & FLAG_AA != 0
    }
}

/// Serialise `name` as length-prefixed labels terminated by a zero byte.
/// No compression: every outgoing query writes the name out in full, per
/// spec (compression is a decode-only concern here).
pub fn encode_name(name: &str, buffer: &mut Vec<u8>) -> std::io::Result<usize> {
    let mut length = 0;
    for label in name.split('.').filter(|s| !s.is_empty()) {
        let bytes = label.as_bytes();
        length += (bytes.len() as u8).to_network_bytes(buffer)?;
        buffer.extend_from_slice(bytes);
        length += bytes.len();
    }
    buffer.push(0);
    length += 1;
    Ok(length)
}

/// Decode a domain name starting at `pos` in `datagram`, resolving any
/// compression pointers against the whole message (pointers are absolute
/// offsets from byte 0, the start of the header's id field).
///
/// Returns the joined name (no trailing dot) and the position immediately
/// after this name *in the caller's record* — once a pointer is followed,
/// that position is fixed at two bytes past the pointer, regardless of how
/// long the name it points to turns out to be.
pub fn decode_name(datagram: &[u8], pos: usize) -> Result<(String, usize), DecodeError> {
    let mut cur = pos;
    let mut labels: Vec<String> = Vec::new();
    let mut return_pos: Option<usize> = None;
    let mut hops = 0usize;

    loop {
        if cur >= datagram.len() {
            return Err(DecodeError::Truncated);
        }
        let len = datagram[cur];

        if len == 0 {
            if return_pos.is_none() {
                return_pos = Some(cur + 1);
            }
            break;
        } else if len >= 0xC0 {
            if cur + 1 >= datagram.len() {
                return Err(DecodeError::Truncated);
            }
            let pointer = (((len as u16) & 0x3F) << 8) | datagram[cur + 1] as u16;
            let target = pointer as usize;

            if return_pos.is_none() {
                return_pos = Some(cur + 2);
            }
            if target >= cur {
                return Err(DecodeError::BadPointer { at: cur, target });
            }
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return Err(DecodeError::PointerLoop);
            }
            cur = target;
        } else if len < 0x40 {
            let start = cur + 1;
            let end = start + len as usize;
            if end > datagram.len() {
                return Err(DecodeError::Truncated);
            }
            let label = std::str::from_utf8(&datagram[start..end])?;
            labels.push(label.to_string());
            cur = end;
        } else {
            return Err(DecodeError::BadLabelLength(len));
        }
    }

    Ok((labels.join("."), return_pos.unwrap()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub rrtype: u16,
    pub class: u16,
}

impl Question {
    /// A question asking for `rrtype` with the unicast-response-preferred
    /// bit set, as every outgoing mDNS query in this crate does.
    pub fn new(name: &str, rrtype: u16) -> Self {
        Question {
            name: name.to_string(),
            rrtype,
            class: QU_BIT | CLASS_IN,
        }
    }

    pub fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> std::io::Result<usize> {
        let mut length = encode_name(&self.name, buffer)?;
        length += self.rrtype.to_network_bytes(buffer)?;
        length += self.class.to_network_bytes(buffer)?;
        Ok(length)
    }

    /// Decode a question at `pos`, returning it along with the position of
    /// the byte following it.
    pub fn decode(datagram: &[u8], pos: usize) -> Result<(Question, usize), DecodeError> {
        let (name, mut next) = decode_name(datagram, pos)?;
        if next + 4 > datagram.len() {
            return Err(DecodeError::Truncated);
        }
        let rrtype = u16::from_be_bytes([datagram[next], datagram[next + 1]]);
        next += 2;
        let class = u16::from_be_bytes([datagram[next], datagram[next + 1]]);
        next += 2;
        Ok((Question { name, rrtype, class }, next))
    }
}

/// Build the encoded bytes of a one-question query for `name`/`rrtype`.
pub fn encode_query(name: &str, rrtype: u16) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    Header::query().to_network_bytes(&mut buffer)?;
    Question::new(name, rrtype).to_network_bytes(&mut buffer)?;
    Ok(buffer)
}
