//! Resource-record decoding: the per-type rdata parsers of spec.md §4.1,
//! dispatched on the already-decoded `rrtype`. Unlike the name/question
//! codec in `rfc1035.rs`, this always needs the *whole* datagram (not just
//! a cursor into the current record) because PTR and SRV rdata can contain
//! compression pointers that are offsets from byte 0 of the message.
use std::net::Ipv4Addr;

use crate::error::DecodeError;
use crate::rfc1035::decode_name;

/// RR TYPE codes this crate decodes, plus the mDNS-relevant special case
/// (`Any`) and a catch-all for everything else. Unknown codes are still
/// walked (via rdlength) so the cursor stays correctly positioned for the
/// next record, but their rdata is never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ptr,
    Txt,
    Srv,
    Any,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            12 => RecordType::Ptr,
            16 => RecordType::Txt,
            33 => RecordType::Srv,
            255 => RecordType::Any,
            other => RecordType::Other(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ptr => 12,
            RecordType::Txt => 16,
            RecordType::Srv => 33,
            RecordType::Any => 255,
            RecordType::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    A(Ipv4Addr),
    Ptr(String),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    /// Ordered `key=value` pairs; a bare item with no `=` has an empty
    /// value. Duplicate keys are kept as separate entries — nothing here
    /// collapses them.
    Txt(Vec<(String, String)>),
    /// Recognised but opaque (NS, CNAME, SOA, MX, AAAA, NAPTR, OPT, NSEC,
    /// IXFR, AXFR, ...), or ANY.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub rrtype: RecordType,
    /// Low 15 bits are the RR class; bit 15 is the mDNS cache-flush bit.
    /// Retained verbatim, never interpreted.
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
    pub decoded: RecordData,
}

impl ResourceRecord {
    pub fn cache_flush(&self) -> bool {
        self.class & 0x8000 != 0
    }
}

/// Decode one resource record starting at `pos`. Returns `Ok(None)` for the
/// one case spec.md calls out as a record-only skip (an A record whose
/// rdlength isn't 4) rather than a batch-fatal error — every other
/// structural problem propagates so the caller aborts the whole datagram.
pub fn decode_record(
    datagram: &[u8],
    pos: usize,
) -> Result<(Option<ResourceRecord>, usize), DecodeError> {
    let (name, next) = decode_name(datagram, pos)?;

    if next + 10 > datagram.len() {
        return Err(DecodeError::Truncated);
    }
    let rrtype_raw = u16::from_be_bytes([datagram[next], datagram[next + 1]]);
    let class = u16::from_be_bytes([datagram[next + 2], datagram[next + 3]]);
    let ttl = u32::from_be_bytes([
        datagram[next + 4],
        datagram[next + 5],
        datagram[next + 6],
        datagram[next + 7],
    ]);
    let rdlength = u16::from_be_bytes([datagram[next + 8], datagram[next + 9]]);

    let rdata_start = next + 10;
    let rdata_end = rdata_start + rdlength as usize;
    if rdata_end > datagram.len() {
        return Err(DecodeError::Truncated);
    }
    let rdata = datagram[rdata_start..rdata_end].to_vec();
    let rrtype = RecordType::from_u16(rrtype_raw);

    let decoded = match rrtype {
        RecordType::A => {
            if rdlength != 4 {
                // spec.md §8 boundary case: drop only this record.
                return Ok((None, rdata_end));
            }
            RecordData::A(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]))
        }
        RecordType::Ptr => {
            let (target, _) = decode_name(datagram, rdata_start)?;
            RecordData::Ptr(target)
        }
        RecordType::Srv => {
            if rdlength < 6 {
                return Err(DecodeError::BadRdLength {
                    rrtype: rrtype_raw,
                    expected: 6,
                    got: rdlength,
                });
            }
            let priority = u16::from_be_bytes([rdata[0], rdata[1]]);
            let weight = u16::from_be_bytes([rdata[2], rdata[3]]);
            let port = u16::from_be_bytes([rdata[4], rdata[5]]);
            let (target, _) = decode_name(datagram, rdata_start + 6)?;
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            }
        }
        RecordType::Txt => RecordData::Txt(decode_txt(&rdata)?),
        RecordType::Any | RecordType::Other(_) => RecordData::Unknown,
    };

    Ok((
        Some(ResourceRecord {
            name,
            rrtype,
            class,
            ttl,
            rdata,
            decoded,
        }),
        rdata_end,
    ))
}

/// Walk a TXT rdata blob as a sequence of 1-byte-length-prefixed items,
/// splitting each on the first `=`. A missing `=` yields key=whole-item,
/// value="". Empty rdata yields no items (never an error).
fn decode_txt(rdata: &[u8]) -> Result<Vec<(String, String)>, DecodeError> {
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < rdata.len() {
        let len = rdata[pos] as usize;
        let start = pos + 1;
        let end = start + len;
        if end > rdata.len() {
            return Err(DecodeError::Truncated);
        }
        let item = std::str::from_utf8(&rdata[start..end])?;
        match item.split_once('=') {
            Some((key, value)) => items.push((key.to_string(), value.to_string())),
            None => items.push((item.to_string(), String::new())),
        }
        pos = end;
    }
    Ok(items)
}
