//! Whole-datagram decoding: walk the header, discard the question section,
//! then decode `ancount + nscount + arcount` resource records in wire
//! order (Answer, then Authority, then Additional).
use log::trace;

use crate::error::DecodeError;
use crate::record::{decode_record, ResourceRecord};
use crate::rfc1035::{Header, Question};

/// Which socket a batch of records arrived on — informational only, the
/// Collector doesn't treat multicast and unicast replies differently once
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Multicast,
    Unicast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBatch {
    pub source: Source,
    pub records: Vec<ResourceRecord>,
}

/// Decode one datagram into its answer/authority/additional records.
/// Any structural inconsistency — truncation, a bad compression pointer,
/// a non-reply header — rejects the whole datagram; callers log and keep
/// listening rather than propagate the error further.
pub fn decode_message(datagram: &[u8]) -> Result<Vec<ResourceRecord>, DecodeError> {
    let mut cursor = std::io::Cursor::new(datagram);
    let header = Header::from_network_bytes(&mut cursor).map_err(|_| DecodeError::Truncated)?;

    if !header.is_accepted_reply() {
        return Err(DecodeError::NotAReply);
    }

    let mut pos = cursor.position() as usize;

    for _ in 0..header.qd_count {
        let (_question, next): (Question, usize) = Question::decode(datagram, pos)?;
        pos = next;
    }

    let total_records = header.an_count as usize + header.ns_count as usize + header.ar_count as usize;
    let mut records = Vec::with_capacity(total_records);

    for _ in 0..total_records {
        let (record, next) = decode_record(datagram, pos)?;
        pos = next;
        if let Some(record) = record {
            trace!("decoded record: {:?}", record.name);
            records.push(record);
        }
    }

    Ok(records)
}
