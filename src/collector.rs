//! Drives one query+listen cycle: send the question on the unicast socket,
//! read from both sockets until a deadline, optionally stop early when a
//! matching record shows up. Exactly the procedure in spec.md §4.3.
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::error::MdnsError;
use crate::response::{decode_message, ResponseBatch, Source};
use crate::rfc1035::encode_query;
use crate::socket::SocketPair;
use crate::record::ResourceRecord;

/// Network-jitter margin added to every cycle's deadline — not a
/// retransmission interval, just slack for a slow final reply.
const JITTER_GRACE: Duration = Duration::from_millis(500);
/// Lets an implementation drain its own multicast echo of the query before
/// the listen loop starts timing.
const POST_SEND_SLEEP: Duration = Duration::from_millis(100);
/// Largest UDP datagram this crate will read in one `recv_from`.
const MAX_DATAGRAM_SIZE: usize = 9000;

pub struct CollectorRequest<'a> {
    pub name: &'a str,
    pub rrtype: u16,
    pub listen_time: Duration,
    pub early_terminate: bool,
    pub early_match_name: Option<&'a str>,
}

/// Strip a trailing `.local` (with or without the dot already gone) so
/// `hue.local` and `hue` compare equal, per spec.md §4.3's early-terminate
/// predicate.
fn strip_local(name: &str) -> &str {
    name.strip_suffix(".local").unwrap_or(name)
}

/// Run one query+listen cycle. On any socket-creation failure the cycle
/// returns before sending a query. A decode failure on a single datagram
/// is logged and the cycle keeps listening.
pub async fn collect(request: CollectorRequest<'_>) -> Result<Vec<ResponseBatch>, MdnsError> {
    let sockets = SocketPair::bind().await?;

    let query = encode_query(request.name, request.rrtype)?;
    sockets.send_query(&query).await?;
    debug!("sent query for {} (type {})", request.name, request.rrtype);

    tokio::time::sleep(POST_SEND_SLEEP).await;

    let deadline = Instant::now() + request.listen_time + JITTER_GRACE;
    let target = strip_local(request.early_match_name.unwrap_or(request.name));

    let mut accumulator = Vec::new();
    let mut unicast_buf = [0u8; MAX_DATAGRAM_SIZE];
    let mut multicast_buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        // Each arm decodes and folds its own datagram immediately, so the
        // two receive buffers never need to be compared or returned out of
        // the select — only one is ever borrowed per iteration.
        tokio::select! {
            result = sockets.unicast.recv_from(&mut unicast_buf) => {
                match result {
                    Ok((n, _from)) => {
                        if let Some(records) = accept(&unicast_buf[..n]) {
                            if try_terminate(&request, target, Source::Unicast, records, &mut accumulator) {
                                return Ok(accumulator);
                            }
                        }
                    }
                    Err(e) => warn!("unicast recv error: {}", e),
                }
            }
            result = sockets.multicast.recv_from(&mut multicast_buf) => {
                match result {
                    Ok((n, _from)) => {
                        if let Some(records) = accept(&multicast_buf[..n]) {
                            if try_terminate(&request, target, Source::Multicast, records, &mut accumulator) {
                                return Ok(accumulator);
                            }
                        }
                    }
                    Err(e) => warn!("multicast recv error: {}", e),
                }
            }
            _ = tokio::time::sleep(remaining) => {}
        }
    }

    Ok(accumulator)
}

/// Decode a datagram, logging and dropping it on failure, and treating an
/// empty (but structurally valid) record list the same as no datagram.
fn accept(datagram: &[u8]) -> Option<Vec<ResourceRecord>> {
    match decode_message(datagram) {
        Ok(records) if records.is_empty() => None,
        Ok(records) => Some(records),
        Err(e) => {
            warn!("dropping undecodable datagram: {:?}", e);
            None
        }
    }
}

/// Apply the early-termination predicate; otherwise fold into the
/// accumulator. Returns true when the caller should stop and return
/// immediately with only this datagram's batch.
fn try_terminate(
    request: &CollectorRequest<'_>,
    target: &str,
    source: Source,
    records: Vec<ResourceRecord>,
    accumulator: &mut Vec<ResponseBatch>,
) -> bool {
    if request.early_terminate && records.iter().any(|r| strip_local(&r.name) == target) {
        *accumulator = vec![ResponseBatch { source, records }];
        return true;
    }
    accumulator.push(ResponseBatch { source, records });
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    use socket2::{Domain, Protocol, Socket, Type};
    use tokio::net::UdpSocket;

    use crate::record::{RecordData, RecordType, ResourceRecord};
    use crate::rfc1035::{encode_name, FLAG_AA, FLAG_QR};
    use crate::socket::{MDNS_ADDR, MDNS_PORT};

    #[test]
    fn strip_local_handles_both_forms() {
        assert_eq!(strip_local("hue.local"), "hue");
        assert_eq!(strip_local("hue"), "hue");
        assert_eq!(strip_local("_http._tcp.local"), "_http._tcp");
    }

    fn a_record_datagram(name: &str, ip: [u8; 4]) -> Vec<u8> {
        let mut datagram = Vec::new();
        datagram.extend_from_slice(&0u16.to_be_bytes());
        datagram.extend_from_slice(&(FLAG_QR | FLAG_AA).to_be_bytes());
        datagram.extend_from_slice(&0u16.to_be_bytes());
        datagram.extend_from_slice(&1u16.to_be_bytes());
        datagram.extend_from_slice(&0u16.to_be_bytes());
        datagram.extend_from_slice(&0u16.to_be_bytes());
        encode_name(name, &mut datagram).unwrap();
        datagram.extend_from_slice(&1u16.to_be_bytes());
        datagram.extend_from_slice(&1u16.to_be_bytes());
        datagram.extend_from_slice(&120u32.to_be_bytes());
        datagram.extend_from_slice(&4u16.to_be_bytes());
        datagram.extend_from_slice(&ip);
        datagram
    }

    #[test]
    fn accept_drops_undecodable_and_empty_datagrams() {
        assert!(accept(&[0xff; 4]).is_none());
        // a well-formed header with zero records decodes to an empty list.
        let mut empty = Vec::new();
        empty.extend_from_slice(&0u16.to_be_bytes());
        empty.extend_from_slice(&(FLAG_QR | FLAG_AA).to_be_bytes());
        empty.extend_from_slice(&[0; 8]);
        assert!(accept(&empty).is_none());
    }

    #[test]
    fn accept_decodes_a_well_formed_datagram() {
        let datagram = a_record_datagram("hue.local", [192, 168, 1, 50]);
        let records = accept(&datagram).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].decoded,
            RecordData::A("192.168.1.50".parse().unwrap())
        );
    }

    fn request(name: &'static str, early_terminate: bool) -> CollectorRequest<'static> {
        CollectorRequest {
            name,
            rrtype: 1,
            listen_time: Duration::from_secs(1),
            early_terminate,
            early_match_name: None,
        }
    }

    #[test]
    fn try_terminate_stops_and_keeps_only_the_matching_batch() {
        let req = request("hue.local", true);
        let mut accumulator = vec![ResponseBatch {
            source: Source::Multicast,
            records: vec![],
        }];
        let records = vec![ResourceRecord {
            name: "hue.local".to_string(),
            rrtype: RecordType::A,
            class: 1,
            ttl: 120,
            rdata: Vec::new(),
            decoded: RecordData::A("10.0.0.1".parse().unwrap()),
        }];
        let stopped = try_terminate(&req, "hue", Source::Unicast, records, &mut accumulator);
        assert!(stopped);
        assert_eq!(accumulator.len(), 1);
        assert_eq!(accumulator[0].source, Source::Unicast);
    }

    #[test]
    fn try_terminate_accumulates_when_not_matching() {
        let req = request("hue.local", true);
        let mut accumulator = Vec::new();
        let records = vec![ResourceRecord {
            name: "other.local".to_string(),
            rrtype: RecordType::A,
            class: 1,
            ttl: 120,
            rdata: Vec::new(),
            decoded: RecordData::A("10.0.0.1".parse().unwrap()),
        }];
        let stopped = try_terminate(&req, "hue", Source::Multicast, records, &mut accumulator);
        assert!(!stopped);
        assert_eq!(accumulator.len(), 1);
    }

    /// Joins the same multicast group `collect()` binds to, so it observes
    /// the collector's own outgoing query via multicast loopback, learns
    /// the collector's ephemeral unicast source port from it, and replies
    /// straight to that port — driving `collect()`'s real socket pair end
    /// to end instead of a fake one.
    fn join_mdns_group() -> UdpSocket {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).unwrap();
        socket.set_reuse_address(true).unwrap();
        #[cfg(unix)]
        socket.set_reuse_port(true).unwrap();
        socket.set_nonblocking(true).unwrap();
        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, MDNS_PORT));
        socket.bind(&bind_addr.into()).unwrap();
        socket.join_multicast_v4(&MDNS_ADDR, &Ipv4Addr::UNSPECIFIED).unwrap();
        UdpSocket::from_std(socket.into()).unwrap()
    }

    #[tokio::test]
    async fn collect_terminates_early_on_matching_reply() {
        let responder = join_mdns_group();

        let request = CollectorRequest {
            name: "hue.local",
            rrtype: 1,
            listen_time: Duration::from_secs(5),
            early_terminate: true,
            early_match_name: None,
        };
        let task = tokio::spawn(collect(request));

        let mut buf = [0u8; 512];
        let (_n, from) = tokio::time::timeout(Duration::from_secs(2), responder.recv_from(&mut buf))
            .await
            .expect("should observe the collector's outgoing query")
            .unwrap();

        let reply = a_record_datagram("hue.local", [10, 0, 0, 1]);
        responder.send_to(&reply, from).await.unwrap();

        let batches = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("collect should return well before its deadline")
            .unwrap()
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].source, Source::Unicast);
        assert_eq!(
            batches[0].records[0].decoded,
            RecordData::A("10.0.0.1".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn collect_returns_empty_after_deadline_with_no_responder() {
        let request = CollectorRequest {
            name: "ghost.local",
            rrtype: 1,
            listen_time: Duration::from_millis(150),
            early_terminate: false,
            early_match_name: None,
        };
        let start = Instant::now();
        let batches = collect(request).await.expect("collect should not error with no responder");
        assert!(batches.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
