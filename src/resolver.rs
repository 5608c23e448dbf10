//! The public, one-shot query surface: `query` and the four resolution
//! flows built on top of it, each a specific combination of Collector
//! early-termination and fallback queries. §4.5.
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use log::{debug, error};
use tokio::sync::oneshot;

use crate::collate::{collate, CollatedEntry, DNS_SD_SERVICES};
use crate::collector::{collect, CollectorRequest};
use crate::error::{MdnsError, MdnsResult};
use crate::record::{RecordData, RecordType, ResourceRecord};

const SERVICE_TYPES_LISTEN: Duration = Duration::from_millis(2000);
const GET_SERVICES_LISTEN: Duration = Duration::from_millis(2000);
const GET_IP_LISTEN: Duration = Duration::from_millis(1000);
const ADDRESS_PTR_LISTEN: Duration = Duration::from_millis(1500);
const ADDRESS_SRV_LISTEN: Duration = Duration::from_millis(1000);
const ADDRESS_A_LISTEN: Duration = Duration::from_millis(1000);
const ADDRESS_STEP_SLEEP: Duration = Duration::from_millis(100);

/// Query `name` for `rrtype`, collecting every reply for `listen_time` and
/// collating the result by owner name. `Ok(HashMap::new())` means nothing
/// answered before the deadline — the normal "nothing out there" outcome,
/// not an error.
pub async fn query(
    name: &str,
    rrtype: u16,
    listen_time: Duration,
) -> MdnsResult<HashMap<String, CollatedEntry>> {
    if name.is_empty() {
        error!("query: missing required parameter 'name'");
        return Err(MdnsError::MissingParameter("name"));
    }
    let batches = collect(CollectorRequest {
        name,
        rrtype,
        listen_time,
        early_terminate: false,
        early_match_name: None,
    })
    .await?;
    Ok(collate(&batches))
}

/// Enumerate the service types advertised on the local network. Queries
/// `ANY` rather than `PTR`: deliberate, not a bug (some responders only
/// answer `_services._dns-sd._udp.local` on an `ANY` query).
pub async fn get_service_types() -> MdnsResult<Vec<String>> {
    let map = query(DNS_SD_SERVICES, RecordType::Any.to_u16(), SERVICE_TYPES_LISTEN).await?;
    Ok(map
        .get(DNS_SD_SERVICES)
        .map(|entry| entry.servicetypes.clone())
        .unwrap_or_default())
}

/// List instance names advertised under `service_type`, e.g.
/// `_http._tcp.local`.
pub async fn get_services(service_type: &str) -> MdnsResult<Vec<String>> {
    if service_type.is_empty() {
        error!("get_services: missing required parameter 'service_type'");
        return Err(MdnsError::MissingParameter("service_type"));
    }
    let map = query(service_type, RecordType::Ptr.to_u16(), GET_SERVICES_LISTEN).await?;
    Ok(map
        .get(service_type)
        .map(|entry| entry.instances.clone())
        .unwrap_or_default())
}

/// Resolve every A record seen for `name`, in wire order, deduplicated by
/// exact value. Stops as soon as a datagram naming `name` arrives.
pub async fn get_ip(name: &str) -> MdnsResult<Vec<Ipv4Addr>> {
    if name.is_empty() {
        error!("get_ip: missing required parameter 'name'");
        return Err(MdnsError::MissingParameter("name"));
    }
    let batches = collect(CollectorRequest {
        name,
        rrtype: RecordType::A.to_u16(),
        listen_time: GET_IP_LISTEN,
        early_terminate: true,
        early_match_name: Some(name),
    })
    .await?;

    let mut ips = Vec::new();
    for record in batches.iter().flat_map(|b| &b.records) {
        if let RecordData::A(ip) = &record.decoded {
            if !ips.contains(ip) {
                ips.push(*ip);
            }
        }
    }
    Ok(ips)
}

fn first_ip(records: &[ResourceRecord]) -> Option<Ipv4Addr> {
    records.iter().find_map(|r| match &r.decoded {
        RecordData::A(ip) => Some(*ip),
        _ => None,
    })
}

fn first_srv(records: &[ResourceRecord]) -> Option<(u16, String)> {
    records.iter().find_map(|r| match &r.decoded {
        RecordData::Srv { port, target, .. } => Some((*port, target.clone())),
        _ => None,
    })
}

/// Split `fqdn` into `(instance, service_type)` on the first `.`, rejecting
/// an empty or `_`-prefixed instance label.
fn split_fqdn(fqdn: &str) -> MdnsResult<(&str, &str)> {
    let (instance, service_type) = fqdn.split_once('.').ok_or_else(|| {
        error!("split_fqdn: {:?} has no '.' separating instance and service type", fqdn);
        MdnsError::InvalidFqdn(fqdn.to_string())
    })?;
    if instance.is_empty() || instance.starts_with('_') {
        error!("split_fqdn: {:?} has an empty or '_'-prefixed instance label", fqdn);
        return Err(MdnsError::InvalidFqdn(fqdn.to_string()));
    }
    Ok((instance, service_type))
}

/// Resolve the IP and port of one service instance by the five-step
/// fallback sequence: combined PTR response, then SRV, then `<instance
/// label>.local` A, then the SRV-learnt hostname's A record. Either field
/// of the result may be `None` if nothing answered.
pub async fn get_address(fqdn: &str) -> MdnsResult<(Option<Ipv4Addr>, Option<u16>)> {
    let (instance, service_type) = split_fqdn(fqdn)?;

    let mut ip = None;
    let mut port = None;
    let mut srv_hostname = None;

    // Step 1: a responder that answers the PTR query with the instance's
    // SRV and A records bundled into the same datagram.
    let combined = collect(CollectorRequest {
        name: service_type,
        rrtype: RecordType::Ptr.to_u16(),
        listen_time: ADDRESS_PTR_LISTEN,
        early_terminate: true,
        early_match_name: Some(fqdn),
    })
    .await?;
    for batch in &combined {
        ip = ip.or_else(|| first_ip(&batch.records));
        if let Some((p, _)) = first_srv(&batch.records) {
            port = port.or(Some(p));
        }
    }
    if ip.is_some() && port.is_some() {
        return Ok((ip, port));
    }

    // Step 2: SRV directly against the instance name.
    let srv_batches = collect(CollectorRequest {
        name: fqdn,
        rrtype: RecordType::Srv.to_u16(),
        listen_time: ADDRESS_SRV_LISTEN,
        early_terminate: true,
        early_match_name: None,
    })
    .await?;
    for batch in &srv_batches {
        if let Some((p, host)) = first_srv(&batch.records) {
            port = port.or(Some(p));
            srv_hostname = srv_hostname.or(Some(host));
        }
    }

    tokio::time::sleep(ADDRESS_STEP_SLEEP).await;

    // Step 4: try `<instance>.local` directly.
    let instance_local = format!("{}.local", instance);
    let a_batches = collect(CollectorRequest {
        name: &instance_local,
        rrtype: RecordType::A.to_u16(),
        listen_time: ADDRESS_A_LISTEN,
        early_terminate: true,
        early_match_name: None,
    })
    .await?;
    for batch in &a_batches {
        ip = ip.or_else(|| first_ip(&batch.records));
    }

    // Step 5: fall back to the hostname learnt from SRV, if still missing.
    if (ip.is_none() || port.is_none()) && srv_hostname.is_some() {
        let hostname = srv_hostname.clone().unwrap();
        let fallback = collect(CollectorRequest {
            name: &hostname,
            rrtype: RecordType::A.to_u16(),
            listen_time: ADDRESS_A_LISTEN,
            early_terminate: true,
            early_match_name: None,
        })
        .await?;
        for batch in &fallback {
            ip = ip.or_else(|| first_ip(&batch.records));
        }
    }

    debug!("get_address({}) resolved to {:?}:{:?}", fqdn, ip, port);
    Ok((ip, port))
}

/// Fire `query` on its own task and deliver the result over a oneshot, the
/// literal "fire a task, get invoked once" shape of the source's
/// callback-passing API.
pub fn spawn_query(
    name: String,
    rrtype: u16,
    listen_time: Duration,
) -> oneshot::Receiver<MdnsResult<HashMap<String, CollatedEntry>>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = query(&name, rrtype, listen_time).await;
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_instance_and_service_type() {
        let (instance, service_type) = split_fqdn("Printer._http._tcp.local").unwrap();
        assert_eq!(instance, "Printer");
        assert_eq!(service_type, "_http._tcp.local");
    }

    #[test]
    fn rejects_empty_instance_label() {
        assert!(matches!(split_fqdn(".local"), Err(MdnsError::InvalidFqdn(_))));
    }

    #[test]
    fn rejects_underscore_prefixed_instance_label() {
        assert!(matches!(
            split_fqdn("_http._tcp.local"),
            Err(MdnsError::InvalidFqdn(_))
        ));
    }

    #[test]
    fn rejects_fqdn_with_no_dot() {
        assert!(matches!(split_fqdn("printer"), Err(MdnsError::InvalidFqdn(_))));
    }

    #[test]
    fn first_ip_and_srv_find_the_first_match() {
        let records = vec![
            ResourceRecord {
                name: "Printer._http._tcp.local".to_string(),
                rrtype: RecordType::Srv,
                class: 1,
                ttl: 120,
                rdata: Vec::new(),
                decoded: RecordData::Srv {
                    priority: 0,
                    weight: 0,
                    port: 80,
                    target: "host1.local".to_string(),
                },
            },
            ResourceRecord {
                name: "host1.local".to_string(),
                rrtype: RecordType::A,
                class: 1,
                ttl: 120,
                rdata: Vec::new(),
                decoded: RecordData::A("192.168.1.7".parse().unwrap()),
            },
        ];
        assert_eq!(first_ip(&records), Some("192.168.1.7".parse().unwrap()));
        assert_eq!(
            first_srv(&records),
            Some((80, "host1.local".to_string()))
        );
    }
}
