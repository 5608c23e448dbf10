//! Folds per-datagram record lists into a per-name aggregate. Pure and
//! side-effect free, so it's unit-testable without a socket in sight and
//! trivially idempotent (spec.md §8: "running the Collator twice on the
//! same collection yields the same map").
use std::collections::HashMap;
use std::net::Ipv4Addr;

use indexmap::IndexMap;

use crate::record::RecordData;
use crate::response::ResponseBatch;

/// The well-known PTR owner name under which service types are enumerated.
/// https://datatracker.ietf.org/doc/html/rfc6763#section-9
pub const DNS_SD_SERVICES: &str = "_services._dns-sd._udp.local";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollatedEntry {
    pub ip: Option<Ipv4Addr>,
    pub port: Option<u16>,
    pub info: IndexMap<String, String>,
    pub instances: Vec<String>,
    pub servicetypes: Vec<String>,
    pub hostnames: Vec<String>,
}

fn push_dedup(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Fold every record from every received datagram into a name-keyed map,
/// in arrival order. `record.name` is the only key used — never the
/// record type, and never the batch's source socket — per spec.md §3.
pub fn collate(batches: &[ResponseBatch]) -> HashMap<String, CollatedEntry> {
    let mut map: HashMap<String, CollatedEntry> = HashMap::new();

    for batch in batches {
        for record in &batch.records {
            let entry = map.entry(record.name.clone()).or_default();
            match &record.decoded {
                RecordData::A(ip) => entry.ip = Some(*ip),
                RecordData::Srv { port, target, .. } => {
                    entry.port = Some(*port);
                    push_dedup(&mut entry.hostnames, target.clone());
                }
                RecordData::Ptr(target) => {
                    if record.name == DNS_SD_SERVICES {
                        push_dedup(&mut entry.servicetypes, target.clone());
                    } else {
                        push_dedup(&mut entry.instances, target.clone());
                    }
                }
                RecordData::Txt(items) => {
                    entry.info = items.iter().cloned().collect();
                }
                RecordData::Unknown => {}
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordType, ResourceRecord};
    use crate::response::Source;

    fn rec(name: &str, decoded: RecordData) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            rrtype: match &decoded {
                RecordData::A(_) => RecordType::A,
                RecordData::Ptr(_) => RecordType::Ptr,
                RecordData::Srv { .. } => RecordType::Srv,
                RecordData::Txt(_) => RecordType::Txt,
                RecordData::Unknown => RecordType::Other(0),
            },
            class: 1,
            ttl: 120,
            rdata: Vec::new(),
            decoded,
        }
    }

    fn batch(records: Vec<ResourceRecord>) -> ResponseBatch {
        ResponseBatch {
            source: Source::Multicast,
            records,
        }
    }

    #[test]
    fn services_of_type_scenario() {
        let b = batch(vec![
            rec(
                "_http._tcp.local",
                RecordData::Ptr("Printer._http._tcp.local".to_string()),
            ),
            rec(
                "_http._tcp.local",
                RecordData::Ptr("Bridge._http._tcp.local".to_string()),
            ),
        ]);
        let map = collate(&[b]);
        assert_eq!(
            map["_http._tcp.local"].instances,
            vec!["Printer._http._tcp.local", "Bridge._http._tcp.local"]
        );
    }

    #[test]
    fn service_types_scenario_keys_under_dns_sd_name() {
        let b = batch(vec![
            rec(
                DNS_SD_SERVICES,
                RecordData::Ptr("_http._tcp.local".to_string()),
            ),
            rec(
                DNS_SD_SERVICES,
                RecordData::Ptr("_printer._tcp.local".to_string()),
            ),
        ]);
        let map = collate(&[b]);
        assert_eq!(
            map[DNS_SD_SERVICES].servicetypes,
            vec!["_http._tcp.local", "_printer._tcp.local"]
        );
    }

    #[test]
    fn ptr_instances_and_servicetypes_are_deduplicated() {
        let b = batch(vec![
            rec("_http._tcp.local", RecordData::Ptr("A._http._tcp.local".to_string())),
            rec("_http._tcp.local", RecordData::Ptr("A._http._tcp.local".to_string())),
        ]);
        let map = collate(&[b]);
        assert_eq!(map["_http._tcp.local"].instances.len(), 1);
    }

    #[test]
    fn srv_sets_port_and_appends_hostname() {
        let b = batch(vec![rec(
            "Printer._http._tcp.local",
            RecordData::Srv {
                priority: 0,
                weight: 0,
                port: 80,
                target: "host1.local".to_string(),
            },
        )]);
        let map = collate(&[b]);
        let entry = &map["Printer._http._tcp.local"];
        assert_eq!(entry.port, Some(80));
        assert_eq!(entry.hostnames, vec!["host1.local"]);
    }

    #[test]
    fn last_txt_wins() {
        let b = batch(vec![
            rec(
                "hue.local",
                RecordData::Txt(vec![("a".to_string(), "1".to_string())]),
            ),
            rec(
                "hue.local",
                RecordData::Txt(vec![("b".to_string(), "2".to_string())]),
            ),
        ]);
        let map = collate(&[b]);
        assert!(!map["hue.local"].info.contains_key("a"));
        assert_eq!(map["hue.local"].info["b"], "2");
    }

    #[test]
    fn collate_is_idempotent() {
        let batches = vec![batch(vec![rec(
            "hue.local",
            RecordData::A("10.0.0.1".parse().unwrap()),
        )])];
        assert_eq!(collate(&batches), collate(&batches));
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(collate(&[]).is_empty());
    }
}
