//! One-shot mDNS / DNS-SD resolver for local-network service discovery:
//! a single multicast query, a bounded observation window, full decode of
//! Answer/Authority/Additional records (with name-compression support),
//! and a collated per-name view of discovered services and addresses.
//!
//! No continuous cache, no responder/probing behaviour, no AAAA.

pub mod collate;
pub mod collector;
pub mod error;
pub mod network_order;
pub mod record;
pub mod resolver;
pub mod response;
pub mod rfc1035;
pub mod socket;

pub use collate::CollatedEntry;
pub use error::{DecodeError, MdnsError, MdnsResult};
pub use record::{RecordData, RecordType, ResourceRecord};
pub use resolver::{get_address, get_ip, get_service_types, get_services, query, spawn_query};
