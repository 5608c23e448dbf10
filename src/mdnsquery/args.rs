//! Manage command line arguments here.
use clap::{App, Arg, SubCommand};

use mdnslib::error::{MdnsError, MdnsResult};

/// Which resolver operation the user asked for, with its own arguments.
#[derive(Debug)]
pub enum Command {
    Types,
    Services { service_type: String },
    Ip { name: String },
    Address { fqdn: String },
    Query { name: String, qtype: u16, listen_ms: u64 },
}

#[derive(Debug)]
pub struct CliOptions {
    pub command: Command,
    pub debug: bool,
}

impl CliOptions {
    pub fn options() -> MdnsResult<Self> {
        let matches = App::new("mDNS query tool")
            .version("0.1")
            .about("A simple mDNS / DNS-SD query client for local-network service discovery")
            .arg(
                Arg::new("debug")
                    .short('g')
                    .long("debug")
                    .required(false)
                    .long_help("Enable debug-level logging")
                    .takes_value(false),
            )
            .subcommand(SubCommand::with_name("types").about("list advertised service types"))
            .subcommand(
                SubCommand::with_name("services")
                    .about("list instances advertised under a service type")
                    .arg(
                        Arg::new("service_type")
                            .required(true)
                            .long_help("e.g. _http._tcp.local"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("ip")
                    .about("resolve the A records for a name")
                    .arg(Arg::new("name").required(true)),
            )
            .subcommand(
                SubCommand::with_name("address")
                    .about("resolve ip and port for a service instance")
                    .arg(
                        Arg::new("fqdn")
                            .required(true)
                            .long_help("e.g. Printer._http._tcp.local"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("query")
                    .about("raw query for a name and record type")
                    .arg(Arg::new("name").required(true))
                    .arg(Arg::new("qtype").required(true).long_help("numeric RR type, e.g. 12 for PTR"))
                    .arg(
                        Arg::new("listen_ms")
                            .long("listen-ms")
                            .takes_value(true)
                            .default_value("2000"),
                    ),
            )
            .get_matches();

        let debug = matches.is_present("debug");

        let command = if matches.subcommand_matches("types").is_some() {
            Command::Types
        } else if let Some(sub) = matches.subcommand_matches("services") {
            Command::Services {
                service_type: sub.value_of("service_type").unwrap().to_string(),
            }
        } else if let Some(sub) = matches.subcommand_matches("ip") {
            Command::Ip {
                name: sub.value_of("name").unwrap().to_string(),
            }
        } else if let Some(sub) = matches.subcommand_matches("address") {
            Command::Address {
                fqdn: sub.value_of("fqdn").unwrap().to_string(),
            }
        } else if let Some(sub) = matches.subcommand_matches("query") {
            let qtype: u16 = sub
                .value_of("qtype")
                .unwrap()
                .parse()
                .map_err(|_| MdnsError::MissingParameter("qtype"))?;
            let listen_ms: u64 = sub
                .value_of("listen_ms")
                .unwrap()
                .parse()
                .map_err(|_| MdnsError::MissingParameter("listen_ms"))?;
            Command::Query {
                name: sub.value_of("name").unwrap().to_string(),
                qtype,
                listen_ms,
            }
        } else {
            return Err(MdnsError::MissingParameter("subcommand"));
        };

        Ok(CliOptions { command, debug })
    }
}
