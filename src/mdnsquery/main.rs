//! An mDNS / DNS-SD query tool
use std::time::Duration;

use log::debug;

use mdnslib::error::MdnsResult;

mod args;
use args::{CliOptions, Command};

mod display;
use display::{display_collated, display_string_list};

#[tokio::main]
async fn main() -> MdnsResult<()> {
    let options = CliOptions::options()?;

    let default_level = if options.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("options: {:?}", &options);

    match options.command {
        Command::Types => {
            let types = mdnslib::get_service_types().await?;
            display_string_list(&types);
        }
        Command::Services { service_type } => {
            let instances = mdnslib::get_services(&service_type).await?;
            display_string_list(&instances);
        }
        Command::Ip { name } => {
            let ips = mdnslib::get_ip(&name).await?;
            for ip in ips {
                println!("{}", ip);
            }
        }
        Command::Address { fqdn } => {
            let (ip, port) = mdnslib::get_address(&fqdn).await?;
            match (ip, port) {
                (Some(ip), Some(port)) => println!("{}:{}", ip, port),
                (Some(ip), None) => println!("{} (no port)", ip),
                (None, Some(port)) => println!("(no ip):{}", port),
                (None, None) => println!("(no response)"),
            }
        }
        Command::Query { name, qtype, listen_ms } => {
            let map = mdnslib::query(&name, qtype, Duration::from_millis(listen_ms)).await?;
            display_collated(&map);
        }
    }

    Ok(())
}
