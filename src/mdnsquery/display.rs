//! Display methods for library types: as we can't impl the Display trait
//! outside the module where it's defined, wrap them here.
use std::collections::HashMap;
use std::fmt;

use mdnslib::CollatedEntry;

pub struct DisplayWrapper<'a, T>(pub &'a T);

impl fmt::Display for DisplayWrapper<'_, CollatedEntry> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ip) = self.0.ip {
            write!(f, "ip:{} ", ip)?;
        }
        if let Some(port) = self.0.port {
            write!(f, "port:{} ", port)?;
        }
        if !self.0.hostnames.is_empty() {
            write!(f, "hostnames:{:?} ", self.0.hostnames)?;
        }
        if !self.0.instances.is_empty() {
            write!(f, "instances:{:?} ", self.0.instances)?;
        }
        if !self.0.servicetypes.is_empty() {
            write!(f, "servicetypes:{:?} ", self.0.servicetypes)?;
        }
        if !self.0.info.is_empty() {
            write!(f, "info:{:?}", self.0.info)?;
        }
        Ok(())
    }
}

pub fn display_collated(map: &HashMap<String, CollatedEntry>) {
    if map.is_empty() {
        println!("(no responses received)");
        return;
    }
    for (name, entry) in map {
        println!("{}: {}", name, DisplayWrapper(entry));
    }
}

pub fn display_string_list(items: &[String]) {
    if items.is_empty() {
        println!("(no responses received)");
        return;
    }
    for item in items {
        println!("{}", item);
    }
}
